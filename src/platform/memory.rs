//! In-memory [`Platform`] used by unit tests
//!
//! Tables are vectors of JSON rows, procedures are closures registered per
//! name, and every procedure call is recorded for assertions.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::error::{PlatformError, Result};
use super::query::{Filter, Op};
use super::{AuthUser, Platform, Session};

type RpcHandler = Box<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

#[derive(Default)]
struct Inner {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    handlers: Mutex<HashMap<String, RpcHandler>>,
    calls: Mutex<Vec<(String, Value)>>,
    users: Mutex<HashMap<String, (String, String)>>,
}

/// Clones share state; member clients from `as_user` see the same tables
#[derive(Clone, Default)]
pub(crate) struct MemoryPlatform {
    inner: Arc<Inner>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.inner
            .tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
        self
    }

    pub fn on_rpc<F>(self, name: &str, handler: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.inner
            .handlers
            .lock()
            .unwrap()
            .insert(name.to_string(), Box::new(handler));
        self
    }

    pub fn with_user(self, id: &str, email: &str, password: &str) -> Self {
        self.inner
            .users
            .lock()
            .unwrap()
            .insert(email.to_string(), (id.to_string(), password.to_string()));
        self
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.inner
            .tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self, name: &str) -> Vec<Value> {
        self.inner
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, params)| params.clone())
            .collect()
    }

}

pub(crate) fn api_error(status: u16, message: &str) -> PlatformError {
    PlatformError::Api {
        status,
        code: None,
        message: message.to_string(),
    }
}

fn cell_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    let cell = cell_text(row, &filter.column);
    match filter.op {
        Op::Is => match filter.value.as_str() {
            "null" => cell.is_none(),
            other => cell.as_deref() == Some(other),
        },
        Op::Eq => cell.as_deref() == Some(filter.value.as_str()),
        Op::Neq => cell.as_deref() != Some(filter.value.as_str()),
        op => {
            let Some(cell) = cell else { return false };
            let ordering = match (cell.parse::<f64>(), filter.value.parse::<f64>()) {
                (Ok(a), Ok(b)) => a.partial_cmp(&b),
                _ => Some(cell.as_str().cmp(filter.value.as_str())),
            };
            let Some(ordering) = ordering else { return false };
            match op {
                Op::Lt => ordering.is_lt(),
                Op::Lte => ordering.is_le(),
                Op::Gt => ordering.is_gt(),
                Op::Gte => ordering.is_ge(),
                _ => false,
            }
        }
    }
}

fn as_rows(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        other => vec![other],
    }
}

#[async_trait]
impl Platform for MemoryPlatform {
    async fn rpc(&self, name: &str, params: Value) -> Result<Value> {
        self.inner
            .calls
            .lock()
            .unwrap()
            .push((name.to_string(), params.clone()));
        let handlers = self.inner.handlers.lock().unwrap();
        match handlers.get(name) {
            Some(handler) => handler(&params),
            None => Ok(Value::Null),
        }
    }

    async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>> {
        Ok(self
            .rows(table)
            .into_iter()
            .filter(|row| filters.iter().all(|f| matches(row, f)))
            .collect())
    }

    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64> {
        Ok(self.select(table, filters).await?.len() as u64)
    }

    async fn insert(&self, table: &str, rows: Value) -> Result<Vec<Value>> {
        let rows = as_rows(rows);
        self.inner
            .tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn upsert(&self, table: &str, rows: Value, on_conflict: &str) -> Result<Vec<Value>> {
        let mut tables = self.inner.tables.lock().unwrap();
        let existing = tables.entry(table.to_string()).or_default();
        let mut written = Vec::new();

        for row in as_rows(rows) {
            let key = row.get(on_conflict).cloned();
            let position = key
                .as_ref()
                .and_then(|k| existing.iter().position(|r| r.get(on_conflict) == Some(k)));
            match (position, row) {
                (Some(i), Value::Object(patch)) => {
                    if let Value::Object(current) = &mut existing[i] {
                        current.extend(patch);
                    }
                    written.push(existing[i].clone());
                }
                (_, row) => {
                    existing.push(row.clone());
                    written.push(row);
                }
            }
        }
        Ok(written)
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<Vec<Value>> {
        let mut tables = self.inner.tables.lock().unwrap();
        let mut written = Vec::new();
        if let (Some(rows), Value::Object(patch)) = (tables.get_mut(table), patch) {
            for row in rows.iter_mut().filter(|r| filters.iter().all(|f| matches(r, f))) {
                if let Value::Object(current) = row {
                    current.extend(patch.clone());
                }
                written.push(row.clone());
            }
        }
        Ok(written)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>> {
        let mut tables = self.inner.tables.lock().unwrap();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };
        let (removed, kept): (Vec<_>, Vec<_>) = rows
            .drain(..)
            .partition(|r| filters.iter().all(|f| matches(r, f)));
        *rows = kept;
        Ok(removed)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let users = self.inner.users.lock().unwrap();
        match users.get(email) {
            Some((id, expected)) if expected == password => Ok(Session {
                access_token: format!("token-{}", id),
                refresh_token: None,
                expires_in: Some(3600),
                user: AuthUser {
                    id: id.clone(),
                    email: Some(email.to_string()),
                },
            }),
            _ => Err(api_error(400, "Invalid login credentials")),
        }
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser> {
        let mut users = self.inner.users.lock().unwrap();
        if users.contains_key(email) {
            return Err(api_error(422, "User already registered"));
        }
        let id = uuid::Uuid::new_v4().to_string();
        users.insert(email.to_string(), (id.clone(), password.to_string()));
        Ok(AuthUser {
            id,
            email: Some(email.to_string()),
        })
    }

    fn as_user(&self, _access_token: &str) -> Arc<dyn Platform> {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_filters_and_upsert() {
        let platform = MemoryPlatform::new().with_rows(
            "notifications",
            vec![
                json!({"id": 1, "user_id": "a", "is_read": true, "created_at": "2024-01-01T00:00:00Z"}),
                json!({"id": 2, "user_id": "a", "is_read": false, "created_at": "2024-03-01T00:00:00Z"}),
                json!({"id": 3, "user_id": "b", "is_read": true, "created_at": "2024-03-01T00:00:00Z"}),
            ],
        );

        let old = platform
            .select(
                "notifications",
                &[Filter::eq("is_read", true), Filter::lt("created_at", "2024-02-01")],
            )
            .await
            .unwrap();
        assert_eq!(old.len(), 1);

        platform
            .upsert("notifications", json!({"id": 2, "is_read": true}), "id")
            .await
            .unwrap();
        assert_eq!(platform.count("notifications", &[Filter::eq("is_read", true)]).await.unwrap(), 3);

        let removed = platform
            .delete("notifications", &[Filter::eq("user_id", "a")])
            .await
            .unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(platform.rows("notifications").len(), 1);
    }

    #[tokio::test]
    async fn test_users_and_sessions() {
        let platform = MemoryPlatform::new();
        let user = platform.create_user("a@sim.test", "pw").await.unwrap();
        assert!(platform.create_user("a@sim.test", "pw").await.is_err());

        let session = platform.sign_in("a@sim.test", "pw").await.unwrap();
        assert_eq!(session.user.id, user.id);
        assert!(platform.sign_in("a@sim.test", "nope").await.is_err());
    }
}

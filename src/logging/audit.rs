//! Invocation audit log
//!
//! One JSONL line per function invocation: who called what, how it ended and
//! how long it took.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::Role;

/// How an invocation ended
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    /// Rejected before any platform call (auth, disabled, bad request)
    Rejected,
    /// Handler or platform failure
    Failed,
}

impl Outcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Outcome::Success,
            400..=499 => Outcome::Rejected,
            _ => Outcome::Failed,
        }
    }
}

/// Audit record for one invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub function: String,
    pub action: Option<String>,
    pub user_id: Option<String>,
    pub role: Option<Role>,
    pub outcome: Outcome,
    pub status: u16,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvocationEvent {
    pub fn new(function: impl Into<String>, status: u16) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            function: function.into(),
            action: None,
            user_id: None,
            role: None,
            outcome: Outcome::from_status(status),
            status,
            duration_ms: 0,
            error: None,
        }
    }

    pub fn with_action(mut self, action: Option<&str>) -> Self {
        self.action = action.map(str::to_string);
        self
    }

    pub fn with_caller(mut self, user_id: Option<&str>, role: Role) -> Self {
        self.user_id = user_id.map(str::to_string);
        self.role = Some(role);
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Appends invocation events to a JSONL file; a no-op until a file is set
#[derive(Clone, Default)]
pub struct InvocationLogger {
    inner: Arc<Mutex<Option<BufWriter<File>>>>,
}

impl InvocationLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn init_file(&self, path: PathBuf) -> std::io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        *self.inner.lock().await = Some(BufWriter::new(file));
        info!("Invocation audit log initialized to {}", path.display());
        Ok(())
    }

    pub async fn log(&self, event: InvocationEvent) {
        let line = match event.to_jsonl() {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize invocation event: {}", e);
                return;
            }
        };

        let mut inner = self.inner.lock().await;
        if let Some(writer) = inner.as_mut() {
            if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
                error!("Failed to write invocation event: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_status() {
        assert_eq!(Outcome::from_status(200), Outcome::Success);
        assert_eq!(Outcome::from_status(403), Outcome::Rejected);
        assert_eq!(Outcome::from_status(500), Outcome::Failed);
    }

    #[test]
    fn test_event_serialization() {
        let event = InvocationEvent::new("challenges", 200)
            .with_action(Some("claim_daily"))
            .with_caller(Some("user-123"), Role::Moderator)
            .with_duration(12);

        let line = event.to_jsonl().unwrap();
        assert!(line.contains("\"function\":\"challenges\""));
        assert!(line.contains("claim_daily"));
        assert!(line.contains("\"role\":\"moderator\""));
        assert!(line.contains("\"outcome\":\"success\""));
        assert!(!line.contains("\"error\""));
    }

    #[tokio::test]
    async fn test_writes_jsonl_lines() {
        let path = std::env::temp_dir().join(format!("avolve-audit-{}.jsonl", Uuid::new_v4()));
        let logger = InvocationLogger::new();

        // nothing configured yet
        logger.log(InvocationEvent::new("stats", 200)).await;

        logger.init_file(path.clone()).await.unwrap();
        logger.log(InvocationEvent::new("data-export", 200)).await;
        logger
            .log(InvocationEvent::new("data-export", 500).with_error("boom"))
            .await;

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<InvocationEvent> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].outcome, Outcome::Failed);
        assert_eq!(lines[1].error.as_deref(), Some("boom"));
        assert_ne!(lines[0].id, lines[1].id);

        let _ = std::fs::remove_file(path);
    }
}

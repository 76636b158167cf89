//! Hosted platform access
//!
//! Everything durable (tables, auth, transactional procedures) lives on the
//! hosted backend. [`Platform`] is the seam the handlers and the simulation
//! harness talk through; [`PlatformClient`] implements it over HTTP.

pub mod client;
pub mod error;
#[cfg(test)]
pub(crate) mod memory;
pub mod query;
pub mod rpc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub use client::{PlatformClient, PlatformConfig};
pub use error::{PlatformError, Result};
pub use query::{Filter, Op};
pub use rpc::Procedure;

/// Auth user as returned by the platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Signed-in session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

/// Operations offered by the hosted backend
#[async_trait]
pub trait Platform: Send + Sync {
    /// Invoke a remote procedure by name
    async fn rpc(&self, name: &str, params: Value) -> Result<Value>;

    async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>>;

    /// Exact row count matching `filters`
    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64>;

    async fn insert(&self, table: &str, rows: Value) -> Result<Vec<Value>>;

    /// Insert, merging on the `on_conflict` column
    async fn upsert(&self, table: &str, rows: Value, on_conflict: &str) -> Result<Vec<Value>>;

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<Vec<Value>>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>>;

    /// Password sign-in
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Create a confirmed user (requires the service-role key)
    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Same backend, acting as the holder of `access_token`
    fn as_user(&self, access_token: &str) -> Arc<dyn Platform>;
}

/// First row of a result set, deserialized
pub fn first_row<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>> {
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

/// Every row of a result set, deserialized
pub fn rows_as<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(PlatformError::from))
        .collect()
}

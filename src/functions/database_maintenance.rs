//! `database-maintenance` function: scheduled housekeeping
//!
//! Called by a scheduler with the shared function secret, never by members.

use chrono::Duration;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

use super::FunctionContext;
use crate::db::schemas::{
    CHALLENGES_TABLE, EVENTS_TABLE, INVITATIONS_TABLE, MESSAGES_TABLE, NOTIFICATIONS_TABLE,
    PEER_RECOGNITION_TABLE, POSTS_TABLE, PROFILES_TABLE, TOKEN_BALANCES_TABLE,
};
use crate::platform::{rpc, Filter};
use crate::types::{AvolveError, Result};

/// Read notifications older than this are removed by default
pub const DEFAULT_NOTIFICATION_RETENTION_DAYS: u32 = 30;

/// Tables reported by `stats`
pub const STATS_TABLES: [&str; 9] = [
    PROFILES_TABLE,
    TOKEN_BALANCES_TABLE,
    CHALLENGES_TABLE,
    INVITATIONS_TABLE,
    NOTIFICATIONS_TABLE,
    PEER_RECOGNITION_TABLE,
    POSTS_TABLE,
    EVENTS_TABLE,
    MESSAGES_TABLE,
];

fn default_retention() -> u32 {
    DEFAULT_NOTIFICATION_RETENTION_DAYS
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MaintenanceAction {
    /// Delete read notifications older than the retention window
    CleanupNotifications {
        #[serde(default = "default_retention")]
        older_than_days: u32,
    },
    /// Mark pending invitations past their expiry as expired
    ExpireInvitations,
    RecalculateBalances,
    Stats,
}

pub async fn handle(ctx: &FunctionContext, action: MaintenanceAction) -> Result<Value> {
    let platform = ctx.platform.as_ref();
    match action {
        MaintenanceAction::CleanupNotifications { older_than_days } => {
            if older_than_days == 0 {
                return Err(AvolveError::BadRequest(
                    "older_than_days must be at least 1".into(),
                ));
            }
            let cutoff = ctx.now - Duration::days(i64::from(older_than_days));
            let deleted = platform
                .delete(
                    NOTIFICATIONS_TABLE,
                    &[
                        Filter::eq("is_read", true),
                        Filter::lt("created_at", cutoff.to_rfc3339()),
                    ],
                )
                .await?;
            info!(deleted = deleted.len(), older_than_days, "notifications cleaned up");
            Ok(json!({ "deleted": deleted.len(), "cutoff": cutoff.to_rfc3339() }))
        }
        MaintenanceAction::ExpireInvitations => {
            let expired = platform
                .update(
                    INVITATIONS_TABLE,
                    &[
                        Filter::eq("status", "pending"),
                        Filter::lt("expires_at", ctx.now.to_rfc3339()),
                    ],
                    json!({ "status": "expired" }),
                )
                .await?;
            info!(expired = expired.len(), "invitations expired");
            Ok(json!({ "expired": expired.len() }))
        }
        MaintenanceAction::RecalculateBalances => {
            let result = rpc::recalculate_token_balances(platform).await?;
            info!("token balances recalculated");
            Ok(json!({ "success": true, "result": result }))
        }
        MaintenanceAction::Stats => {
            let mut tables = Map::new();
            for table in STATS_TABLES {
                let rows = platform.count(table, &[]).await?;
                tables.insert(table.to_string(), json!(rows));
            }
            Ok(json!({ "generated_at": ctx.now.to_rfc3339(), "tables": tables }))
        }
    }
}

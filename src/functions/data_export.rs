//! `data-export` function: a member's data as one checksummed document

use serde::Deserialize;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::info;

use super::FunctionContext;
use crate::db::schemas::{
    NOTIFICATIONS_TABLE, PEER_RECOGNITION_TABLE, PROFILES_TABLE, TOKEN_BALANCES_TABLE,
};
use crate::pillars::Pillar;
use crate::platform::{Filter, Platform};
use crate::types::{AvolveError, Result};

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DataExportAction {
    ExportUserData {
        #[serde(default)]
        user_id: Option<String>,
    },
    ExportTokens {
        #[serde(default)]
        user_id: Option<String>,
    },
}

/// Hex SHA-256 of the document's JSON serialization
pub fn checksum(document: &Value) -> Result<String> {
    let bytes = serde_json::to_vec(document)
        .map_err(|e| AvolveError::Internal(format!("Failed to serialize export: {}", e)))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

async fn balances(platform: &dyn Platform, user_id: &str) -> Result<Vec<Value>> {
    Ok(platform
        .select(TOKEN_BALANCES_TABLE, &[Filter::eq("user_id", user_id)])
        .await?)
}

async fn user_document(ctx: &FunctionContext, user_id: &str) -> Result<Value> {
    let platform = ctx.platform.as_ref();

    let profile = platform
        .select(PROFILES_TABLE, &[Filter::eq("id", user_id)])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AvolveError::NotFound(format!("Profile {} not found", user_id)))?;

    let mut pillars = Map::new();
    for pillar in Pillar::ALL {
        let rows = platform
            .select(pillar.progress_table(), &[Filter::eq("user_id", user_id)])
            .await?;
        pillars.insert(
            pillar.as_str().to_string(),
            rows.into_iter().next().unwrap_or(Value::Null),
        );
    }

    let sent = platform
        .select(PEER_RECOGNITION_TABLE, &[Filter::eq("sender_id", user_id)])
        .await?;
    let received = platform
        .select(PEER_RECOGNITION_TABLE, &[Filter::eq("recipient_id", user_id)])
        .await?;
    let notifications = platform
        .select(NOTIFICATIONS_TABLE, &[Filter::eq("user_id", user_id)])
        .await?;

    Ok(json!({
        "user_id": user_id,
        "exported_at": ctx.now.to_rfc3339(),
        "profile": profile,
        "token_balances": balances(platform, user_id).await?,
        "pillars": pillars,
        "recognition": { "sent": sent, "received": received },
        "notifications": notifications,
    }))
}

pub async fn handle(ctx: &FunctionContext, action: DataExportAction) -> Result<Value> {
    match action {
        DataExportAction::ExportUserData { user_id } => {
            let target = ctx.target_user(user_id.as_deref())?;
            let document = user_document(ctx, target).await?;
            let checksum = checksum(&document)?;
            info!(user_id = target, requested_by = ?ctx.caller.user_id, "user data exported");
            Ok(json!({ "data": document, "checksum": checksum }))
        }
        DataExportAction::ExportTokens { user_id } => {
            let target = ctx.target_user(user_id.as_deref())?;
            let balances = balances(ctx.platform.as_ref(), target).await?;
            Ok(json!({
                "user_id": target,
                "exported_at": ctx.now.to_rfc3339(),
                "token_balances": balances,
            }))
        }
    }
}

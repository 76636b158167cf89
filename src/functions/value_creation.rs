//! `value-creation` function: recognition, pillar progress and feature unlocks

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{row_value, FunctionContext};
use crate::db::schemas::{
    Notification, PeerRecognition, Profile, NOTIFICATIONS_TABLE, PEER_RECOGNITION_TABLE,
    PROFILES_TABLE,
};
use crate::pillars::{Pillar, PillarProgress};
use crate::platform::{first_row, rpc, Filter};
use crate::types::{AvolveError, Result};

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ValueCreationAction {
    SendRecognition {
        recipient_id: String,
        message: String,
        #[serde(default)]
        tokens: f64,
    },
    SavePillarProgress {
        pillar: Pillar,
        #[serde(default)]
        current_state: String,
        #[serde(default)]
        desired_state: String,
        #[serde(default)]
        action_plan: Option<String>,
    },
    UnlockFeature {
        feature: String,
    },
}

fn display_name(profile: Option<Profile>) -> String {
    let named = |name: &String| !name.trim().is_empty();
    profile
        .and_then(|p| p.full_name.filter(named).or(p.username.filter(named)))
        .unwrap_or_else(|| "A member".to_string())
}

pub async fn handle(ctx: &FunctionContext, action: ValueCreationAction) -> Result<Value> {
    let platform = ctx.platform.as_ref();
    let user_id = ctx.user_id()?;

    match action {
        ValueCreationAction::SendRecognition {
            recipient_id,
            message,
            tokens,
        } => {
            if recipient_id == user_id {
                return Err(AvolveError::BadRequest("Cannot recognize yourself".into()));
            }
            if message.trim().is_empty() {
                return Err(AvolveError::BadRequest("message is required".into()));
            }
            if !tokens.is_finite() || tokens < 0.0 {
                return Err(AvolveError::BadRequest("tokens must not be negative".into()));
            }

            let recognition = PeerRecognition {
                sender_id: user_id.to_string(),
                recipient_id: recipient_id.clone(),
                message: message.clone(),
                token_amount: tokens,
                created_at: None,
            };
            let inserted = platform
                .insert(PEER_RECOGNITION_TABLE, row_value(&recognition)?)
                .await?;

            let sender: Option<Profile> = first_row(
                platform
                    .select(PROFILES_TABLE, &[Filter::eq("id", user_id)])
                    .await?,
            )?;
            let notification = Notification::recognition(&recipient_id, &display_name(sender), &message);
            platform
                .insert(NOTIFICATIONS_TABLE, row_value(&notification)?)
                .await?;

            info!(sender = user_id, recipient = %recipient_id, tokens, "recognition sent");
            Ok(json!({
                "success": true,
                "recognition": inserted.into_iter().next().unwrap_or(Value::Null),
            }))
        }
        ValueCreationAction::SavePillarProgress {
            pillar,
            current_state,
            desired_state,
            action_plan,
        } => {
            let mut progress = PillarProgress::new(user_id, current_state, desired_state);
            if let Some(plan) = action_plan {
                progress = progress.with_action_plan(plan);
            }
            progress.validate()?;

            let row = row_value(&progress.touched(ctx.now))?;
            let saved = platform
                .upsert(pillar.progress_table(), row, "user_id")
                .await?;
            info!(user_id, %pillar, "pillar progress saved");
            Ok(json!({
                "success": true,
                "pillar": pillar,
                "progress": saved.into_iter().next().unwrap_or(Value::Null),
            }))
        }
        ValueCreationAction::UnlockFeature { feature } => {
            if !rpc::can_unlock_feature(platform, user_id, &feature).await? {
                return Ok(json!({
                    "success": false,
                    "feature": feature,
                    "reason": "Requirements for this feature are not met yet",
                }));
            }
            let result = rpc::unlock_feature(platform, user_id, &feature).await?;
            info!(user_id, feature = %feature, "feature unlocked");
            Ok(json!({ "success": true, "feature": feature, "result": result }))
        }
    }
}

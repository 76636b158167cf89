//! Typed wrappers for the platform's remote procedures
//!
//! Parameter names follow the procedures' `p_` convention. Contracts are
//! owned by the platform; these helpers only shape arguments and results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use super::error::{PlatformError, Result};
use super::Platform;
use crate::tokens::TokenSymbol;

/// Remote procedures invoked by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Procedure {
    StakeTokens,
    CreateInvitation,
    RedeemInvitation,
    ProcessDailyClaim,
    CompleteChallenge,
    CanUnlockFeature,
    UnlockFeature,
    GetMemberJourneyStatus,
    RecalculateTokenBalances,
}

impl Procedure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Procedure::StakeTokens => "stake_tokens",
            Procedure::CreateInvitation => "create_invitation",
            Procedure::RedeemInvitation => "redeem_invitation",
            Procedure::ProcessDailyClaim => "process_daily_claim",
            Procedure::CompleteChallenge => "complete_challenge",
            Procedure::CanUnlockFeature => "can_unlock_feature",
            Procedure::UnlockFeature => "unlock_feature",
            Procedure::GetMemberJourneyStatus => "get_member_journey_status",
            Procedure::RecalculateTokenBalances => "recalculate_token_balances",
        }
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

async fn call(platform: &dyn Platform, procedure: Procedure, params: Value) -> Result<Value> {
    platform.rpc(procedure.as_str(), params).await
}

pub async fn stake_tokens(
    platform: &dyn Platform,
    user_id: &str,
    rule_id: &str,
    amount: f64,
) -> Result<Value> {
    call(
        platform,
        Procedure::StakeTokens,
        json!({ "p_user_id": user_id, "p_rule_id": rule_id, "p_amount": amount }),
    )
    .await
}

/// Returns the new invitation code
pub async fn create_invitation(platform: &dyn Platform, user_id: &str) -> Result<String> {
    let result = call(
        platform,
        Procedure::CreateInvitation,
        json!({ "p_user_id": user_id }),
    )
    .await?;
    invitation_code(&result).ok_or_else(|| {
        PlatformError::InvalidResponse(format!("create_invitation returned no code: {}", result))
    })
}

/// The procedure answers either a bare code or an object with a `code` field
fn invitation_code(result: &Value) -> Option<String> {
    match result {
        Value::String(code) => Some(code.clone()),
        Value::Object(map) => map.get("code").and_then(Value::as_str).map(str::to_string),
        Value::Array(rows) => rows.first().and_then(invitation_code),
        _ => None,
    }
}

pub async fn redeem_invitation(platform: &dyn Platform, code: &str, user_id: &str) -> Result<Value> {
    call(
        platform,
        Procedure::RedeemInvitation,
        json!({ "p_code": code, "p_user_id": user_id }),
    )
    .await
}

pub async fn process_daily_claim(
    platform: &dyn Platform,
    user_id: &str,
    token: TokenSymbol,
    claim_date: NaiveDate,
) -> Result<Value> {
    call(
        platform,
        Procedure::ProcessDailyClaim,
        json!({
            "p_user_id": user_id,
            "p_token_type": token.code(),
            "p_claim_date": claim_date.to_string(),
        }),
    )
    .await
}

pub async fn complete_challenge(
    platform: &dyn Platform,
    user_id: &str,
    challenge_id: &str,
    completion_data: Value,
) -> Result<Value> {
    call(
        platform,
        Procedure::CompleteChallenge,
        json!({
            "p_user_id": user_id,
            "p_challenge_id": challenge_id,
            "p_completion_data": completion_data,
        }),
    )
    .await
}

pub async fn can_unlock_feature(platform: &dyn Platform, user_id: &str, feature: &str) -> Result<bool> {
    let result = call(
        platform,
        Procedure::CanUnlockFeature,
        json!({ "p_user_id": user_id, "p_feature": feature }),
    )
    .await?;
    Ok(match result {
        Value::Bool(allowed) => allowed,
        Value::Object(map) => map.get("can_unlock").and_then(Value::as_bool).unwrap_or(false),
        _ => false,
    })
}

pub async fn unlock_feature(platform: &dyn Platform, user_id: &str, feature: &str) -> Result<Value> {
    call(
        platform,
        Procedure::UnlockFeature,
        json!({ "p_user_id": user_id, "p_feature": feature }),
    )
    .await
}

pub async fn get_member_journey_status(platform: &dyn Platform, user_id: &str) -> Result<Value> {
    call(
        platform,
        Procedure::GetMemberJourneyStatus,
        json!({ "p_user_id": user_id }),
    )
    .await
}

pub async fn recalculate_token_balances(platform: &dyn Platform) -> Result<Value> {
    call(platform, Procedure::RecalculateTokenBalances, json!({})).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invitation_code_shapes() {
        assert_eq!(invitation_code(&json!("ABC123")), Some("ABC123".into()));
        assert_eq!(invitation_code(&json!({"code": "XYZ"})), Some("XYZ".into()));
        assert_eq!(invitation_code(&json!([{"code": "Q1"}])), Some("Q1".into()));
        assert_eq!(invitation_code(&json!(42)), None);
    }

    #[test]
    fn test_procedure_names() {
        assert_eq!(Procedure::ProcessDailyClaim.to_string(), "process_daily_claim");
        assert_eq!(
            serde_json::to_string(&Procedure::GetMemberJourneyStatus).unwrap(),
            "\"get_member_journey_status\""
        );
    }
}

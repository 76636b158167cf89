//! `challenges` function: daily challenges and the daily token claim

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::FunctionContext;
use crate::db::schemas::{Challenge, CHALLENGES_TABLE};
use crate::platform::{rows_as, rpc, Filter};
use crate::tokens::token_for_date;
use crate::types::Result;

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ChallengesAction {
    /// Active challenges for today's token
    List,
    Complete {
        challenge_id: String,
        #[serde(default)]
        completion_data: Value,
    },
    ClaimDaily,
    Journey,
}

pub async fn handle(ctx: &FunctionContext, action: ChallengesAction) -> Result<Value> {
    let platform = ctx.platform.as_ref();
    match action {
        ChallengesAction::List => {
            let token = token_for_date(ctx.today());
            let challenges: Vec<Challenge> = rows_as(
                platform
                    .select(
                        CHALLENGES_TABLE,
                        &[
                            Filter::eq("is_active", true),
                            Filter::eq("token_type", token.code()),
                        ],
                    )
                    .await?,
            )?;
            Ok(json!({
                "date": ctx.today().to_string(),
                "token": token,
                "token_name": token.name(),
                "challenges": challenges,
            }))
        }
        ChallengesAction::Complete {
            challenge_id,
            completion_data,
        } => {
            let user_id = ctx.user_id()?;
            let result =
                rpc::complete_challenge(platform, user_id, &challenge_id, completion_data).await?;
            info!(user_id, challenge_id = %challenge_id, "challenge completed");
            Ok(json!({ "success": true, "result": result }))
        }
        ChallengesAction::ClaimDaily => {
            let user_id = ctx.user_id()?;
            let today = ctx.today();
            let token = token_for_date(today);
            let result = rpc::process_daily_claim(platform, user_id, token, today).await?;
            info!(user_id, %token, "daily claim processed");
            Ok(json!({ "success": true, "token": token, "result": result }))
        }
        ChallengesAction::Journey => {
            let status = rpc::get_member_journey_status(platform, ctx.user_id()?).await?;
            Ok(json!({ "journey": status }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::functions::test_support::context;
    use crate::functions::{invoke, Caller, FunctionName};
    use crate::platform::memory::{api_error, MemoryPlatform};

    fn platform() -> MemoryPlatform {
        MemoryPlatform::new().with_rows(
            CHALLENGES_TABLE,
            vec![
                json!({"id": "c1", "title": "Mirror work", "token_type": "SHE", "is_active": true}),
                json!({"id": "c2", "title": "Retired", "token_type": "SHE", "is_active": false}),
                json!({"id": "c3", "title": "Sunday run", "token_type": "SPD", "is_active": true}),
            ],
        )
    }

    #[tokio::test]
    async fn test_list_uses_todays_token() {
        let platform = platform();
        let ctx = context(&platform, Caller::member("u1", Role::User));

        // fixed clock is a Monday
        let out = invoke(FunctionName::Challenges, &ctx, json!({"action": "list"}))
            .await
            .unwrap();
        assert_eq!(out["token"], "SHE");
        let challenges = out["challenges"].as_array().unwrap();
        assert_eq!(challenges.len(), 1);
        assert_eq!(challenges[0]["id"], "c1");
    }

    #[tokio::test]
    async fn test_claim_daily_sends_token_and_date() {
        let platform = platform();
        let ctx = context(&platform, Caller::member("u1", Role::User));

        invoke(FunctionName::Challenges, &ctx, json!({"action": "claim_daily"}))
            .await
            .unwrap();
        let calls = platform.calls("process_daily_claim");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["p_user_id"], "u1");
        assert_eq!(calls[0]["p_token_type"], "SHE");
        assert_eq!(calls[0]["p_claim_date"], "2024-06-03");
    }

    #[tokio::test]
    async fn test_complete_passes_platform_error_through() {
        let platform = platform().on_rpc("complete_challenge", |_| {
            Err(api_error(400, "Challenge already completed today"))
        });
        let ctx = context(&platform, Caller::member("u1", Role::User));

        let err = invoke(
            FunctionName::Challenges,
            &ctx,
            json!({"action": "complete", "challenge_id": "c1"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.public_message(), "Challenge already completed today");
        assert_eq!(platform.calls("complete_challenge")[0]["p_completion_data"], Value::Null);
    }

    #[tokio::test]
    async fn test_journey() {
        let platform = platform().on_rpc("get_member_journey_status", |params| {
            Ok(json!({"user": params["p_user_id"], "stage": "explorer"}))
        });
        let ctx = context(&platform, Caller::member("u9", Role::User));

        let out = invoke(FunctionName::Challenges, &ctx, json!({"action": "journey"}))
            .await
            .unwrap();
        assert_eq!(out["journey"]["user"], "u9");
    }
}

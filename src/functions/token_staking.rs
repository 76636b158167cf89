//! `token-staking` function: staking quotes and stake submission
//!
//! APY figures returned here are display values. The platform's
//! `stake_tokens` procedure decides the reward actually applied.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::FunctionContext;
use crate::db::schemas::{
    Profile, TokenBalance, PROFILES_TABLE, TOKEN_BALANCES_TABLE, TOKEN_STAKING_RULES_TABLE,
};
use crate::platform::{first_row, rows_as, rpc, Filter, Platform};
use crate::staking::{effective_apy, projected_reward, StakeRequest, StakingProfile, StakingQuote, StakingRule};
use crate::tokens::TokenSymbol;
use crate::types::{AvolveError, Result};

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TokenStakingAction {
    Preview {
        #[serde(default)]
        token_type: Option<TokenSymbol>,
    },
    Stake {
        rule_id: String,
        amount: f64,
    },
}

async fn staking_profile(platform: &dyn Platform, user_id: &str) -> Result<Option<StakingProfile>> {
    let profile: Option<Profile> = first_row(
        platform
            .select(PROFILES_TABLE, &[Filter::eq("id", user_id)])
            .await?,
    )?;
    Ok(profile.map(|p| p.staking_profile()))
}

pub async fn handle(ctx: &FunctionContext, action: TokenStakingAction) -> Result<Value> {
    let platform = ctx.platform.as_ref();
    let user_id = ctx.user_id()?;

    match action {
        TokenStakingAction::Preview { token_type } => {
            let filters: Vec<Filter> = token_type
                .map(|t| Filter::eq("token_type", t.code()))
                .into_iter()
                .collect();
            let rules: Vec<StakingRule> =
                rows_as(platform.select(TOKEN_STAKING_RULES_TABLE, &filters).await?)?;
            let profile = staking_profile(platform, user_id).await?;

            let quotes: Vec<StakingQuote> = rules
                .into_iter()
                .map(|rule| StakingQuote::new(rule, profile.as_ref()))
                .collect();
            Ok(json!({ "has_profile": profile.is_some(), "quotes": quotes }))
        }
        TokenStakingAction::Stake { rule_id, amount } => {
            let rule: StakingRule = first_row(
                platform
                    .select(TOKEN_STAKING_RULES_TABLE, &[Filter::eq("id", &rule_id)])
                    .await?,
            )?
            .ok_or_else(|| AvolveError::NotFound(format!("Staking rule {} not found", rule_id)))?;

            let balance: Option<TokenBalance> = first_row(
                platform
                    .select(
                        TOKEN_BALANCES_TABLE,
                        &[
                            Filter::eq("user_id", user_id),
                            Filter::eq("token_type", rule.token_type.code()),
                        ],
                    )
                    .await?,
            )?;

            let request = StakeRequest { rule_id, amount };
            request.validate(&rule, balance.as_ref())?;

            let profile = staking_profile(platform, user_id).await?;
            let apy = effective_apy(&rule, profile.as_ref());
            let result = rpc::stake_tokens(platform, user_id, &request.rule_id, request.amount).await?;

            info!(user_id, rule_id = %request.rule_id, amount, token = %rule.token_type, "tokens staked");
            Ok(json!({
                "success": true,
                "rule_id": request.rule_id,
                "amount": request.amount,
                "effective_apy": apy,
                "projected_reward": projected_reward(request.amount, apy, rule.lock_period_days),
                "result": result,
            }))
        }
    }
}

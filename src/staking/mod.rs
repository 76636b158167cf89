//! Token staking rules and the effective APY shown before a stake
//!
//! The numbers computed here are display-only. The reward actually applied is
//! computed by the platform's `stake_tokens` procedure when a stake commits.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::db::schemas::TokenBalance;
use crate::tokens::TokenSymbol;
use crate::types::AvolveError;

/// APY bonus per gradient point (0.1%)
pub const ZINC_BONUS_PER_POINT: f64 = 0.001;

/// Staking option offered for one token type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakingRule {
    pub id: String,
    pub token_type: TokenSymbol,
    #[serde(default)]
    pub min_stake: f64,
    #[serde(default)]
    pub lock_period_days: u32,
    /// Base yield, in percent
    pub base_apy: f64,
    #[serde(default = "default_multiplier")]
    pub voting_weight_multiplier: f64,
    /// Multipliers keyed by `<focus>_boost`
    #[serde(default)]
    pub bonus_features: HashMap<String, f64>,
}

fn default_multiplier() -> f64 {
    1.0
}

impl StakingRule {
    /// Boost granted to a member with the given focus, 1.0 if none applies
    pub fn focus_boost(&self, focus: &str) -> f64 {
        if focus.is_empty() {
            return 1.0;
        }
        self.bonus_features
            .get(&format!("{}_boost", focus))
            .copied()
            .unwrap_or(1.0)
    }
}

/// Member attributes that affect the displayed APY
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StakingProfile {
    pub focus: String,
    pub zinc_gradient: i64,
}

/// `base_apy * boost * (1 + zinc_gradient * 0.001)`
///
/// Without a profile the base rate is returned unchanged. Negative gradients
/// count as zero.
pub fn effective_apy(rule: &StakingRule, profile: Option<&StakingProfile>) -> f64 {
    let Some(profile) = profile else {
        return rule.base_apy;
    };

    let boost = rule.focus_boost(&profile.focus);
    let zinc_bonus = profile.zinc_gradient.max(0) as f64 * ZINC_BONUS_PER_POINT;
    rule.base_apy * boost * (1.0 + zinc_bonus)
}

/// Two-decimal display form, e.g. "12.60%"
pub fn format_apy(apy: f64) -> String {
    format!("{:.2}%", apy)
}

/// Reward accrued over the rule's lock period at `apy` percent
pub fn projected_reward(amount: f64, apy: f64, lock_period_days: u32) -> f64 {
    amount * (apy / 100.0) * (lock_period_days as f64 / 365.0)
}

/// Rule chosen in the staking form; choosing it again clears the choice
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSelection {
    selected: Option<String>,
}

impl RuleSelection {
    pub fn toggle(&mut self, rule_id: &str) {
        if self.selected.as_deref() == Some(rule_id) {
            self.selected = None;
        } else {
            self.selected = Some(rule_id.to_string());
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}

/// A member's request to lock tokens under a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeRequest {
    pub rule_id: String,
    pub amount: f64,
}

impl StakeRequest {
    /// Checks applied before the stake is sent to the platform
    pub fn validate(&self, rule: &StakingRule, balance: Option<&TokenBalance>) -> Result<(), AvolveError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(AvolveError::BadRequest("Stake amount must be positive".into()));
        }
        if self.amount < rule.min_stake {
            return Err(AvolveError::BadRequest(format!(
                "Minimum stake for {} is {}",
                rule.token_type, rule.min_stake
            )));
        }
        let available = balance.map(TokenBalance::available).unwrap_or(0.0);
        if self.amount > available {
            return Err(AvolveError::BadRequest(format!(
                "Insufficient {} balance: {} available",
                rule.token_type, available
            )));
        }
        Ok(())
    }
}

/// Rule plus the numbers the staking form displays for it
#[derive(Debug, Clone, Serialize)]
pub struct StakingQuote {
    pub rule: StakingRule,
    pub effective_apy: f64,
    pub display_apy: String,
}

impl StakingQuote {
    pub fn new(rule: StakingRule, profile: Option<&StakingProfile>) -> Self {
        let apy = effective_apy(&rule, profile);
        Self {
            rule,
            effective_apy: apy,
            display_apy: format_apy(apy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(base_apy: f64, boosts: &[(&str, f64)]) -> StakingRule {
        StakingRule {
            id: "rule-1".into(),
            token_type: TokenSymbol::Gen,
            min_stake: 100.0,
            lock_period_days: 30,
            base_apy,
            voting_weight_multiplier: 1.5,
            bonus_features: boosts
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    fn profile(focus: &str, zinc_gradient: i64) -> StakingProfile {
        StakingProfile {
            focus: focus.into(),
            zinc_gradient,
        }
    }

    #[test]
    fn test_boost_and_gradient() {
        let r = rule(10.0, &[("superachiever_boost", 1.2)]);
        let apy = effective_apy(&r, Some(&profile("superachiever", 50)));
        assert!((apy - 12.6).abs() < 1e-9);
        assert_eq!(format_apy(apy), "12.60%");
    }

    #[test]
    fn test_missing_profile_is_base_rate() {
        let r = rule(7.25, &[("superachiever_boost", 1.2)]);
        assert_eq!(effective_apy(&r, None), 7.25);
    }

    #[test]
    fn test_unknown_focus_has_no_boost() {
        let r = rule(10.0, &[("superachiever_boost", 1.2)]);
        assert_eq!(effective_apy(&r, Some(&profile("supermind", 0))), 10.0);
        assert_eq!(effective_apy(&r, Some(&profile("", 0))), 10.0);
    }

    #[test]
    fn test_monotonic_and_non_negative_in_gradient() {
        let r = rule(8.0, &[("supermind_boost", 1.1)]);
        let mut previous = f64::MIN;
        for gradient in -20..500 {
            let apy = effective_apy(&r, Some(&profile("supermind", gradient)));
            assert!(apy >= 0.0);
            assert!(apy >= previous);
            previous = apy;
        }
    }

    #[test]
    fn test_selection_toggles_off() {
        let mut selection = RuleSelection::default();
        selection.toggle("a");
        assert_eq!(selection.selected(), Some("a"));
        selection.toggle("a");
        assert_eq!(selection.selected(), None);
        selection.toggle("a");
        selection.toggle("b");
        assert_eq!(selection.selected(), Some("b"));
    }

    #[test]
    fn test_stake_validation() {
        let r = rule(10.0, &[]);
        let balance = TokenBalance {
            user_id: "u1".into(),
            token_type: TokenSymbol::Gen,
            balance: 500.0,
            staked_amount: 200.0,
        };
        let stake = |amount| StakeRequest {
            rule_id: r.id.clone(),
            amount,
        };

        assert!(stake(150.0).validate(&r, Some(&balance)).is_ok());
        assert!(stake(50.0).validate(&r, Some(&balance)).is_err());
        assert!(stake(301.0).validate(&r, Some(&balance)).is_err());
        assert!(stake(-1.0).validate(&r, Some(&balance)).is_err());
        assert!(stake(f64::NAN).validate(&r, Some(&balance)).is_err());
        assert!(stake(150.0).validate(&r, None).is_err());
    }

    #[test]
    fn test_projected_reward() {
        let reward = projected_reward(1000.0, 12.0, 365);
        assert!((reward - 120.0).abs() < 1e-9);
        assert_eq!(projected_reward(1000.0, 12.0, 0), 0.0);
    }

    #[test]
    fn test_rule_deserializes_with_defaults() {
        let r: StakingRule = serde_json::from_str(
            r#"{"id":"r","token_type":"SAP","base_apy":5.0,"bonus_features":{"supergenius_boost":1.3}}"#,
        )
        .unwrap();
        assert_eq!(r.voting_weight_multiplier, 1.0);
        assert_eq!(r.focus_boost("supergenius"), 1.3);
    }
}

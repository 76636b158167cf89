//! Token balance row schema

use serde::{Deserialize, Serialize};

use crate::tokens::TokenSymbol;

/// Table name for per-user token balances
pub const TOKEN_BALANCES_TABLE: &str = "token_balances";

/// Table name for staking rules
pub const TOKEN_STAKING_RULES_TABLE: &str = "token_staking_rules";

/// Per-user, per-token quantity with its staked portion
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TokenBalance {
    pub user_id: String,
    pub token_type: TokenSymbol,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub staked_amount: f64,
}

impl TokenBalance {
    /// Balance not locked in a stake
    pub fn available(&self) -> f64 {
        (self.balance - self.staked_amount).max(0.0)
    }
}

//! Profile row schema
//!
//! Identity, role and the scores the staking evaluator reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::auth::Role;
use crate::staking::StakingProfile;

/// Table name for profiles
pub const PROFILES_TABLE: &str = "profiles";

/// Profile row, one per authenticated user
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Profile {
    /// Same id as the platform auth user
    pub id: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub full_name: Option<String>,

    #[serde(default, deserialize_with = "stored_role")]
    pub role: Role,

    /// Declared focus area (e.g. "superachiever"), drives staking boosts
    #[serde(default)]
    pub focus: Option<String>,

    /// Engagement gradient score
    #[serde(default)]
    pub zinc_gradient: i64,

    /// Snapshot of the GEN balance shown in the header
    #[serde(default)]
    pub token_balance: f64,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Stored roles are free text; unknown or null values mean the lowest level
fn stored_role<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Role, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(Role::from_db(value.as_deref()))
}

impl Profile {
    /// Inputs for the effective APY calculation
    pub fn staking_profile(&self) -> StakingProfile {
        StakingProfile {
            focus: self.focus.clone().unwrap_or_default(),
            zinc_gradient: self.zinc_gradient,
        }
    }
}

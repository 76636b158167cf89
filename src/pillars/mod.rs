//! Pillars and their progress records
//!
//! Every pillar has a progress form backed by its own table. Rows are keyed by
//! `user_id`, created on the first save and overwritten on later saves. The
//! only rule enforced here is that the required fields are present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::AvolveError;

/// Thematic self-improvement/community categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pillar {
    Supermind,
    Supergenius,
    Superhuman,
    Superpuzzle,
    Supersociety,
    Superachiever,
    Supercivilization,
}

impl Pillar {
    pub const ALL: [Pillar; 7] = [
        Pillar::Supermind,
        Pillar::Supergenius,
        Pillar::Superhuman,
        Pillar::Superpuzzle,
        Pillar::Supersociety,
        Pillar::Superachiever,
        Pillar::Supercivilization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pillar::Supermind => "supermind",
            Pillar::Supergenius => "supergenius",
            Pillar::Superhuman => "superhuman",
            Pillar::Superpuzzle => "superpuzzle",
            Pillar::Supersociety => "supersociety",
            Pillar::Superachiever => "superachiever",
            Pillar::Supercivilization => "supercivilization",
        }
    }

    /// Table holding this pillar's progress rows
    pub fn progress_table(&self) -> &'static str {
        match self {
            Pillar::Supermind => "supermind_progress",
            Pillar::Supergenius => "supergenius_progress",
            Pillar::Superhuman => "superhuman_progress",
            Pillar::Superpuzzle => "superpuzzle_progress",
            Pillar::Supersociety => "supersociety_progress",
            Pillar::Superachiever => "superachiever_progress",
            Pillar::Supercivilization => "supercivilization_progress",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pillar {
    type Err = AvolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pillar::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AvolveError::BadRequest(format!("Unknown pillar: {}", s)))
    }
}

/// One user's saved state for one pillar form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarProgress {
    pub user_id: String,
    pub current_state: String,
    pub desired_state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PillarProgress {
    pub fn new(
        user_id: impl Into<String>,
        current_state: impl Into<String>,
        desired_state: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            current_state: current_state.into(),
            desired_state: desired_state.into(),
            action_plan: None,
            updated_at: None,
        }
    }

    pub fn with_action_plan(mut self, plan: impl Into<String>) -> Self {
        self.action_plan = Some(plan.into());
        self
    }

    /// Required fields must be present before the row is saved
    pub fn validate(&self) -> Result<(), AvolveError> {
        if self.user_id.trim().is_empty() {
            return Err(AvolveError::BadRequest("user_id is required".into()));
        }
        if self.current_state.trim().is_empty() {
            return Err(AvolveError::BadRequest("current_state is required".into()));
        }
        if self.desired_state.trim().is_empty() {
            return Err(AvolveError::BadRequest("desired_state is required".into()));
        }
        Ok(())
    }

    /// Stamp the row for an upsert
    pub fn touched(mut self, now: DateTime<Utc>) -> Self {
        self.updated_at = Some(now);
        self
    }
}

//! Load simulation against the hosted procedures
//!
//! Seeds synthetic members, exchanges invitations on the first day, then
//! replays a daily claim and challenge mix for each simulated day. Outcomes
//! are tallied per procedure; nothing here retries or corrects.

pub mod classify;
pub mod runner;
pub mod stats;

pub use classify::{classify, ErrorClass};
pub use runner::Simulation;
pub use stats::{RpcReport, SimReport, SimStats};

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::AvolveError;

/// Longest simulated window, ten years of days
pub const MAX_DAYS: u32 = 3650;

/// Simulation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub users: usize,
    pub days: u32,
    /// Maximum in-flight platform calls
    pub concurrency: usize,
    pub seed: u64,
    /// Nominal "today"; the last simulated day lands on it
    pub start_date: NaiveDate,
    pub password: String,
    /// Probability that a member completes a challenge on a given day
    pub challenge_rate: f64,
    /// Probability that an invitee redeems their invitation
    pub redeem_rate: f64,
    pub email_domain: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            users: 10,
            days: 7,
            concurrency: 8,
            seed: 42,
            start_date: Utc::now().date_naive(),
            password: "sim-password-123!".to_string(),
            challenge_rate: 0.5,
            redeem_rate: 1.0,
            email_domain: "sim.avolve.test".to_string(),
        }
    }
}

impl SimConfig {
    /// Calendar date of simulated day `day`
    pub fn sim_date(&self, day: u32) -> NaiveDate {
        let back = i64::from(self.days) - 1 - i64::from(day);
        self.start_date - Duration::days(back)
    }

    pub fn email_for(&self, index: usize) -> String {
        format!("sim-user-{}-{}@{}", self.seed, index, self.email_domain)
    }

    pub fn validate(&self) -> Result<(), AvolveError> {
        if self.users == 0 {
            return Err(AvolveError::Config("users must be at least 1".into()));
        }
        if self.days == 0 {
            return Err(AvolveError::Config("days must be at least 1".into()));
        }
        if self.days > MAX_DAYS {
            return Err(AvolveError::Config(format!("days must be at most {}", MAX_DAYS)));
        }
        if self.concurrency == 0 {
            return Err(AvolveError::Config("concurrency must be at least 1".into()));
        }
        for (name, rate) in [
            ("challenge_rate", self.challenge_rate),
            ("redeem_rate", self.redeem_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(AvolveError::Config(format!("{} must be within 0..=1", name)));
            }
        }
        Ok(())
    }
}

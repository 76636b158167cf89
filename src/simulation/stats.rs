//! Per-procedure tallies shared by concurrent simulation tasks

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use super::classify::{classify, ErrorClass};
use crate::platform::{PlatformError, Procedure};

#[derive(Default)]
struct Counters {
    attempts: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    race_conditions: AtomicU64,
    deadlocks: AtomicU64,
}

/// Live counters; every attempt lands in exactly one outcome bucket
#[derive(Default)]
pub struct SimStats {
    per_rpc: DashMap<Procedure, Counters>,
    users_seeded: AtomicU64,
    seeding_failures: AtomicU64,
}

impl SimStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one RPC attempt, returning the bucket a failure fell into
    pub fn record<T>(
        &self,
        procedure: Procedure,
        result: &Result<T, PlatformError>,
    ) -> Option<ErrorClass> {
        let class = result.as_ref().err().map(|e| classify(&e.message()));
        self.record_outcome(procedure, class);
        class
    }

    pub fn record_outcome(&self, procedure: Procedure, class: Option<ErrorClass>) {
        let counters = self.per_rpc.entry(procedure).or_default();
        counters.attempts.fetch_add(1, Ordering::Relaxed);
        let bucket = match class {
            None => &counters.successes,
            Some(ErrorClass::Failure) => &counters.failures,
            Some(ErrorClass::RaceCondition) => &counters.race_conditions,
            Some(ErrorClass::Deadlock) => &counters.deadlocks,
        };
        bucket.fetch_add(1, Ordering::Relaxed);
    }

    pub fn user_seeded(&self) {
        self.users_seeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn seeding_failed(&self) {
        self.seeding_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot, sorted by procedure
    pub fn snapshot(&self) -> (Vec<RpcReport>, u64, u64) {
        let mut rpcs: Vec<RpcReport> = self
            .per_rpc
            .iter()
            .map(|entry| {
                let c = entry.value();
                RpcReport {
                    procedure: *entry.key(),
                    attempts: c.attempts.load(Ordering::Relaxed),
                    successes: c.successes.load(Ordering::Relaxed),
                    failures: c.failures.load(Ordering::Relaxed),
                    race_conditions: c.race_conditions.load(Ordering::Relaxed),
                    deadlocks: c.deadlocks.load(Ordering::Relaxed),
                }
            })
            .collect();
        rpcs.sort_by_key(|r| r.procedure);
        (
            rpcs,
            self.users_seeded.load(Ordering::Relaxed),
            self.seeding_failures.load(Ordering::Relaxed),
        )
    }
}

/// Totals for one procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcReport {
    pub procedure: Procedure,
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub race_conditions: u64,
    pub deadlocks: u64,
}

impl RpcReport {
    pub fn errors(&self) -> u64 {
        self.failures + self.race_conditions + self.deadlocks
    }

    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.successes as f64 / self.attempts as f64
    }
}

/// Final result of a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimReport {
    pub users_requested: usize,
    pub users_seeded: u64,
    pub seeding_failures: u64,
    pub days: u32,
    pub seed: u64,
    pub elapsed_ms: u64,
    pub rpcs: Vec<RpcReport>,
}

impl SimReport {
    pub fn rpc(&self, procedure: Procedure) -> Option<&RpcReport> {
        self.rpcs.iter().find(|r| r.procedure == procedure)
    }

    pub fn total_attempts(&self) -> u64 {
        self.rpcs.iter().map(|r| r.attempts).sum()
    }

    pub fn total_errors(&self) -> u64 {
        self.rpcs.iter().map(RpcReport::errors).sum()
    }

    /// Write the summary through tracing
    pub fn log(&self) {
        info!(
            users = self.users_seeded,
            seeding_failures = self.seeding_failures,
            days = self.days,
            seed = self.seed,
            elapsed_ms = self.elapsed_ms,
            "simulation finished"
        );
        for r in &self.rpcs {
            info!(
                procedure = %r.procedure,
                attempts = r.attempts,
                successes = r.successes,
                failures = r.failures,
                race_conditions = r.race_conditions,
                deadlocks = r.deadlocks,
                success_rate = format!("{:.1}%", r.success_rate() * 100.0),
                "rpc totals"
            );
        }
    }
}

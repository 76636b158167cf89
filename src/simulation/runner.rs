//! Simulation engine
//!
//! Platform calls run as spawned tasks gated by a semaphore. Random choices
//! are drawn from one seeded `StdRng` before tasks are spawned, so the action
//! mix of a run depends only on the seed and the member count.

use futures::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::stats::{SimReport, SimStats};
use super::SimConfig;
use crate::db::schemas::CHALLENGES_TABLE;
use crate::platform::{rpc, Filter, Platform, PlatformError, Procedure};
use crate::tokens::day_token_for_index;
use crate::types::Result;

/// A signed-in synthetic member
#[derive(Clone)]
struct SimUser {
    id: String,
    client: Arc<dyn Platform>,
}

pub struct Simulation {
    platform: Arc<dyn Platform>,
    config: SimConfig,
    stats: Arc<SimStats>,
    permits: Arc<Semaphore>,
}

/// Create the member (or reuse one left by an earlier run) and sign in
async fn sign_up(
    platform: &dyn Platform,
    email: &str,
    password: &str,
) -> std::result::Result<SimUser, PlatformError> {
    if let Err(e) = platform.create_user(email, password).await {
        if !e.message().to_lowercase().contains("already") {
            return Err(e);
        }
        debug!(email, "reusing existing simulated member");
    }
    let session = platform.sign_in(email, password).await?;
    Ok(SimUser {
        id: session.user.id,
        client: platform.as_user(&session.access_token),
    })
}

fn row_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

impl Simulation {
    pub fn new(platform: Arc<dyn Platform>, config: SimConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self {
            platform,
            config,
            stats: Arc::new(SimStats::new()),
            permits,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<SimReport> {
        self.config.validate()?;
        let started = Instant::now();
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        info!(
            users = self.config.users,
            days = self.config.days,
            concurrency = self.config.concurrency,
            seed = self.config.seed,
            first_day = %self.config.sim_date(0),
            last_day = %self.config.sim_date(self.config.days - 1),
            "starting simulation"
        );

        let users = self.seed_users().await;
        if users.is_empty() {
            warn!("no simulated member could sign in; skipping daily replay");
            return Ok(self.report(started.elapsed()));
        }
        info!(signed_in = users.len(), "members seeded");

        let challenges = self.active_challenges().await;
        if challenges.is_empty() {
            warn!("no active challenges; challenge completions will be skipped");
        }

        self.exchange_invitations(&users, &mut rng).await;
        for day in 0..self.config.days {
            self.replay_day(day, &users, &challenges, &mut rng).await;
        }

        let report = self.report(started.elapsed());
        Ok(report)
    }

    async fn seed_users(&self) -> Vec<SimUser> {
        let tasks: Vec<_> = (0..self.config.users)
            .map(|index| {
                let platform = Arc::clone(&self.platform);
                let permits = Arc::clone(&self.permits);
                let stats = Arc::clone(&self.stats);
                let email = self.config.email_for(index);
                let password = self.config.password.clone();

                tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await.ok()?;
                    match sign_up(platform.as_ref(), &email, &password).await {
                        Ok(user) => {
                            stats.user_seeded();
                            Some(user)
                        }
                        Err(e) => {
                            stats.seeding_failed();
                            warn!(email = %email, error = %e.message(), "seeding failed");
                            None
                        }
                    }
                })
            })
            .collect();

        join_all(tasks)
            .await
            .into_iter()
            .filter_map(|joined| joined.ok().flatten())
            .collect()
    }

    async fn active_challenges(&self) -> Vec<String> {
        match self
            .platform
            .select(CHALLENGES_TABLE, &[Filter::eq("is_active", true)])
            .await
        {
            Ok(rows) => rows.iter().filter_map(row_id).collect(),
            Err(e) => {
                warn!(error = %e.message(), "failed to load challenges");
                Vec::new()
            }
        }
    }

    /// Day 0: the first member invites everyone else, who then redeem at once
    async fn exchange_invitations(&self, users: &[SimUser], rng: &mut StdRng) {
        let Some((inviter, invitees)) = users.split_first() else {
            return;
        };

        let mut codes = Vec::with_capacity(invitees.len());
        for _ in invitees {
            let result = rpc::create_invitation(inviter.client.as_ref(), &inviter.id).await;
            self.stats.record(Procedure::CreateInvitation, &result);
            codes.push(result.ok());
        }

        let tasks: Vec<_> = invitees
            .iter()
            .zip(codes)
            .filter_map(|(invitee, code)| {
                let redeem = rng.gen_bool(self.config.redeem_rate);
                code.filter(|_| redeem).map(|code| (invitee.clone(), code))
            })
            .map(|(invitee, code)| {
                let permits = Arc::clone(&self.permits);
                let stats = Arc::clone(&self.stats);
                tokio::spawn(async move {
                    let Ok(_permit) = permits.acquire_owned().await else {
                        return;
                    };
                    let result =
                        rpc::redeem_invitation(invitee.client.as_ref(), &code, &invitee.id).await;
                    stats.record(Procedure::RedeemInvitation, &result);
                })
            })
            .collect();

        join_all(tasks).await;
    }

    async fn replay_day(
        &self,
        day: u32,
        users: &[SimUser],
        challenges: &[String],
        rng: &mut StdRng,
    ) {
        let date = self.config.sim_date(day);
        let token = day_token_for_index(u64::from(day));
        debug!(day, %date, %token, "replaying day");

        let tasks: Vec<_> = users
            .iter()
            .map(|user| {
                let challenge = if !challenges.is_empty() && rng.gen_bool(self.config.challenge_rate) {
                    Some(challenges[rng.gen_range(0..challenges.len())].clone())
                } else {
                    None
                };
                let user = user.clone();
                let permits = Arc::clone(&self.permits);
                let stats = Arc::clone(&self.stats);

                tokio::spawn(async move {
                    let Ok(_permit) = permits.acquire_owned().await else {
                        return;
                    };
                    let client = user.client.as_ref();

                    let result = rpc::process_daily_claim(client, &user.id, token, date).await;
                    stats.record(Procedure::ProcessDailyClaim, &result);

                    if let Some(challenge_id) = challenge {
                        let data = json!({ "simulated": true, "day": day });
                        let result =
                            rpc::complete_challenge(client, &user.id, &challenge_id, data).await;
                        stats.record(Procedure::CompleteChallenge, &result);
                    }
                })
            })
            .collect();

        join_all(tasks).await;
    }

    fn report(&self, elapsed: Duration) -> SimReport {
        let (rpcs, users_seeded, seeding_failures) = self.stats.snapshot();
        SimReport {
            users_requested: self.config.users,
            users_seeded,
            seeding_failures,
            days: self.config.days,
            seed: self.config.seed,
            elapsed_ms: elapsed.as_millis() as u64,
            rpcs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::{api_error, MemoryPlatform};
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(users: usize, days: u32) -> SimConfig {
        SimConfig {
            users,
            days,
            concurrency: 2,
            seed: 7,
            start_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            challenge_rate: 1.0,
            redeem_rate: 1.0,
            ..SimConfig::default()
        }
    }

    fn platform() -> MemoryPlatform {
        let issued = Arc::new(AtomicUsize::new(0));
        MemoryPlatform::new()
            .with_rows(CHALLENGES_TABLE, vec![json!({"id": "c1", "is_active": true})])
            .on_rpc("create_invitation", move |_| {
                let n = issued.fetch_add(1, Ordering::SeqCst);
                Ok(json!({ "code": format!("INV{}", n) }))
            })
            .on_rpc("process_daily_claim", |params| {
                if params["p_claim_date"] == "2024-06-03" {
                    Err(api_error(500, "deadlock detected"))
                } else {
                    Ok(json!({"claimed": true}))
                }
            })
    }

    #[tokio::test]
    async fn test_counter_totals() {
        let platform = platform();
        let sim = Simulation::new(Arc::new(platform.clone()), config(3, 2));
        let report = sim.run().await.unwrap();

        assert_eq!(report.users_seeded, 3);
        assert_eq!(report.seeding_failures, 0);

        let invites = report.rpc(Procedure::CreateInvitation).unwrap();
        assert_eq!((invites.attempts, invites.successes), (2, 2));
        let redeems = report.rpc(Procedure::RedeemInvitation).unwrap();
        assert_eq!(redeems.attempts, 2);

        let claims = report.rpc(Procedure::ProcessDailyClaim).unwrap();
        assert_eq!(claims.attempts, 6);
        assert_eq!(claims.successes, 3);
        assert_eq!(claims.deadlocks, 3);

        let completions = report.rpc(Procedure::CompleteChallenge).unwrap();
        assert_eq!(completions.attempts, 6);

        for r in &report.rpcs {
            assert_eq!(r.successes + r.errors(), r.attempts);
        }
        assert_eq!(report.total_attempts(), 16);
        assert_eq!(report.total_errors(), 3);
    }

    #[tokio::test]
    async fn test_claims_use_day_tokens_and_dates() {
        let platform = platform();
        let sim = Simulation::new(Arc::new(platform.clone()), config(2, 2));
        sim.run().await.unwrap();

        let claims = platform.calls("process_daily_claim");
        let first_day: Vec<_> = claims
            .iter()
            .filter(|c| c["p_claim_date"] == "2024-06-02")
            .collect();
        assert_eq!(first_day.len(), 2);
        assert!(first_day
            .iter()
            .all(|c| c["p_token_type"] == day_token_for_index(0).code()));

        let mut codes: Vec<_> = platform
            .calls("redeem_invitation")
            .iter()
            .map(|c| c["p_code"].as_str().unwrap().to_string())
            .collect();
        codes.sort();
        assert_eq!(codes, vec!["INV0".to_string()]);
    }

    #[tokio::test]
    async fn test_seeding_failures_are_counted() {
        let cfg = config(3, 1);
        let platform = platform().with_user("taken", &cfg.email_for(0), "another-password");
        let sim = Simulation::new(Arc::new(platform.clone()), cfg);
        let report = sim.run().await.unwrap();

        assert_eq!(report.users_seeded, 2);
        assert_eq!(report.seeding_failures, 1);
    }

    #[tokio::test]
    async fn test_same_seed_same_action_mix() {
        let mut completions = Vec::new();
        for _ in 0..2 {
            let platform = platform();
            let cfg = SimConfig {
                challenge_rate: 0.5,
                ..config(6, 3)
            };
            Simulation::new(Arc::new(platform.clone()), cfg)
                .run()
                .await
                .unwrap();
            completions.push(platform.calls("complete_challenge").len());
        }
        assert_eq!(completions[0], completions[1]);
    }
}

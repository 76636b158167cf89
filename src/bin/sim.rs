//! Avolve simulation harness
//!
//! Seeds synthetic members against a hosted platform and replays daily claims,
//! invitations and challenge completions concurrently. Prints per-procedure
//! totals and optionally writes the report as JSON.
//!
//! Usage:
//!   avolve-sim --platform-url https://project.example.co --users 50 --days 14

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use avolve::logging;
use avolve::platform::{PlatformClient, PlatformConfig};
use avolve::simulation::{SimConfig, Simulation};

#[derive(Parser, Debug)]
#[command(name = "avolve-sim")]
#[command(about = "Replay synthetic member activity against the Avolve platform")]
struct Args {
    /// Base URL of the hosted platform
    #[arg(long, env = "PLATFORM_URL")]
    platform_url: String,

    /// Service-role key (needed to create members)
    #[arg(long, env = "PLATFORM_SERVICE_ROLE_KEY")]
    platform_service_role_key: Option<String>,

    #[arg(long, env = "PLATFORM_ANON_KEY")]
    platform_anon_key: Option<String>,

    /// Number of simulated members
    #[arg(long, env = "SIM_USERS", default_value = "10")]
    users: usize,

    /// Number of simulated days
    #[arg(long, env = "SIM_DAYS", default_value = "7")]
    days: u32,

    /// Maximum in-flight platform calls
    #[arg(long, env = "SIM_CONCURRENCY", default_value = "8")]
    concurrency: usize,

    #[arg(long, env = "SIM_SEED", default_value = "42")]
    seed: u64,

    /// Last simulated day (YYYY-MM-DD, defaults to today)
    #[arg(long, env = "SIM_START_DATE")]
    start_date: Option<NaiveDate>,

    #[arg(long, env = "SIM_PASSWORD", default_value = "sim-password-123!")]
    password: String,

    /// Probability of a challenge completion per member per day
    #[arg(long, default_value = "0.5")]
    challenge_rate: f64,

    /// Probability that an invitee redeems their invitation
    #[arg(long, default_value = "1.0")]
    redeem_rate: f64,

    #[arg(long, default_value = "sim.avolve.test")]
    email_domain: String,

    /// Write the final report as JSON to this path
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    request_timeout_ms: u64,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    log_format: String,
}

impl Args {
    fn sim_config(&self) -> SimConfig {
        SimConfig {
            users: self.users,
            days: self.days,
            concurrency: self.concurrency,
            seed: self.seed,
            start_date: self.start_date.unwrap_or_else(|| Utc::now().date_naive()),
            password: self.password.clone(),
            challenge_rate: self.challenge_rate,
            redeem_rate: self.redeem_rate,
            email_domain: self.email_domain.clone(),
        }
    }

    fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            url: self.platform_url.clone(),
            anon_key: self.platform_anon_key.clone(),
            service_role_key: self.platform_service_role_key.clone(),
            timeout_secs: self.request_timeout_ms.div_ceil(1000).max(1),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init_tracing(&args.log_level, &args.log_format);

    let config = args.sim_config();
    config.validate()?;

    info!(platform = %args.platform_url, "avolve-sim starting");

    let platform = PlatformClient::service(args.platform_config())
        .context("failed to build platform client")?;
    let report = Simulation::new(Arc::new(platform), config).run().await?;
    report.log();

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    Ok(())
}

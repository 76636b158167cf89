//! Avolve smoke test
//!
//! Checks that a deployed platform answers for the core tables and the member
//! journey procedure. Prints one PASS/FAIL line per check and exits non-zero
//! when anything failed.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use avolve::db::schemas::{PROFILES_TABLE, TOKEN_BALANCES_TABLE, TOKEN_STAKING_RULES_TABLE};
use avolve::logging;
use avolve::pillars::Pillar;
use avolve::platform::{rpc, Platform, PlatformClient, PlatformConfig};

#[derive(Parser, Debug)]
#[command(name = "avolve-smoke")]
#[command(about = "End-to-end smoke test against a deployed Avolve platform")]
struct Args {
    #[arg(long, env = "PLATFORM_URL")]
    platform_url: String,

    #[arg(long, env = "PLATFORM_SERVICE_ROLE_KEY")]
    platform_service_role_key: Option<String>,

    #[arg(long, env = "PLATFORM_ANON_KEY")]
    platform_anon_key: Option<String>,

    /// Member to sign in as; the service key is used when absent
    #[arg(long, env = "SMOKE_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "SMOKE_PASSWORD")]
    password: Option<String>,

    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    request_timeout_ms: u64,

    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

struct Checks {
    passed: usize,
    failed: usize,
}

impl Checks {
    fn record<T, E: std::fmt::Display>(&mut self, name: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => {
                self.passed += 1;
                println!("PASS  {}", name);
                Some(value)
            }
            Err(e) => {
                self.failed += 1;
                println!("FAIL  {}: {}", name, e);
                None
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init_tracing(&args.log_level, "pretty");

    let config = PlatformConfig {
        url: args.platform_url.clone(),
        anon_key: args.platform_anon_key.clone(),
        service_role_key: args.platform_service_role_key.clone(),
        timeout_secs: args.request_timeout_ms.div_ceil(1000).max(1),
    };
    let service: Arc<dyn Platform> =
        Arc::new(PlatformClient::service(config).context("failed to build platform client")?);

    let mut checks = Checks { passed: 0, failed: 0 };

    let (client, user_id) = match (&args.email, &args.password) {
        (Some(email), Some(password)) => {
            match checks.record("sign in", service.sign_in(email, password).await) {
                Some(session) => (service.as_user(&session.access_token), Some(session.user.id)),
                None => (Arc::clone(&service), None),
            }
        }
        _ => {
            warn!("no SMOKE_EMAIL/SMOKE_PASSWORD; checking with the service key only");
            (Arc::clone(&service), None)
        }
    };

    let mut tables = vec![PROFILES_TABLE, TOKEN_BALANCES_TABLE, TOKEN_STAKING_RULES_TABLE];
    tables.extend(Pillar::ALL.iter().map(Pillar::progress_table));
    for table in tables {
        let result = client.count(table, &[]).await.map_err(|e| e.message());
        if let Some(rows) = checks.record(&format!("table {}", table), result) {
            info!(table, rows, "table reachable");
        }
    }

    match &user_id {
        Some(id) => {
            let result = rpc::get_member_journey_status(client.as_ref(), id)
                .await
                .map_err(|e| e.message());
            checks.record("rpc get_member_journey_status", result);
        }
        None => println!("SKIP  rpc get_member_journey_status: no signed-in member"),
    }

    println!("{} passed, {} failed", checks.passed, checks.failed);
    if checks.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

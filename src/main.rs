//! Avolve - function host for the Avolve community platform

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use avolve::{
    config::Args,
    functions::FunctionName,
    logging,
    platform::PlatformClient,
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init_tracing(&args.log_level, &args.log_format);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let flags = args.feature_flags();
    info!("======================================");
    info!("  Avolve - function host");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Platform: {}", args.platform_url);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    for function in FunctionName::ALL {
        info!(
            "  {:<22} {}",
            function.as_str(),
            if function.is_enabled(&flags) { "enabled" } else { "disabled" }
        );
    }
    info!("======================================");

    let platform = PlatformClient::service(args.platform_config())?;
    let audit_log = args.audit_log.clone();

    let mut state = AppState::new(args, Arc::new(platform))?;
    if let Some(path) = audit_log {
        state = state.with_audit_log(path).await?;
    }

    server::run(Arc::new(state)).await?;
    info!("Avolve stopped");
    Ok(())
}

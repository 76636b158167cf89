//! Logging for avolve
//!
//! Tracing subscriber setup plus the JSONL invocation audit log.

pub mod audit;

pub use audit::{InvocationEvent, InvocationLogger, Outcome};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is not set
pub fn default_filter(level: &str) -> String {
    format!(
        "avolve={0},avolve_sim={0},avolve_smoke={0},info",
        level
    )
}

/// Install the global subscriber; `format` is `pretty` or `json`
pub fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into());
    let registry = tracing_subscriber::registry().with(filter);

    if format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

//! Health and version endpoints
//!
//! - /health, /healthz - liveness, always 200 while the process runs
//! - /version - build information for deployment verification

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::collections::BTreeMap;

use super::json_response;
use crate::functions::FunctionName;
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Seconds since the server started
    pub uptime: u64,
    pub timestamp: String,
    pub mode: &'static str,
    /// Function name to enabled flag
    pub functions: BTreeMap<&'static str, bool>,
    /// Whether scheduled callers can authenticate
    pub shared_secret_configured: bool,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    let functions = FunctionName::ALL
        .iter()
        .map(|f| (f.as_str(), f.is_enabled(&state.flags)))
        .collect();

    HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        functions,
        shared_secret_configured: state.secret.is_configured(),
    }
}

pub fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &build_health_response(state))
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub commit: &'static str,
    pub commit_full: &'static str,
    pub build_time: &'static str,
    pub service: &'static str,
}

pub fn version_info() -> Response<Full<Bytes>> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "avolve",
    };
    json_response(StatusCode::OK, &response)
}

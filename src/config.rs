//! Configuration for the avolve function host
//!
//! CLI arguments and environment variables via clap. A `.env` file is loaded
//! by the binaries before parsing.

use clap::{ArgAction, Parser};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::auth::{JwtValidator, SharedSecretValidator};
use crate::platform::PlatformConfig;
use crate::types::AvolveError;

/// Minimum length for any configured secret
pub const MIN_SECRET_LEN: usize = 32;

/// Avolve - serverless function host for the Avolve platform
#[derive(Parser, Debug, Clone)]
#[command(name = "avolve")]
#[command(about = "Function host for the Avolve community platform")]
pub struct Args {
    /// Base URL of the hosted platform
    #[arg(long, env = "PLATFORM_URL")]
    pub platform_url: String,

    /// Public anon key, sent as the `apikey` header for member-scoped clients
    #[arg(long, env = "PLATFORM_ANON_KEY")]
    pub platform_anon_key: Option<String>,

    /// Service-role key used by the handlers (required in production)
    #[arg(long, env = "PLATFORM_SERVICE_ROLE_KEY")]
    pub platform_service_role_key: Option<String>,

    /// HS256 secret the platform signs member JWTs with (required in production)
    #[arg(long, env = "PLATFORM_JWT_SECRET")]
    pub platform_jwt_secret: Option<String>,

    /// Shared secret expected from scheduled callers in `x-function-secret`
    #[arg(long, env = "FUNCTIONS_SHARED_SECRET")]
    pub functions_shared_secret: Option<String>,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8787")]
    pub listen: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (pretty, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Timeout for platform requests in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Optional JSONL file receiving one line per function invocation
    #[arg(long, env = "AUDIT_LOG")]
    pub audit_log: Option<PathBuf>,

    /// Enable development mode (fixed local JWT secret, relaxed validation)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Feature flags
    #[command(flatten)]
    pub features: FeatureArgs,
}

/// Per-function switches, all on by default
#[derive(Parser, Debug, Clone)]
pub struct FeatureArgs {
    #[arg(long, env = "FEATURE_CHALLENGES", default_value_t = true, action = ArgAction::Set)]
    pub feature_challenges: bool,

    #[arg(long, env = "FEATURE_DATA_EXPORT", default_value_t = true, action = ArgAction::Set)]
    pub feature_data_export: bool,

    #[arg(long, env = "FEATURE_DB_MAINTENANCE", default_value_t = true, action = ArgAction::Set)]
    pub feature_db_maintenance: bool,

    #[arg(long, env = "FEATURE_VALUE_CREATION", default_value_t = true, action = ArgAction::Set)]
    pub feature_value_creation: bool,

    #[arg(long, env = "FEATURE_TOKEN_STAKING", default_value_t = true, action = ArgAction::Set)]
    pub feature_token_staking: bool,
}

/// Immutable feature switches, read once at startup and passed explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub challenges: bool,
    pub data_export: bool,
    pub db_maintenance: bool,
    pub value_creation: bool,
    pub token_staking: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            challenges: true,
            data_export: true,
            db_maintenance: true,
            value_creation: true,
            token_staking: true,
        }
    }
}

impl From<&FeatureArgs> for FeatureFlags {
    fn from(args: &FeatureArgs) -> Self {
        Self {
            challenges: args.feature_challenges,
            data_export: args.feature_data_export,
            db_maintenance: args.feature_db_maintenance,
            value_creation: args.feature_value_creation,
            token_staking: args.feature_token_staking,
        }
    }
}

impl Args {
    pub fn feature_flags(&self) -> FeatureFlags {
        FeatureFlags::from(&self.features)
    }

    /// Settings for the platform HTTP client
    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            url: self.platform_url.clone(),
            anon_key: self.platform_anon_key.clone(),
            service_role_key: self.platform_service_role_key.clone(),
            timeout_secs: self.request_timeout_ms.div_ceil(1000).max(1),
        }
    }

    /// JWT validator (dev mode falls back to a fixed local secret)
    pub fn jwt_validator(&self) -> Result<JwtValidator, AvolveError> {
        match &self.platform_jwt_secret {
            Some(secret) => JwtValidator::new(secret.clone(), 3600),
            None if self.dev_mode => Ok(JwtValidator::new_dev()),
            None => Err(AvolveError::Config(
                "PLATFORM_JWT_SECRET is required in production mode".into(),
            )),
        }
    }

    pub fn shared_secret(&self) -> SharedSecretValidator {
        SharedSecretValidator::new(self.functions_shared_secret.clone())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.platform_url.starts_with("http://") && !self.platform_url.starts_with("https://") {
            return Err("PLATFORM_URL must be an http(s) URL".to_string());
        }

        if !self.dev_mode {
            if self.platform_service_role_key.is_none() {
                return Err("PLATFORM_SERVICE_ROLE_KEY is required in production mode".to_string());
            }
            if self.platform_jwt_secret.is_none() {
                return Err("PLATFORM_JWT_SECRET is required in production mode".to_string());
            }
        }

        for (name, secret) in [
            ("PLATFORM_JWT_SECRET", &self.platform_jwt_secret),
            ("FUNCTIONS_SHARED_SECRET", &self.functions_shared_secret),
        ] {
            if let Some(secret) = secret {
                if secret.len() < MIN_SECRET_LEN {
                    return Err(format!("{} must be at least {} characters", name, MIN_SECRET_LEN));
                }
            }
        }

        if !matches!(self.log_format.as_str(), "pretty" | "json") {
            return Err("LOG_FORMAT must be \"pretty\" or \"json\"".to_string());
        }

        Ok(())
    }
}

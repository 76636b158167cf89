//! Error types for the platform client

use thiserror::Error;

/// Failure talking to the hosted platform
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Transport failure before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-2xx answer, `message` is the platform's own text
    #[error("Platform error {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl PlatformError {
    /// The raw message reported by the platform, or this error's text
    pub fn message(&self) -> String {
        match self {
            PlatformError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Build an API error from a response body
    ///
    /// Table/RPC errors carry `message`, auth errors carry `msg`,
    /// `error_description` or `error`. Anything else is passed through raw.
    pub fn from_body(status: u16, body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        let message = field("message")
            .or_else(|| field("msg"))
            .or_else(|| field("error_description"))
            .or_else(|| field("error"))
            .unwrap_or_else(|| body.trim().to_string());
        let code = field("code").or_else(|| field("error_code"));

        PlatformError::Api {
            status,
            code,
            message,
        }
    }
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;

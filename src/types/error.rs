//! Error types for avolve

use hyper::StatusCode;

use crate::platform::PlatformError;

/// Main error type for avolve operations
#[derive(Debug, thiserror::Error)]
pub enum AvolveError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Raw failure reported by the hosted platform
    #[error("{0}")]
    Platform(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AvolveError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Platform(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message placed in the `error` field of a JSON response
    pub fn public_message(&self) -> String {
        match self {
            // Platform errors surface the raw platform string
            Self::Platform(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for AvolveError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AvolveError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for AvolveError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<reqwest::Error> for AvolveError {
    fn from(err: reqwest::Error) -> Self {
        Self::Platform(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AvolveError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

impl From<PlatformError> for AvolveError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Api { message, .. } => Self::Platform(message),
            other => Self::Platform(other.to_string()),
        }
    }
}

/// Result type alias for avolve operations
pub type Result<T> = std::result::Result<T, AvolveError>;

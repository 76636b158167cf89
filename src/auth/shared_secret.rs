//! Shared-secret authentication for scheduled callers
//!
//! Maintenance functions are invoked by cron jobs that send the secret in the
//! `x-function-secret` header instead of a user JWT.

/// Header carrying the shared secret
pub const SHARED_SECRET_HEADER: &str = "x-function-secret";

/// Validator for the functions shared secret
#[derive(Debug, Clone)]
pub struct SharedSecretValidator {
    secret: Option<String>,
}

impl SharedSecretValidator {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// An unconfigured secret rejects every caller
    pub fn validate(&self, provided: Option<&str>) -> bool {
        match (&self.secret, provided) {
            (Some(expected), Some(given)) => constant_time_compare(given, expected),
            _ => false,
        }
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

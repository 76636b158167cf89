//! Platform JWT verification
//!
//! Access tokens are issued by the hosted platform's auth service and signed
//! with the project JWT secret (HS256). Handlers verify them locally and then
//! look up the caller's role from `profiles`.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::MIN_SECRET_LEN;
use crate::types::AvolveError;

/// Audience the platform stamps on signed-in member tokens
pub const AUTHENTICATED_AUDIENCE: &str = "authenticated";

const DEV_SECRET: &str = "avolve-local-development-jwt-secret-0000";

/// Claims carried by a platform access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Auth user id (same as `profiles.id`)
    pub sub: String,
    /// Platform role ("authenticated", "anon", "service_role")
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Verifies (and, for tooling and tests, issues) platform tokens
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    ttl_secs: i64,
}

impl JwtValidator {
    pub fn new(secret: String, ttl_secs: i64) -> Result<Self, AvolveError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AvolveError::Config(format!(
                "PLATFORM_JWT_SECRET must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }
        Ok(Self { secret, ttl_secs })
    }

    /// Fixed local secret, only for dev mode
    pub fn new_dev() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            ttl_secs: 3600,
        }
    }

    /// Mint a member token shaped like the platform's own
    pub fn generate_token(&self, user_id: &str, email: Option<&str>) -> Result<String, AvolveError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            role: AUTHENTICATED_AUDIENCE.to_string(),
            email: email.map(str::to_string),
            aud: AUTHENTICATED_AUDIENCE.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AvolveError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Decode a member access token, rejecting anything not signed for members
    pub fn verify_token(&self, token: &str) -> Result<Claims, AvolveError> {
        let mut validation = Validation::default();
        validation.set_audience(&[AUTHENTICATED_AUDIENCE]);

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|err| {
            let reason = match err.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidSignature => "Invalid signature",
                ErrorKind::InvalidAudience => "Invalid audience",
                _ => "Invalid token",
            };
            AvolveError::Unauthorized(reason.into())
        })?;

        if data.claims.sub.is_empty() {
            return Err(AvolveError::Unauthorized("Token has no subject".into()));
        }
        Ok(data.claims)
    }
}

/// Token from an `Authorization` header value, `Bearer <token>` or bare
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let header = header?.trim_start();
    let token = match header.split_once(' ') {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        Some(_) => return None,
        None => header,
    };
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "member-token-secret-member-token-secret";

    fn validator() -> JwtValidator {
        JwtValidator::new(SECRET.into(), 3600).unwrap()
    }

    #[test]
    fn test_round_trip_claims() {
        let v = validator();
        let token = v.generate_token("member-7", Some("member@avolve.io")).unwrap();

        let claims = v.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "member-7");
        assert_eq!(claims.email.as_deref(), Some("member@avolve.io"));
        assert_eq!(claims.aud, AUTHENTICATED_AUDIENCE);
    }

    #[test]
    fn test_garbage_and_foreign_tokens_rejected() {
        assert!(matches!(
            validator().verify_token("not-a-jwt"),
            Err(AvolveError::Unauthorized(_))
        ));

        let foreign = JwtValidator::new_dev().generate_token("member-7", None).unwrap();
        let err = validator().verify_token(&foreign).unwrap_err();
        assert_eq!(err.public_message(), "Unauthorized: Invalid signature");
    }

    #[test]
    fn test_anon_audience_rejected() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "visitor".into(),
            role: "anon".into(),
            email: None,
            aud: "anon".into(),
            iat: now,
            exp: now + 600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(validator().verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let expired = JwtValidator::new(SECRET.into(), -7200).unwrap();
        let token = expired.generate_token("member-7", None).unwrap();
        let err = validator().verify_token(&token).unwrap_err();
        assert_eq!(err.public_message(), "Unauthorized: Token expired");
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(Some("bearer  abc ")), Some("abc"));
        assert_eq!(bearer_token(Some("abc")), Some("abc"));
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(JwtValidator::new("short".into(), 3600).is_err());
        assert!(JwtValidator::new(String::new(), 3600).is_err());
    }
}

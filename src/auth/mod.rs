//! Authentication and authorization for function handlers
//!
//! Provides:
//! - Platform JWT verification (HS256, project secret)
//! - Shared-secret checks for scheduled/maintenance callers
//! - Role levels looked up from `profiles.role`

pub mod jwt;
pub mod permissions;
pub mod shared_secret;

pub use jwt::{bearer_token, Claims, JwtValidator};
pub use permissions::{AuthMode, Role};
pub use shared_secret::SharedSecretValidator;

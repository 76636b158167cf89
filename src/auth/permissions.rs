//! Member roles and per-function authentication modes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role stored on a profile row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular member
    #[default]
    User,
    /// Can moderate social content
    Moderator,
    /// Admin console access, may act on other users' data
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Moderator => write!(f, "moderator"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl Role {
    /// Parse a stored role, treating unknown values as the lowest level
    pub fn from_db(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("admin") | Some("super_admin") => Role::Admin,
            Some("moderator") => Role::Moderator,
            _ => Role::User,
        }
    }

    pub fn satisfies(&self, required: Role) -> bool {
        *self >= required
    }
}

/// How a function authenticates its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// `x-function-secret` header must match the configured secret
    SharedSecret,
    /// Bearer JWT plus a minimum profile role
    Jwt { min_role: Role },
}

//! Serverless-style function handlers
//!
//! Each function accepts a JSON body with an `action` discriminator and
//! dispatches to a handful of sequential platform calls. There is no retry or
//! compensation: the first platform error ends the invocation and its raw
//! message is returned to the caller.
//!
//! ## Functions
//!
//! - `challenges` - daily challenges, daily token claim, journey status
//! - `data-export` - member data export with checksum
//! - `database-maintenance` - scheduled cleanup (shared secret)
//! - `value-creation` - recognition, pillar progress, feature unlocks
//! - `token-staking` - staking quotes and stake submission

pub mod challenges;
pub mod data_export;
pub mod database_maintenance;
pub mod token_staking;
pub mod value_creation;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::auth::{bearer_token, AuthMode, JwtValidator, Role, SharedSecretValidator};
use crate::config::FeatureFlags;
use crate::db::schemas::{Profile, PROFILES_TABLE};
use crate::platform::{first_row, Filter, Platform};
use crate::types::{AvolveError, Result};

/// Deployed function names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionName {
    Challenges,
    DataExport,
    DatabaseMaintenance,
    ValueCreation,
    TokenStaking,
}

impl FunctionName {
    pub const ALL: [FunctionName; 5] = [
        FunctionName::Challenges,
        FunctionName::DataExport,
        FunctionName::DatabaseMaintenance,
        FunctionName::ValueCreation,
        FunctionName::TokenStaking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionName::Challenges => "challenges",
            FunctionName::DataExport => "data-export",
            FunctionName::DatabaseMaintenance => "database-maintenance",
            FunctionName::ValueCreation => "value-creation",
            FunctionName::TokenStaking => "token-staking",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }

    pub fn auth_mode(&self) -> AuthMode {
        match self {
            FunctionName::DatabaseMaintenance => AuthMode::SharedSecret,
            _ => AuthMode::Jwt {
                min_role: Role::User,
            },
        }
    }

    pub fn is_enabled(&self, flags: &FeatureFlags) -> bool {
        match self {
            FunctionName::Challenges => flags.challenges,
            FunctionName::DataExport => flags.data_export,
            FunctionName::DatabaseMaintenance => flags.db_maintenance,
            FunctionName::ValueCreation => flags.value_creation,
            FunctionName::TokenStaking => flags.token_staking,
        }
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is invoking a function
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    /// Absent for shared-secret callers
    pub user_id: Option<String>,
    pub role: Role,
}

impl Caller {
    pub fn scheduler() -> Self {
        Self {
            user_id: None,
            role: Role::Admin,
        }
    }

    pub fn member(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: Some(user_id.into()),
            role,
        }
    }
}

/// Credentials presented with a request
#[derive(Debug, Clone, Copy, Default)]
pub struct Credentials<'a> {
    pub authorization: Option<&'a str>,
    pub shared_secret: Option<&'a str>,
}

/// Authenticate a caller according to the function's mode
///
/// JWT callers get their role from `profiles.role`; a missing profile row
/// means the lowest role.
pub async fn authenticate(
    mode: AuthMode,
    credentials: Credentials<'_>,
    jwt: &JwtValidator,
    secret: &SharedSecretValidator,
    platform: &dyn Platform,
) -> Result<Caller> {
    match mode {
        AuthMode::SharedSecret => {
            if secret.validate(credentials.shared_secret) {
                Ok(Caller::scheduler())
            } else {
                Err(AvolveError::Unauthorized("Invalid function secret".into()))
            }
        }
        AuthMode::Jwt { min_role } => {
            let token = bearer_token(credentials.authorization)
                .ok_or_else(|| AvolveError::Unauthorized("No token provided".into()))?;
            let claims = jwt.verify_token(token)?;

            let profile: Option<Profile> = first_row(
                platform
                    .select(PROFILES_TABLE, &[Filter::eq("id", &claims.sub)])
                    .await?,
            )?;
            let role = profile.map(|p| p.role).unwrap_or_default();
            debug!(user_id = %claims.sub, %role, "caller authenticated");

            if !role.satisfies(min_role) {
                return Err(AvolveError::Forbidden(format!("{} role required", min_role)));
            }
            Ok(Caller::member(claims.sub, role))
        }
    }
}

/// Everything a handler needs for one invocation
#[derive(Clone)]
pub struct FunctionContext {
    pub platform: Arc<dyn Platform>,
    pub caller: Caller,
    pub now: DateTime<Utc>,
}

impl FunctionContext {
    pub fn new(platform: Arc<dyn Platform>, caller: Caller) -> Self {
        Self {
            platform,
            caller,
            now: Utc::now(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Id of the signed-in member
    pub fn user_id(&self) -> Result<&str> {
        self.caller
            .user_id
            .as_deref()
            .ok_or_else(|| AvolveError::Unauthorized("A signed-in member is required".into()))
    }

    /// Resolve whose data an action targets; only admins may name someone else
    pub fn target_user<'a>(&'a self, requested: Option<&'a str>) -> Result<&'a str> {
        let own = self.user_id()?;
        match requested {
            Some(other) if other != own => {
                if self.caller.role.satisfies(Role::Admin) {
                    Ok(other)
                } else {
                    Err(AvolveError::Forbidden(
                        "Only admins may act on another member".into(),
                    ))
                }
            }
            _ => Ok(own),
        }
    }
}

/// The `action` field of a request body, if any
pub fn action_name(body: &Value) -> Option<&str> {
    body.get("action").and_then(Value::as_str)
}

pub(crate) fn parse_action<A: DeserializeOwned>(function: FunctionName, body: Value) -> Result<A> {
    if action_name(&body).is_none() {
        return Err(AvolveError::BadRequest(format!(
            "{} requires an \"action\" field",
            function
        )));
    }
    serde_json::from_value(body)
        .map_err(|e| AvolveError::BadRequest(format!("Invalid {} request: {}", function, e)))
}

/// JSON for a row built by a handler; failure here is ours, not the caller's
pub(crate) fn row_value<T: Serialize>(row: &T) -> Result<Value> {
    serde_json::to_value(row)
        .map_err(|e| AvolveError::Internal(format!("Failed to serialize row: {}", e)))
}

/// Run one function invocation
pub async fn invoke(function: FunctionName, ctx: &FunctionContext, body: Value) -> Result<Value> {
    match function {
        FunctionName::Challenges => challenges::handle(ctx, parse_action(function, body)?).await,
        FunctionName::DataExport => data_export::handle(ctx, parse_action(function, body)?).await,
        FunctionName::DatabaseMaintenance => {
            database_maintenance::handle(ctx, parse_action(function, body)?).await
        }
        FunctionName::ValueCreation => {
            value_creation::handle(ctx, parse_action(function, body)?).await
        }
        FunctionName::TokenStaking => {
            token_staking::handle(ctx, parse_action(function, body)?).await
        }
    }
}

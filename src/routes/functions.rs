//! Function invocation route
//!
//! `POST /functions/v1/{name}` with a JSON body carrying an `action` field.
//! Every invocation is traced and, when configured, appended to the audit log.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::{header, Request, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::{error_response, json_response};
use crate::auth::shared_secret::SHARED_SECRET_HEADER;
use crate::functions::{self, action_name, Caller, Credentials, FunctionContext, FunctionName};
use crate::logging::InvocationEvent;
use crate::server::AppState;
use crate::types::AvolveError;

/// Path prefix for function invocations
pub const FUNCTIONS_PREFIX: &str = "/functions/v1/";

/// Largest accepted request body
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

fn header_str<'a>(req: &'a Request<Incoming>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Read the request and hand it to [`invoke_function`]
pub async fn handle_function_request(
    state: Arc<AppState>,
    name: &str,
    req: Request<Incoming>,
) -> Response<Full<Bytes>> {
    let declared_len = header_str(&req, header::CONTENT_LENGTH.as_str())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    if declared_len > MAX_BODY_BYTES {
        return error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
    }

    let authorization = header_str(&req, header::AUTHORIZATION.as_str()).map(str::to_string);
    let shared_secret = header_str(&req, SHARED_SECRET_HEADER).map(str::to_string);

    // Chunked bodies carry no length up front
    let body = match Limited::new(req.into_body(), MAX_BODY_BYTES as usize).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Failed to read request body: {}", e),
            )
        }
    };

    let credentials = Credentials {
        authorization: authorization.as_deref(),
        shared_secret: shared_secret.as_deref(),
    };
    invoke_function(&state, name, credentials, &body).await
}

/// Resolve, authenticate, parse and run one function invocation
pub async fn invoke_function(
    state: &AppState,
    name: &str,
    credentials: Credentials<'_>,
    body: &[u8],
) -> Response<Full<Bytes>> {
    let started = Instant::now();

    let Some(function) = FunctionName::parse(name) else {
        return error_response(StatusCode::NOT_FOUND, &format!("Function {} not found", name));
    };
    if !function.is_enabled(&state.flags) {
        return error_response(StatusCode::NOT_FOUND, &format!("Function {} is disabled", name));
    }

    let caller = match functions::authenticate(
        function.auth_mode(),
        credentials,
        &state.jwt,
        &state.secret,
        state.platform.as_ref(),
    )
    .await
    {
        Ok(caller) => caller,
        Err(e) => {
            warn!(function = %function, error = %e, "invocation rejected");
            let event = InvocationEvent::new(function.as_str(), e.status_code().as_u16())
                .with_error(e.public_message())
                .with_duration(started.elapsed().as_millis() as u64);
            state.audit.log(event).await;
            return error_response(e.status_code(), &e.public_message());
        }
    };

    let parsed = if body.iter().all(u8::is_ascii_whitespace) {
        Ok(Value::Object(Default::default()))
    } else {
        serde_json::from_slice::<Value>(body)
            .map_err(|e| AvolveError::BadRequest(format!("Invalid JSON body: {}", e)))
    };
    let action = parsed
        .as_ref()
        .ok()
        .and_then(action_name)
        .map(str::to_string);

    let result = match parsed {
        Ok(body) => {
            let ctx = FunctionContext::new(Arc::clone(&state.platform), caller.clone());
            functions::invoke(function, &ctx, body).await
        }
        Err(e) => Err(e),
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    let response = match &result {
        Ok(value) => json_response(StatusCode::OK, value),
        Err(e) => error_response(e.status_code(), &e.public_message()),
    };

    let status = response.status().as_u16();
    audit(state, function, action.as_deref(), &caller, status, duration_ms, result.err()).await;
    response
}

async fn audit(
    state: &AppState,
    function: FunctionName,
    action: Option<&str>,
    caller: &Caller,
    status: u16,
    duration_ms: u64,
    error: Option<AvolveError>,
) {
    match &error {
        None => info!(
            function = %function,
            action,
            user_id = ?caller.user_id,
            status,
            duration_ms,
            "function invoked"
        ),
        Some(e) => warn!(
            function = %function,
            action,
            user_id = ?caller.user_id,
            status,
            duration_ms,
            error = %e,
            "function failed"
        ),
    }

    let mut event = InvocationEvent::new(function.as_str(), status)
        .with_action(action)
        .with_caller(caller.user_id.as_deref(), caller.role)
        .with_duration(duration_ms);
    if let Some(e) = error {
        event = event.with_error(e.public_message());
    }
    state.audit.log(event).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureFlags;
    use crate::db::schemas::PROFILES_TABLE;
    use crate::platform::memory::{api_error, MemoryPlatform};
    use crate::server::http::tests::{state_with, CRON_SECRET};
    use serde_json::json;

    async fn body_json(response: Response<Full<Bytes>>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn bearer(state: &AppState, user_id: &str) -> String {
        format!("Bearer {}", state.jwt.generate_token(user_id, None).unwrap())
    }

    #[tokio::test]
    async fn test_unknown_and_disabled_functions_are_not_found() {
        let mut state = state_with(MemoryPlatform::new());
        let response = invoke_function(&state, "send-email", Credentials::default(), b"{}").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        state.flags = FeatureFlags {
            challenges: false,
            ..FeatureFlags::default()
        };
        let auth = bearer(&state, "u1");
        let credentials = Credentials {
            authorization: Some(&auth),
            shared_secret: None,
        };
        let response = invoke_function(&state, "challenges", credentials, br#"{"action":"list"}"#).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_auth_failures() {
        let state = state_with(MemoryPlatform::new());

        let response =
            invoke_function(&state, "challenges", Credentials::default(), br#"{"action":"list"}"#).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");

        let response = invoke_function(
            &state,
            "database-maintenance",
            Credentials {
                authorization: None,
                shared_secret: Some("not-the-secret"),
            },
            br#"{"action":"stats"}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bad_json_and_unknown_action() {
        let state = state_with(MemoryPlatform::new());
        let auth = bearer(&state, "u1");
        let credentials = Credentials {
            authorization: Some(&auth),
            shared_secret: None,
        };

        let response = invoke_function(&state, "challenges", credentials, b"{not json").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = invoke_function(&state, "challenges", credentials, br#"{"action":"dance"}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = invoke_function(&state, "challenges", credentials, b"").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_platform_failure_is_500_with_raw_message() {
        let platform = MemoryPlatform::new()
            .on_rpc("get_member_journey_status", |_| Err(api_error(400, "relation does not exist")));
        let state = state_with(platform);
        let auth = bearer(&state, "u1");

        let response = invoke_function(
            &state,
            "challenges",
            Credentials {
                authorization: Some(&auth),
                shared_secret: None,
            },
            br#"{"action":"journey"}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({"error": "relation does not exist"}));
    }

    #[tokio::test]
    async fn test_scheduler_runs_maintenance() {
        let platform = MemoryPlatform::new().with_rows(PROFILES_TABLE, vec![json!({"id": "u1"})]);
        let state = state_with(platform);

        let response = invoke_function(
            &state,
            "database-maintenance",
            Credentials {
                authorization: None,
                shared_secret: Some(CRON_SECRET),
            },
            br#"{"action":"stats"}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["tables"]["profiles"], 1);
    }

    #[tokio::test]
    async fn test_member_happy_path() {
        let platform = MemoryPlatform::new();
        let state = state_with(platform.clone());
        let auth = bearer(&state, "u1");

        let response = invoke_function(
            &state,
            "value-creation",
            Credentials {
                authorization: Some(&auth),
                shared_secret: None,
            },
            br#"{"action":"save_pillar_progress","pillar":"supergenius","current_state":"a","desired_state":"b"}"#,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(platform.rows("supergenius_progress").len(), 1);
    }
}

//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::{JwtValidator, SharedSecretValidator};
use crate::config::{Args, FeatureFlags};
use crate::functions::FunctionName;
use crate::logging::InvocationLogger;
use crate::platform::Platform;
use crate::routes::{self, error_response, FUNCTIONS_PREFIX};
use crate::types::AvolveError;

/// Shared state for every request
pub struct AppState {
    pub args: Args,
    pub flags: FeatureFlags,
    /// Service-role client used by all handlers
    pub platform: Arc<dyn Platform>,
    pub jwt: JwtValidator,
    pub secret: SharedSecretValidator,
    pub audit: InvocationLogger,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, platform: Arc<dyn Platform>) -> Result<Self, AvolveError> {
        let jwt = args.jwt_validator()?;
        Ok(Self {
            flags: args.feature_flags(),
            secret: args.shared_secret(),
            args,
            platform,
            jwt,
            audit: InvocationLogger::new(),
            started_at: Instant::now(),
        })
    }

    /// Start writing invocation events to `path`
    pub async fn with_audit_log(self, path: PathBuf) -> Result<Self, AvolveError> {
        self.audit.init_file(path).await?;
        Ok(self)
    }
}

/// Bind `args.listen` and serve until interrupted
pub async fn run(state: Arc<AppState>) -> Result<(), AvolveError> {
    let listener = TcpListener::bind(state.args.listen).await?;
    info!("Avolve listening on {}", listener.local_addr()?);

    if state.args.dev_mode {
        warn!("Development mode enabled - using local JWT secret");
    }
    if !state.secret.is_configured() {
        warn!("FUNCTIONS_SHARED_SECRET not set - database-maintenance will reject every caller");
    }
    for function in FunctionName::ALL {
        if !function.is_enabled(&state.flags) {
            info!("Function {} disabled by feature flag", function);
        }
    }

    tokio::select! {
        _ = serve(listener, state) => Ok(()),
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    }
}

/// Accept connections on an already bound listener
pub async fn serve(listener: TcpListener, state: Arc<AppState>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!("[{}] {} {}", addr, method, path);

    let response = match (&method, path.as_str()) {
        // CORS preflight
        (&Method::OPTIONS, _) => preflight_response(),

        (&Method::GET, "/health") | (&Method::GET, "/healthz") => routes::health_check(&state),
        (&Method::GET, "/version") => routes::version_info(),

        (&Method::POST, p) if p.starts_with(FUNCTIONS_PREFIX) => {
            let name = p[FUNCTIONS_PREFIX.len()..].trim_end_matches('/').to_string();
            routes::handle_function_request(Arc::clone(&state), &name, req).await
        }
        (_, p) if p.starts_with(FUNCTIONS_PREFIX) => {
            error_response(StatusCode::METHOD_NOT_ALLOWED, "Functions accept POST only")
        }

        _ => not_found_response(&path),
    };

    Ok(response)
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header(
            "Access-Control-Allow-Headers",
            "authorization, x-client-info, apikey, content-type, x-function-secret",
        )
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    routes::json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({
            "error": "Not Found",
            "path": path,
            "hint": "POST /functions/v1/{name} with a JSON body containing \"action\"",
        }),
    )
}

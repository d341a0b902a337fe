//! # Riposte HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Corpus status
//! - `POST /respond` - Answer an input statement
//! - `POST /statements` - Record a statement
//! - `POST /statements/forget` - Remove a statement
//! - `POST /export` - Export corpus snapshot
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `RIPOSTE_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `RIPOSTE_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `RIPOSTE_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_ENV, get_api_key_from_env};
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    ExportResponse, ForgetRequest, ForgetResponse, HealthResponse, RecordRequest, RecordResponse,
    RespondRequest, RespondResponse, StatusResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use riposte_core::{LogicChain, ResponderConfig, RiposteError, Session};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
///
/// The session (and with it the one-step conversation memory) is shared by
/// every client of this server.
#[derive(Clone)]
pub struct AppState {
    /// The session containing the corpus.
    pub session: Arc<RwLock<Session>>,
    /// Adapters consulted for every answer.
    pub chain: Arc<LogicChain>,
    /// Default learning setting for `/respond`.
    pub learn: bool,
    /// Snapshot file rewritten after changes (file backend only).
    pub snapshot: Option<PathBuf>,
}

impl AppState {
    /// Create app state from a session and a built chain.
    #[must_use]
    pub fn new(session: Session, chain: LogicChain, learn: bool) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            chain: Arc::new(chain),
            learn,
            snapshot: None,
        }
    }

    /// Build app state from a responder configuration.
    pub fn from_config(session: Session, config: &ResponderConfig) -> Result<Self, RiposteError> {
        Ok(Self::new(session, config.build_chain()?, config.learn))
    }

    /// Write the corpus back to `path` after every change.
    #[must_use]
    pub fn with_snapshot(mut self, path: PathBuf) -> Self {
        self.snapshot = Some(path);
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `RIPOSTE_CORS_ORIGINS`.
///
/// - `*`: allows all origins
/// - unset: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("RIPOSTE_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (RIPOSTE_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in RIPOSTE_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                restricted_cors(allowed_origins)
            }
        }
        None => {
            tracing::info!("CORS: No RIPOSTE_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    restricted_cors(origins)
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Rate Limiting (if enabled)
/// 4. Authentication (if configured)
pub fn create_router(state: AppState) -> Router {
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set {} to enable authentication.",
            API_KEY_ENV
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/respond", post(handlers::respond_handler))
        .route("/statements", post(handlers::record_handler))
        .route("/statements/forget", post(handlers::forget_handler))
        .route("/export", post(handlers::export_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(
    addr: &str,
    session: Session,
    config: &ResponderConfig,
    snapshot: Option<PathBuf>,
) -> Result<(), RiposteError> {
    let mut state = AppState::from_config(session, config)?;
    if let Some(path) = snapshot {
        state = state.with_snapshot(path);
    }
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RiposteError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Riposte HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RiposteError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

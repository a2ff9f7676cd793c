//! revive-app — the demo service watched by `revive-monitor`.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Plain-text greeting (also served for unknown paths) |
//! | GET | `/health` | `{"status":"healthy",...}` health document |
//! | GET | `/status` | Uptime and version |
//!
//! Every request passes through a logging middleware and is cut off with a
//! 408 after `REQUEST_TIMEOUT`.

pub mod handlers;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::middleware;
use axum::routing::get;
use tower_http::timeout::TimeoutLayer;

/// Name reported in the health document.
pub const SERVICE_NAME: &str = "hello-world-app";

/// Version reported by `/status`.
pub const VERSION: &str = "1.0.0";

/// Upper bound on handling a single request. Slower requests get a 408.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared state for handlers. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppInfo>,
}

struct AppInfo {
    started_at: Instant,
    service: String,
    version: String,
}

impl AppState {
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_start_time(service, version, Instant::now())
    }

    pub fn with_start_time(
        service: impl Into<String>,
        version: impl Into<String>,
        started_at: Instant,
    ) -> Self {
        Self {
            inner: Arc::new(AppInfo {
                started_at,
                service: service.into(),
                version: version.into(),
            }),
        }
    }

    pub fn service(&self) -> &str {
        &self.inner.service
    }

    pub fn version(&self) -> &str {
        &self.inner.version
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.inner.started_at.elapsed()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SERVICE_NAME, VERSION)
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/", get(handlers::hello))
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .fallback(handlers::hello)
        .layer(middleware::from_fn(handlers::log_requests))
        .with_state(state);
    with_limits(router, REQUEST_TIMEOUT)
}

/// Bound every request on `router` by `timeout`.
pub fn with_limits(router: Router, timeout: Duration) -> Router {
    router.layer(TimeoutLayer::new(timeout))
}

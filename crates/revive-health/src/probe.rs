//! HTTP health probe.
//!
//! Performs one bounded GET against the service's health endpoint and
//! classifies the answer. A probe never retries; the recovery controller
//! decides whether to probe again.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, Request, StatusCode, Uri, header};
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use revive_core::MonitorConfig;

use crate::error::ProbeError;

/// The only `status` value accepted as healthy.
pub const HEALTHY_STATUS: &str = "healthy";

/// Anything that can answer "is the service healthy right now?".
pub trait HealthCheck {
    fn check(&self) -> impl Future<Output = bool> + Send;
}

/// Outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// An HTTP response was received.
    pub reachable: bool,
    pub status_code: Option<u16>,
    /// The `status` field from the response body, when one was decoded.
    pub reported_status: Option<String>,
    /// `None` exactly when the service is healthy.
    pub error: Option<ProbeError>,
}

impl ProbeResult {
    pub fn is_healthy(&self) -> bool {
        self.error.is_none()
    }

    fn unreachable(error: ProbeError) -> Self {
        Self {
            reachable: false,
            status_code: None,
            reported_status: None,
            error: Some(error),
        }
    }
}

/// Probes `app_url + health_endpoint` with a per-request timeout.
pub struct HealthProbe {
    url: String,
    timeout: Duration,
    client: Client<HttpConnector, Empty<Bytes>>,
}

impl HealthProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new())
            // A pooled connection would not survive a service restart.
            .pool_max_idle_per_host(0)
            .build_http();
        Self {
            url: url.into(),
            timeout,
            client,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.health_url(), config.timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Run one probe and log its outcome.
    pub async fn probe(&self) -> ProbeResult {
        debug!(url = %self.url, "checking service health");

        let result = match tokio::time::timeout(self.timeout, self.fetch()).await {
            Ok(result) => result,
            Err(_) => ProbeResult::unreachable(ProbeError::Timeout(self.timeout)),
        };

        match &result.error {
            None => info!(url = %self.url, "service is healthy"),
            Some(err) if err.is_transport() => {
                error!(url = %self.url, error = %err, "failed to reach service");
            }
            Some(ProbeError::BadStatus(code)) => {
                warn!(url = %self.url, status_code = code, "service returned unexpected status code");
            }
            Some(ProbeError::Degraded(status)) => {
                warn!(url = %self.url, status = %status, "service reports a problem");
            }
            Some(err) => {
                warn!(url = %self.url, error = %err, "malformed health check response");
            }
        }

        result
    }

    async fn fetch(&self) -> ProbeResult {
        let uri: Uri = match self.url.parse() {
            Ok(uri) => uri,
            Err(e) => {
                return ProbeResult::unreachable(ProbeError::Transport(format!(
                    "invalid url {}: {e}",
                    self.url
                )));
            }
        };

        let req = match Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::USER_AGENT, "revive-monitor/0.1")
            .header(header::ACCEPT, "application/json")
            .body(Empty::<Bytes>::new())
        {
            Ok(req) => req,
            Err(e) => return ProbeResult::unreachable(ProbeError::Transport(e.to_string())),
        };

        let resp = match self.client.request(req).await {
            Ok(resp) => resp,
            Err(e) => return ProbeResult::unreachable(ProbeError::Transport(error_chain(&e))),
        };

        let status = resp.status();
        let mut result = ProbeResult {
            reachable: true,
            status_code: Some(status.as_u16()),
            reported_status: None,
            error: None,
        };

        if status != StatusCode::OK {
            result.error = Some(ProbeError::BadStatus(status.as_u16()));
            return result;
        }

        let body = match resp.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                result.error = Some(ProbeError::MalformedBody(error_chain(&e)));
                return result;
            }
        };

        match reported_status(&body) {
            Ok(reported) => {
                if reported != HEALTHY_STATUS {
                    result.error = Some(ProbeError::Degraded(reported.clone()));
                }
                result.reported_status = Some(reported);
            }
            Err(err) => result.error = Some(err),
        }

        result
    }
}

impl HealthCheck for HealthProbe {
    async fn check(&self) -> bool {
        self.probe().await.is_healthy()
    }
}

/// Extract `status` from a health document.
///
/// The body must be a single JSON object; extra fields are ignored. A
/// missing or null `status` reads as `""`, a non-string one is malformed.
fn reported_status(body: &[u8]) -> Result<String, ProbeError> {
    let doc: Value =
        serde_json::from_slice(body).map_err(|e| ProbeError::MalformedBody(e.to_string()))?;

    let fields = match doc {
        Value::Object(fields) => fields,
        other => {
            return Err(ProbeError::MalformedBody(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )));
        }
    };

    match fields.get("status") {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(status)) => Ok(status.clone()),
        Some(other) => Err(ProbeError::MalformedBody(format!(
            "status must be a string, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Render an error with its source chain, e.g. `client error (Connect): tcp connect error: ...`.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use axum::{Json, Router};
    use axum::routing::get;
    use serde_json::json;

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn test_router() -> Router {
        Router::new()
            .route(
                "/health",
                get(|| async { Json(json!({"status": "healthy", "service": "hello-world-app"})) }),
            )
            .route("/degraded", get(|| async { Json(json!({"status": "degraded"})) }))
            .route("/uppercase", get(|| async { Json(json!({"status": "HEALTHY"})) }))
            .route("/no-status", get(|| async { Json(json!({"service": "x"})) }))
            .route("/numeric", get(|| async { Json(json!({"status": 1})) }))
            .route("/garbage", get(|| async { "definitely not json" }))
            .route("/array", get(|| async { Json(json!(["healthy"])) }))
            .route("/bare-string", get(|| async { Json(json!("healthy")) }))
            .route("/null-status", get(|| async { Json(json!({"status": null})) }))
            .route(
                "/unavailable",
                get(|| async {
                    (
                        axum::http::StatusCode::SERVICE_UNAVAILABLE,
                        Json(json!({"status": "healthy"})),
                    )
                }),
            )
            .route(
                "/created",
                get(|| async {
                    (axum::http::StatusCode::CREATED, Json(json!({"status": "healthy"})))
                }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Json(json!({"status": "healthy"}))
                }),
            )
    }

    async fn probe_path(path: &str) -> ProbeResult {
        let addr = serve(test_router()).await;
        HealthProbe::new(format!("http://{addr}{path}"), Duration::from_secs(2))
            .probe()
            .await
    }

    #[tokio::test]
    async fn healthy_response_passes() {
        let result = probe_path("/health").await;
        assert!(result.is_healthy());
        assert!(result.reachable);
        assert_eq!(result.status_code, Some(200));
        assert_eq!(result.reported_status.as_deref(), Some("healthy"));
    }

    #[tokio::test]
    async fn check_returns_true_for_healthy() {
        let addr = serve(test_router()).await;
        let probe = HealthProbe::new(format!("http://{addr}/health"), Duration::from_secs(2));
        assert!(probe.check().await);
    }

    #[tokio::test]
    async fn degraded_status_fails() {
        let result = probe_path("/degraded").await;
        assert!(!result.is_healthy());
        assert_eq!(result.error, Some(ProbeError::Degraded("degraded".to_string())));
        assert_eq!(result.reported_status.as_deref(), Some("degraded"));
    }

    #[tokio::test]
    async fn status_comparison_is_exact() {
        let result = probe_path("/uppercase").await;
        assert_eq!(result.error, Some(ProbeError::Degraded("HEALTHY".to_string())));
    }

    #[tokio::test]
    async fn absent_status_fails() {
        let result = probe_path("/no-status").await;
        assert_eq!(result.error, Some(ProbeError::Degraded(String::new())));
    }

    #[tokio::test]
    async fn non_string_status_is_malformed() {
        let result = probe_path("/numeric").await;
        assert!(matches!(result.error, Some(ProbeError::MalformedBody(_))));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let result = probe_path("/garbage").await;
        assert!(result.reachable);
        assert!(matches!(result.error, Some(ProbeError::MalformedBody(_))));
        assert_eq!(result.reported_status, None);
    }

    #[tokio::test]
    async fn array_body_is_malformed() {
        let result = probe_path("/array").await;
        assert!(!result.is_healthy());
        assert!(matches!(result.error, Some(ProbeError::MalformedBody(_))));
        assert_eq!(result.reported_status, None);
    }

    #[tokio::test]
    async fn bare_string_body_is_malformed() {
        let result = probe_path("/bare-string").await;
        assert!(!result.is_healthy());
        assert!(matches!(result.error, Some(ProbeError::MalformedBody(_))));
    }

    #[tokio::test]
    async fn null_status_fails_as_empty() {
        let result = probe_path("/null-status").await;
        assert_eq!(result.error, Some(ProbeError::Degraded(String::new())));
    }

    #[test]
    fn reported_status_requires_object() {
        assert_eq!(
            reported_status(br#"{"status":"healthy","uptime":"5s"}"#),
            Ok("healthy".to_string())
        );
        assert_eq!(reported_status(br#"{}"#), Ok(String::new()));
        let bodies: [&[u8]; 5] = [br#"["healthy"]"#, br#""healthy""#, b"null", b"true", b"42"];
        for body in bodies {
            assert!(
                matches!(reported_status(body), Err(ProbeError::MalformedBody(_))),
                "accepted {}",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn reported_status_rejects_trailing_content() {
        let err = reported_status(br#"{"status":"healthy"} x"#).unwrap_err();
        assert!(matches!(err, ProbeError::MalformedBody(_)));
    }

    #[tokio::test]
    async fn non_200_fails_even_with_healthy_body() {
        let result = probe_path("/unavailable").await;
        assert_eq!(result.error, Some(ProbeError::BadStatus(503)));
        assert_eq!(result.status_code, Some(503));

        let result = probe_path("/created").await;
        assert_eq!(result.error, Some(ProbeError::BadStatus(201)));
    }

    #[tokio::test]
    async fn missing_route_fails_with_404() {
        let result = probe_path("/nope").await;
        assert_eq!(result.error, Some(ProbeError::BadStatus(404)));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let addr = serve(test_router()).await;
        let probe = HealthProbe::new(format!("http://{addr}/slow"), Duration::from_millis(100));
        let result = probe.probe().await;
        assert!(!result.reachable);
        assert_eq!(result.error, Some(ProbeError::Timeout(Duration::from_millis(100))));
    }

    #[tokio::test]
    async fn closed_port_is_transport_error() {
        // Nothing listens on port 1.
        let probe = HealthProbe::new("http://127.0.0.1:1/health", Duration::from_millis(500));
        let result = probe.probe().await;
        assert!(!result.reachable);
        assert!(result.error.as_ref().is_some_and(ProbeError::is_transport));
        assert!(!probe.check().await);
    }

    #[tokio::test]
    async fn invalid_url_is_transport_error() {
        let probe = HealthProbe::new("http://bad host/health", Duration::from_millis(500));
        let result = probe.probe().await;
        assert!(matches!(result.error, Some(ProbeError::Transport(_))));
    }

    #[tokio::test]
    async fn from_config_builds_url_and_timeout() {
        let config = MonitorConfig {
            app_url: "http://127.0.0.1:9000".to_string(),
            health_endpoint: "/healthz".to_string(),
            timeout_seconds: 3,
            max_retries: 3,
            retry_delay_seconds: 1,
            service_name: "svc".to_string(),
            use_service_manager: true,
            restart_backend: Default::default(),
            use_sudo: false,
            log_file: String::new(),
            log_level: "info".to_string(),
        };
        let probe = HealthProbe::from_config(&config);
        assert_eq!(probe.url(), "http://127.0.0.1:9000/healthz");
        assert_eq!(probe.timeout, Duration::from_secs(3));
    }
}

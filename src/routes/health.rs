//! Health check endpoints
//!
//! Kubernetes-style probes:
//! - /health, /healthz - liveness (is the gateway running?)
//! - /ready, /readyz - readiness (can the document store be reached?)
//!
//! Liveness always answers 200 while the process is up. Readiness pings
//! the store; in dev mode the in-memory store always answers.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::server::http::respond;
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub status: &'static str,
    pub version: &'static str,
    pub uptime: u64,
    pub timestamp: String,
    pub mode: String,
    pub node_id: String,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    HealthResponse {
        healthy: true,
        status: "online",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode {
            "development".to_string()
        } else {
            "production".to_string()
        },
        node_id: state.args.node_id.to_string(),
    }
}

/// Liveness probe.
pub fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    let health = build_health_response(state);
    let body = serde_json::to_string(&health).unwrap_or_else(|_| "{}".to_string());
    respond(StatusCode::OK, "application/json", body)
}

/// Readiness probe: 200 only when the store answers.
pub async fn readiness_check(state: &AppState) -> Response<Full<Bytes>> {
    match state.store.ping().await {
        Ok(()) => respond(
            StatusCode::OK,
            "application/json",
            r#"{"ready": true}"#.to_string(),
        ),
        Err(e) => respond(
            StatusCode::SERVICE_UNAVAILABLE,
            "application/json",
            format!(r#"{{"ready": false, "error": "{}"}}"#, e),
        ),
    }
}

/// Version info for deployment verification.
pub fn version_info() -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "commit": env!("GIT_COMMIT_SHORT"),
        "built": env!("BUILD_TIMESTAMP"),
    });
    respond(StatusCode::OK, "application/json", body.to_string())
}

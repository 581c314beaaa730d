//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::AppState;

pub const SERVICE_NAME: &str = "OFB Catalog API";

/// `GET /` response.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

/// `GET /health` response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_latency_ms: Option<u64>,
}

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

/// Process status and timestamp. Does not touch the database.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now(),
    })
}

/// Liveness probe endpoint.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
        database_latency_ms: None,
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 when the database answers, 503 otherwise. Pool gauges are
/// refreshed on every probe.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let start = std::time::Instant::now();
    let db_connected = persistence::db::ping(&state.pool).await.is_ok();

    if db_connected {
        Ok(Json(StatusResponse {
            status: "ready".to_string(),
            database_latency_ms: Some(start.elapsed().as_millis() as u64),
        }))
    } else {
        tracing::warn!("Readiness check failed: database unreachable");
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

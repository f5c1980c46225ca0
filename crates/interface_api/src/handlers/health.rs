//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use core_kernel::HealthCheckable;
use domain_partner::PartnerStore;

use crate::AppState;

pub const SERVICE_NAME: &str = "bpartner-api";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl HealthResponse {
    fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            latency_ms: None,
        }
    }
}

/// Liveness; never touches the database
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::new("OK"))
}

/// Readiness check (includes database)
pub async fn readiness_check<S: PartnerStore>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<HealthResponse>) {
    let result = state.service.store().health_check().await;

    let (status, label) = if result.is_healthy() {
        (StatusCode::OK, "ready")
    } else {
        tracing::warn!(message = ?result.message, "Readiness check failed");
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    let mut body = HealthResponse::new(label);
    body.latency_ms = Some(result.latency_ms);
    (status, Json(body))
}

//! Health and readiness endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub checks: ReadinessChecks,
}

#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub report_source: CheckStatus,
    pub client_lookup: CheckStatus,
}

#[derive(Debug, Serialize)]
pub struct CheckStatus {
    pub healthy: bool,
    pub message: String,
}

/// GET /health
///
/// Basic health check - returns 200 if the server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /ready
///
/// Readiness check - verifies an issue snapshot can be loaded
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let source_check = match state.cache.ensure_loaded().await {
        Ok(snapshot) => CheckStatus {
            healthy: true,
            message: format!(
                "{} records from {} (age {}s)",
                snapshot.records.len(),
                state.cache.source(),
                state.cache.age().map(|a| a.as_secs()).unwrap_or(0)
            ),
        },
        Err(e) => CheckStatus {
            healthy: false,
            message: e.to_string(),
        },
    };

    // An empty table is allowed; every host then reports as Unknown
    let lookup_check = CheckStatus {
        healthy: true,
        message: format!("{} clients mapped", state.lookup.len()),
    };

    let all_healthy = source_check.healthy && lookup_check.healthy;
    let status = if all_healthy { "ready" } else { "not_ready" };
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(ReadinessResponse {
            status,
            checks: ReadinessChecks {
                report_source: source_check,
                client_lookup: lookup_check,
            },
        }),
    )
}

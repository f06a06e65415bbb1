//! Manual refresh endpoint

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub refreshed: bool,
    /// Records in the new snapshot
    pub records: usize,
    pub malformed: usize,
    pub warning: Option<String>,
}

/// POST /api/v1/refresh
///
/// Drops the cached snapshot and fetches a new one. A failed fetch leaves the
/// cache empty so the next report retries.
pub async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    state.cache.invalidate();

    let response = match state.cache.refresh().await {
        Ok(snapshot) => {
            info!(records = snapshot.records.len(), "Snapshot refreshed on request");
            RefreshResponse {
                refreshed: true,
                records: snapshot.records.len(),
                malformed: snapshot.malformed,
                warning: None,
            }
        }
        Err(e) => RefreshResponse {
            refreshed: false,
            records: 0,
            malformed: 0,
            warning: Some(e.to_string()),
        },
    };

    Json(response)
}

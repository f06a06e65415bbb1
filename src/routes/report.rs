//! Dashboard report API endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::Selection;
use crate::pipeline::{self, DashboardReport};
use crate::state::AppState;

/// Query parameters for the report endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Comma separated client labels
    pub clients: Option<String>,
    /// Comma separated host ids
    pub hosts: Option<String>,
}

impl ReportQuery {
    /// Absent parameters mean "all"; a present but empty list selects nothing.
    pub fn selection(&self) -> Result<Selection> {
        match (&self.clients, &self.hosts) {
            (None, None) => Ok(Selection::All),
            (Some(_), Some(_)) => Err(AppError::InvalidRequest(
                "'clients' and 'hosts' cannot be combined".into(),
            )),
            (Some(clients), None) => Ok(Selection::clients(split_list(clients))),
            (None, Some(hosts)) => {
                let hosts = split_list(hosts)
                    .map(|h| {
                        h.parse::<i64>().map_err(|_| {
                            AppError::InvalidRequest(format!("Invalid host id '{}'", h))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Selection::hosts(hosts))
            }
        }
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// GET /api/v1/report
///
/// Builds the dashboard report over the current snapshot.
///
/// Query parameters:
/// - clients: restrict to these client labels
/// - hosts: restrict to these host ids
pub async fn get_report(
    State(state): State<AppState>,
    Query(params): Query<ReportQuery>,
) -> Result<Json<DashboardReport>> {
    let selection = params.selection()?;
    let now = Utc::now();

    let snapshot = state.cache.get().await;
    let report = pipeline::report_for(snapshot, &state.lookup, &selection, now)?;

    state.metrics.inc_reports();
    debug!(
        status = ?report.status,
        total = report.aggregates.kpis.total,
        "Report built"
    );

    Ok(Json(report))
}

//! Metrics reporter - one immutable result per pipeline run

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::aggregate::{aggregate, Aggregates};
use super::filter::available_clients;
use crate::models::{Issue, Selection};

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Ok,
    /// The selection matched no issues
    NoData,
    /// The source could not be fetched or parsed
    DataUnavailable,
}

/// Result handed to the presentation layer.
///
/// Field order and all collection orders are fixed, so serializing the same
/// run twice yields identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub status: ReportStatus,
    pub warning: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub selection: Selection,
    /// Records dropped by ingestion or enrichment
    pub skipped_records: usize,
    /// Enriched issues before filtering
    pub snapshot_size: usize,
    pub available_clients: Vec<String>,
    #[serde(flatten)]
    pub aggregates: Aggregates,
    /// Every filtered issue, newest report first
    pub issues: Vec<Issue>,
}

impl DashboardReport {
    pub fn assemble(
        snapshot: &[Issue],
        filtered: &[&Issue],
        skipped_records: usize,
        selection: &Selection,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let (status, warning) = if filtered.is_empty() {
            (
                ReportStatus::NoData,
                Some("No issues match the current selection".to_string()),
            )
        } else {
            (ReportStatus::Ok, None)
        };

        Self {
            status,
            warning,
            generated_at,
            selection: selection.clone(),
            skipped_records,
            snapshot_size: snapshot.len(),
            available_clients: available_clients(snapshot),
            aggregates: aggregate(filtered),
            issues: newest_first(filtered),
        }
    }

    /// Empty report for a run whose source was unreachable
    pub fn unavailable(
        reason: impl Into<String>,
        selection: &Selection,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: ReportStatus::DataUnavailable,
            warning: Some(reason.into()),
            generated_at,
            selection: selection.clone(),
            skipped_records: 0,
            snapshot_size: 0,
            available_clients: Vec::new(),
            aggregates: aggregate(&[]),
            issues: Vec::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

fn newest_first(issues: &[&Issue]) -> Vec<Issue> {
    let mut sorted = issues.to_vec();
    sorted.sort_by(|a, b| {
        b.reported_date
            .cmp(&a.reported_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted.into_iter().cloned().collect()
}

//! Prometheus metrics endpoint

use axum::response::IntoResponse;
use std::sync::atomic::{AtomicU64, Ordering};

/// Application metrics for Prometheus
#[derive(Default)]
pub struct Metrics {
    /// Fetches issued against the report source
    pub source_fetches_total: AtomicU64,
    /// Fetches that ended in `DataUnavailable`
    pub source_failures_total: AtomicU64,
    /// Report requests answered from a fresh cached snapshot
    pub cache_hits_total: AtomicU64,
    /// Reports built
    pub reports_total: AtomicU64,
    /// Records no report can use (malformed or undated), across all fetches
    pub records_skipped_total: AtomicU64,
    /// Usable issues in the most recent snapshot
    snapshot_issues: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_fetches(&self) {
        self.source_fetches_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failures(&self) {
        self.source_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reports(&self) {
        self.reports_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped(&self, count: u64) {
        self.records_skipped_total.fetch_add(count, Ordering::Relaxed);
    }

    pub fn set_snapshot_issues(&self, count: u64) {
        self.snapshot_issues.store(count, Ordering::Relaxed);
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            source_fetches_total: self.source_fetches_total.load(Ordering::Relaxed),
            source_failures_total: self.source_failures_total.load(Ordering::Relaxed),
            cache_hits_total: self.cache_hits_total.load(Ordering::Relaxed),
            reports_total: self.reports_total.load(Ordering::Relaxed),
            records_skipped_total: self.records_skipped_total.load(Ordering::Relaxed),
            snapshot_issues: self.snapshot_issues.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub source_fetches_total: u64,
    pub source_failures_total: u64,
    pub cache_hits_total: u64,
    pub reports_total: u64,
    pub records_skipped_total: u64,
    pub snapshot_issues: u64,
}

impl MetricsSnapshot {
    /// Render in the Prometheus text exposition format
    pub fn render(&self) -> String {
        format!(
            r#"# HELP issue_insights_source_fetches_total Total number of report source fetches
# TYPE issue_insights_source_fetches_total counter
issue_insights_source_fetches_total {}

# HELP issue_insights_source_failures_total Total number of failed report source fetches
# TYPE issue_insights_source_failures_total counter
issue_insights_source_failures_total {}

# HELP issue_insights_cache_hits_total Total number of reports served from the snapshot cache
# TYPE issue_insights_cache_hits_total counter
issue_insights_cache_hits_total {}

# HELP issue_insights_reports_total Total number of reports built
# TYPE issue_insights_reports_total counter
issue_insights_reports_total {}

# HELP issue_insights_records_skipped_total Total number of malformed or undated records skipped
# TYPE issue_insights_records_skipped_total counter
issue_insights_records_skipped_total {}

# HELP issue_insights_snapshot_issues Usable issues in the current snapshot
# TYPE issue_insights_snapshot_issues gauge
issue_insights_snapshot_issues {}

# HELP issue_insights_info Build information
# TYPE issue_insights_info gauge
issue_insights_info{{version="{}"}} 1
"#,
            self.source_fetches_total,
            self.source_failures_total,
            self.cache_hits_total,
            self.reports_total,
            self.records_skipped_total,
            self.snapshot_issues,
            env!("CARGO_PKG_VERSION"),
        )
    }
}

/// GET /metrics
///
/// Returns Prometheus-format metrics
pub async fn prometheus_metrics(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
) -> impl IntoResponse {
    let output = state.metrics.get_metrics().render();

    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        output,
    )
}

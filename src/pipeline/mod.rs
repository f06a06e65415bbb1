//! Issue analytics pipeline
//!
//! raw document -> ingest -> enrich -> filter -> aggregate -> report.
//! Every stage is a pure function of its inputs; the evaluation instant is
//! passed in rather than read from the clock.

pub mod aggregate;
pub mod enrich;
pub mod filter;
pub mod ingest;
pub mod report;
pub mod stats;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::models::{ClientLookup, Selection};

pub use ingest::Ingested;
pub use report::{DashboardReport, ReportStatus};

/// Run enrichment, filtering, aggregation and reporting over one snapshot.
pub fn run_pipeline(
    snapshot: &Ingested,
    lookup: &ClientLookup,
    selection: &Selection,
    now: DateTime<Utc>,
) -> DashboardReport {
    let enriched = enrich::enrich(&snapshot.records, lookup, now);
    let skipped = snapshot.malformed + enriched.skipped;
    if skipped > 0 {
        warn!(
            skipped = skipped,
            malformed = snapshot.malformed,
            bad_dates = enriched.skipped,
            "Skipped records while building report"
        );
    }

    let filtered = filter::filter(&enriched.issues, selection);
    debug!(
        snapshot = enriched.issues.len(),
        selected = filtered.len(),
        "Applied client selection"
    );

    DashboardReport::assemble(&enriched.issues, &filtered, skipped, selection, now)
}

/// Build a report from a fetch outcome.
///
/// `DataUnavailable` becomes an empty report carrying the reason; any other
/// error is returned to the caller.
pub fn report_for(
    snapshot: Result<Arc<Ingested>>,
    lookup: &ClientLookup,
    selection: &Selection,
    now: DateTime<Utc>,
) -> Result<DashboardReport> {
    match snapshot {
        Ok(snapshot) => Ok(run_pipeline(&snapshot, lookup, selection, now)),
        Err(AppError::DataUnavailable(reason)) => {
            warn!(reason = %reason, "Issue data unavailable, returning empty report");
            Ok(DashboardReport::unavailable(reason, selection, now))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::models::{Issue, IssueStatus, ResolutionBucket};

    pub fn issue(
        id: i64,
        module: &str,
        client: &str,
        host: Option<i64>,
        status: IssueStatus,
        days_open: i64,
    ) -> Issue {
        let evaluated = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let resolution_time_days = status.is_resolved().then_some(days_open as f64);
        Issue {
            id,
            module_name: module.to_string(),
            reported_by: "reporter".to_string(),
            reported_date: evaluated - Duration::days(days_open),
            status,
            assigned_to: None,
            comments: String::new(),
            host,
            user_id: None,
            github_issue_link: None,
            reported_page: None,
            days_open,
            is_assigned: false,
            client: client.to_string(),
            resolution_time_days,
            resolution_category: resolution_time_days.map(ResolutionBucket::for_days),
        }
    }

    pub fn resolved_on(id: i64, reported: &str, days: i64) -> Issue {
        let mut issue = issue(id, "Fees", "hhrd", Some(5), IssueStatus::Resolved, days);
        issue.reported_date = reported.parse::<DateTime<Utc>>().unwrap();
        issue
    }
}

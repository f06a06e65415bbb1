//! Enrichment stage - derived fields per issue

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::{
    ClientLookup, Issue, IssueStatus, ReportedIssue, ResolutionBucket, StatusInput,
};

/// Issues that survived enrichment plus the number skipped for bad dates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enriched {
    pub issues: Vec<Issue>,
    pub skipped: usize,
}

const OFFSET_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Enrich every record against one evaluation instant.
pub fn enrich(records: &[ReportedIssue], lookup: &ClientLookup, now: DateTime<Utc>) -> Enriched {
    let mut enriched = Enriched {
        issues: Vec::with_capacity(records.len()),
        skipped: 0,
    };

    for record in records {
        match enrich_record(record, lookup, now) {
            Ok(issue) => enriched.issues.push(issue),
            Err(e) => {
                debug!(id = record.id, error = %e, "Skipping issue during enrichment");
                enriched.skipped += 1;
            }
        }
    }

    enriched
}

pub fn enrich_record(
    record: &ReportedIssue,
    lookup: &ClientLookup,
    now: DateTime<Utc>,
) -> Result<Issue> {
    let reported_date = parse_timestamp(&record.reported_date).ok_or_else(|| {
        AppError::malformed(
            record.id.to_string(),
            format!("unparseable reported_date {:?}", record.reported_date),
        )
    })?;

    let is_assigned = record.assigned_to.as_deref().is_some_and(|a| !a.trim().is_empty());
    let status = normalize_status(record.status, is_assigned);
    let days_open = days_open(reported_date, now);
    let resolution_time_days = status.is_resolved().then_some(days_open as f64);

    Ok(Issue {
        id: record.id,
        module_name: record.module_name.clone(),
        reported_by: record.reported_by.clone(),
        reported_date,
        status,
        assigned_to: record.assigned_to.clone(),
        comments: record.comments.clone(),
        host: record.host.id(),
        user_id: record.user_id.clone(),
        github_issue_link: record.github_issue_link.clone(),
        reported_page: record.reported_page.clone(),
        days_open,
        is_assigned,
        client: lookup.label(record.host),
        resolution_time_days,
        resolution_category: resolution_time_days.map(ResolutionBucket::for_days),
    })
}

/// Map either status schema onto the canonical enum.
///
/// Legacy records only say resolved or not; an unresolved legacy record
/// with an assignee counts as in progress, otherwise unassigned.
pub fn normalize_status(input: StatusInput, is_assigned: bool) -> IssueStatus {
    match input {
        StatusInput::Canonical(status) => status,
        StatusInput::Legacy { resolved: true } => IssueStatus::Resolved,
        StatusInput::Legacy { resolved: false } if is_assigned => IssueStatus::InProgress,
        StatusInput::Legacy { resolved: false } => IssueStatus::Unassigned,
    }
}

/// Whole days elapsed; reports dated after `now` clamp to zero.
pub fn days_open(reported: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - reported).num_days().max(0)
}

/// Parse the timestamp formats the tracker has been seen to emit.
///
/// Timestamps without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(raw, format) {
            return Some(ts.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

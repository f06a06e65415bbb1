//! Ingestion adapter - turns the report document into typed records

use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::{HostRef, IssueDocument, IssueStatus, RawIssue, ReportedIssue, StatusInput};

/// Records accepted from one document plus the number rejected
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub records: Vec<ReportedIssue>,
    /// Records that could not be typed (bad id, missing date, no status)
    pub malformed: usize,
}

/// Parse a whole report document.
///
/// Fails with `DataUnavailable` only when the top level is unreadable;
/// bad records are counted in [`Ingested::malformed`] instead.
pub fn parse_document(body: &[u8]) -> Result<Ingested> {
    let document: IssueDocument = serde_json::from_slice(body)?;
    Ok(ingest_records(document.issues))
}

/// Type each record independently so one bad record never poisons the batch.
pub fn ingest_records(values: Vec<Value>) -> Ingested {
    let mut ingested = Ingested {
        records: Vec::with_capacity(values.len()),
        malformed: 0,
    };

    for (index, value) in values.into_iter().enumerate() {
        match ingest_record(value) {
            Ok(record) => ingested.records.push(record),
            Err(e) => {
                debug!(index = index, error = %e, "Skipping malformed record");
                ingested.malformed += 1;
            }
        }
    }

    ingested
}

fn ingest_record(value: Value) -> Result<ReportedIssue> {
    let raw: RawIssue =
        serde_json::from_value(value).map_err(|e| AppError::malformed("?", e.to_string()))?;

    let id = raw.id.as_ref().and_then(integer_value).ok_or_else(|| {
        AppError::malformed(format!("{:?}", raw.id), "missing or non-integer id")
    })?;

    let reported_date = non_blank(text_field(id, "reported_date", raw.reported_date))
        .ok_or_else(|| AppError::malformed(id.to_string(), "missing reported_date"))?;

    let status = text_field(id, "status", raw.status);
    let resolved = flag_field(id, "resolved", raw.resolved);
    let status = status_input(status.as_deref(), resolved).ok_or_else(|| {
        AppError::malformed(id.to_string(), "no recognised status or resolved flag")
    })?;

    let host = match raw.host {
        None | Some(Value::Null) => HostRef::Absent,
        Some(value) => match integer_value(&value) {
            Some(host) => HostRef::Id(host),
            None => {
                debug!(id = id, host = %value, "Unreadable host id");
                HostRef::Invalid
            }
        },
    };

    Ok(ReportedIssue {
        id,
        module_name: text_field(id, "module_name", raw.module_name).unwrap_or_default(),
        reported_by: text_field(id, "reported_by", raw.reported_by).unwrap_or_default(),
        reported_date,
        status,
        assigned_to: non_blank(text_field(id, "assigned_to", raw.assigned_to)),
        comments: text_field(id, "comments", raw.comments).unwrap_or_default(),
        host,
        user_id: extract_user_id(raw.additional_data.as_ref()),
        github_issue_link: non_blank(text_field(id, "github_issue_link", raw.github_issue_link)),
        reported_page: non_blank(text_field(id, "reported_page", raw.reported_page)),
    })
}

/// Optional text value. Numbers are kept as their decimal text, other
/// shapes degrade to `None`.
fn text_field(id: i64, field: &'static str, value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        other => {
            debug!(id = id, field = field, value = %other, "Ignoring non-text field");
            None
        }
    }
}

fn flag_field(id: i64, field: &'static str, value: Option<Value>) -> Option<bool> {
    match value? {
        Value::Null => None,
        Value::Bool(flag) => Some(flag),
        other => {
            debug!(id = id, field = field, value = %other, "Ignoring non-boolean field");
            None
        }
    }
}

/// Decide which status schema a record uses.
///
/// A recognised `status` wins over the legacy `resolved` flag.
fn status_input(status: Option<&str>, resolved: Option<bool>) -> Option<StatusInput> {
    match status.and_then(IssueStatus::parse) {
        Some(status) => Some(StatusInput::Canonical(status)),
        None => resolved.map(|resolved| StatusInput::Legacy { resolved }),
    }
}

/// `additional_data` arrives either as an encoded JSON string or inline.
fn extract_user_id(data: Option<&Value>) -> Option<String> {
    let decoded;
    let object = match data? {
        Value::String(text) => {
            decoded = serde_json::from_str::<Value>(text).ok()?;
            &decoded
        }
        other => other,
    };

    match object.get("user_id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

//! Core domain models for issue analytics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Label for issues that carry no host id
pub const LOCALHOST_LABEL: &str = "localhost";
/// Label for host ids missing from the lookup table
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Canonical status of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    /// Fixed and closed
    Resolved,
    /// Somebody owns it and is working on it
    InProgress,
    /// Nobody owns it yet
    Unassigned,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 3] = [
        IssueStatus::Resolved,
        IssueStatus::InProgress,
        IssueStatus::Unassigned,
    ];

    /// Parse the three-valued status carried by current records.
    ///
    /// Accepts the common spellings of "in progress"; anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "resolved" => Some(IssueStatus::Resolved),
            "inprogress" | "in_progress" | "in progress" | "in-progress" => {
                Some(IssueStatus::InProgress)
            }
            "unassigned" => Some(IssueStatus::Unassigned),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Resolved => "resolved",
            IssueStatus::InProgress => "inprogress",
            IssueStatus::Unassigned => "unassigned",
        }
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        matches!(self, IssueStatus::Resolved)
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a record expressed its status before normalization.
///
/// Older payloads only carry a boolean `resolved` flag, newer ones a
/// three-valued `status`. Enrichment turns either into an [`IssueStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusInput {
    Canonical(IssueStatus),
    Legacy { resolved: bool },
}

/// Raw record exactly as it appears in the report document.
///
/// Fields are kept as untyped JSON so a wrong-typed optional value never
/// rejects the whole record; the ingestion adapter decides which values
/// are required and how the rest degrade.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawIssue {
    pub id: Option<serde_json::Value>,
    pub module_name: Option<serde_json::Value>,
    pub reported_by: Option<serde_json::Value>,
    pub reported_date: Option<serde_json::Value>,
    pub status: Option<serde_json::Value>,
    pub resolved: Option<serde_json::Value>,
    pub assigned_to: Option<serde_json::Value>,
    pub comments: Option<serde_json::Value>,
    pub host: Option<serde_json::Value>,
    pub additional_data: Option<serde_json::Value>,
    pub github_issue_link: Option<serde_json::Value>,
    pub reported_page: Option<serde_json::Value>,
}

/// Top-level report document
#[derive(Debug, Clone, Deserialize)]
pub struct IssueDocument {
    pub issues: Vec<serde_json::Value>,
}

/// Host reference carried by a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostRef {
    /// Null or missing
    #[default]
    Absent,
    Id(i64),
    /// Present but not an integer host id
    Invalid,
}

impl HostRef {
    pub fn id(&self) -> Option<i64> {
        match self {
            HostRef::Id(id) => Some(*id),
            HostRef::Absent | HostRef::Invalid => None,
        }
    }
}

/// A strictly typed record produced by the ingestion adapter
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedIssue {
    pub id: i64,
    pub module_name: String,
    pub reported_by: String,
    /// Unparsed timestamp; enrichment parses it
    pub reported_date: String,
    pub status: StatusInput,
    pub assigned_to: Option<String>,
    pub comments: String,
    pub host: HostRef,
    pub user_id: Option<String>,
    pub github_issue_link: Option<String>,
    pub reported_page: Option<String>,
}

/// An enriched issue, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub id: i64,
    pub module_name: String,
    pub reported_by: String,
    pub reported_date: DateTime<Utc>,
    pub status: IssueStatus,
    pub assigned_to: Option<String>,
    pub comments: String,
    pub host: Option<i64>,
    pub user_id: Option<String>,
    pub github_issue_link: Option<String>,
    pub reported_page: Option<String>,
    /// Whole days between `reported_date` and evaluation time
    pub days_open: i64,
    pub is_assigned: bool,
    /// Client (school) label resolved from `host`
    pub client: String,
    /// Present iff `status` is resolved
    pub resolution_time_days: Option<f64>,
    pub resolution_category: Option<ResolutionBucket>,
}

/// Fixed half-open resolution-time bins, in days
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResolutionBucket {
    UnderOneDay,
    OneToThreeDays,
    ThreeToSevenDays,
    OneToTwoWeeks,
    TwoToFourWeeks,
    OneToTwoMonths,
    OverTwoMonths,
}

impl ResolutionBucket {
    pub const ALL: [ResolutionBucket; 7] = [
        ResolutionBucket::UnderOneDay,
        ResolutionBucket::OneToThreeDays,
        ResolutionBucket::ThreeToSevenDays,
        ResolutionBucket::OneToTwoWeeks,
        ResolutionBucket::TwoToFourWeeks,
        ResolutionBucket::OneToTwoMonths,
        ResolutionBucket::OverTwoMonths,
    ];

    /// Bin a resolution time. Negative values land in the first bin.
    pub fn for_days(days: f64) -> Self {
        if days < 1.0 {
            ResolutionBucket::UnderOneDay
        } else if days < 3.0 {
            ResolutionBucket::OneToThreeDays
        } else if days < 7.0 {
            ResolutionBucket::ThreeToSevenDays
        } else if days < 14.0 {
            ResolutionBucket::OneToTwoWeeks
        } else if days < 30.0 {
            ResolutionBucket::TwoToFourWeeks
        } else if days < 60.0 {
            ResolutionBucket::OneToTwoMonths
        } else {
            ResolutionBucket::OverTwoMonths
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResolutionBucket::UnderOneDay => "<1 day",
            ResolutionBucket::OneToThreeDays => "1-3 days",
            ResolutionBucket::ThreeToSevenDays => "3-7 days",
            ResolutionBucket::OneToTwoWeeks => "1-2 weeks",
            ResolutionBucket::TwoToFourWeeks => "2-4 weeks",
            ResolutionBucket::OneToTwoMonths => "1-2 months",
            ResolutionBucket::OverTwoMonths => ">2 months",
        }
    }
}

impl Serialize for ResolutionBucket {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Host id to client (school) name mapping.
///
/// Loaded from configuration; JSON object keys are the host ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientLookup {
    clients: BTreeMap<i64, String>,
}

impl ClientLookup {
    pub fn new(clients: BTreeMap<i64, String>) -> Self {
        Self { clients }
    }

    /// Resolve the label for a host. Never fails: null hosts are
    /// `localhost`, unmapped or unreadable ones are `Unknown`.
    pub fn label(&self, host: HostRef) -> String {
        match host {
            HostRef::Absent => LOCALHOST_LABEL.to_string(),
            HostRef::Id(id) => self
                .clients
                .get(&id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
            HostRef::Invalid => UNKNOWN_LABEL.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl FromIterator<(i64, String)> for ClientLookup {
    fn from_iter<I: IntoIterator<Item = (i64, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Which clients a report is restricted to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum Selection {
    /// No restriction
    #[default]
    All,
    /// Keep issues whose client label is in the set; an empty set keeps nothing
    Clients(BTreeSet<String>),
    /// Keep issues whose host id is in the set; null hosts never match
    Hosts(BTreeSet<i64>),
}

impl Selection {
    pub fn clients<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Clients(labels.into_iter().map(Into::into).collect())
    }

    pub fn hosts<I: IntoIterator<Item = i64>>(hosts: I) -> Self {
        Selection::Hosts(hosts.into_iter().collect())
    }

    /// Whether an issue belongs to this selection
    pub fn matches(&self, issue: &Issue) -> bool {
        match self {
            Selection::All => true,
            Selection::Clients(labels) => labels.contains(&issue.client),
            Selection::Hosts(hosts) => issue.host.is_some_and(|h| hosts.contains(&h)),
        }
    }
}

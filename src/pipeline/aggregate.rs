//! Aggregation engine - KPIs, grouped summaries and resolution-time statistics
//!
//! All groupings go through `BTreeMap` so output order only depends on the
//! input set, never on hashing.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::stats::{self, pct, round1};
use crate::models::{Issue, IssueStatus, ResolutionBucket};

/// Rows shown in the oldest-unresolved table
pub const OLDEST_UNRESOLVED_LIMIT: usize = 10;
/// Bins in the unresolved age histogram
pub const AGE_HISTOGRAM_BINS: usize = 20;

/// Headline counts over the filtered set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total: usize,
    pub resolved: usize,
    pub inprogress: usize,
    pub unassigned: usize,
    pub assigned: usize,
    /// Mean `days_open` of non-resolved issues, 0 when there are none
    pub avg_days_open_unresolved: f64,
}

impl Kpis {
    pub fn from_issues(issues: &[&Issue]) -> Self {
        let tally = StatusCounts::from_issues(issues.iter().copied());
        let unresolved: Vec<f64> = issues
            .iter()
            .filter(|issue| !issue.status.is_resolved())
            .map(|issue| issue.days_open as f64)
            .collect();

        Self {
            total: tally.total,
            resolved: tally.resolved,
            inprogress: tally.inprogress,
            unassigned: tally.unassigned,
            assigned: tally.assigned,
            avg_days_open_unresolved: round1(stats::mean(&unresolved)),
        }
    }

    /// Count for one status value
    pub fn status_count(&self, status: IssueStatus) -> usize {
        match status {
            IssueStatus::Resolved => self.resolved,
            IssueStatus::InProgress => self.inprogress,
            IssueStatus::Unassigned => self.unassigned,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct StatusCounts {
    total: usize,
    resolved: usize,
    inprogress: usize,
    unassigned: usize,
    assigned: usize,
    days_open_sum: i64,
}

impl StatusCounts {
    fn from_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            counts.total += 1;
            counts.days_open_sum += issue.days_open;
            if issue.is_assigned {
                counts.assigned += 1;
            }
            match issue.status {
                IssueStatus::Resolved => counts.resolved += 1,
                IssueStatus::InProgress => counts.inprogress += 1,
                IssueStatus::Unassigned => counts.unassigned += 1,
            }
        }
        counts
    }
}

/// Per-group status breakdown used by the module and client tables
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupTally {
    pub total: usize,
    pub resolved: usize,
    pub inprogress: usize,
    pub unassigned: usize,
    pub assigned: usize,
    pub avg_days_open: f64,
    /// `resolved / total * 100`, one decimal
    pub resolution_rate: f64,
}

impl GroupTally {
    pub fn from_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        let counts = StatusCounts::from_issues(issues);
        let avg_days_open = if counts.total == 0 {
            0.0
        } else {
            round1(counts.days_open_sum as f64 / counts.total as f64)
        };

        Self {
            total: counts.total,
            resolved: counts.resolved,
            inprogress: counts.inprogress,
            unassigned: counts.unassigned,
            assigned: counts.assigned,
            avg_days_open,
            resolution_rate: pct(counts.resolved, counts.total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleSummary {
    pub module_name: String,
    #[serde(flatten)]
    pub tally: GroupTally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSummary {
    pub client: String,
    #[serde(flatten)]
    pub tally: GroupTally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientModuleSummary {
    pub client: String,
    pub module_name: String,
    #[serde(flatten)]
    pub tally: GroupTally,
}

/// Issue count per module, largest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleCount {
    pub module_name: String,
    pub count: usize,
}

/// Distribution of resolution times in days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

impl ResolutionStats {
    /// `None` for an empty group, so "not applicable" stays distinguishable from 0.
    pub fn from_days(days: &[f64]) -> Option<Self> {
        if days.is_empty() {
            return None;
        }

        let min = days.iter().copied().fold(f64::INFINITY, f64::min);
        let max = days.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            count: days.len(),
            mean: round1(stats::mean(days)),
            median: round1(stats::median(days)),
            p90: round1(stats::percentile(days, 90.0)),
            min: round1(min),
            max: round1(max),
            std_dev: round1(stats::std_dev(days)),
        })
    }
}

/// Resolution statistics for one module or client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionStats {
    pub label: String,
    #[serde(flatten)]
    pub stats: ResolutionStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketCount {
    pub label: ResolutionBucket,
    pub count: usize,
    /// Share of resolved issues in this bucket
    pub percentage: f64,
}

/// Mean resolution time for issues reported in one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// `YYYY-MM`
    pub month: String,
    pub mean_resolution_days: f64,
    pub count: usize,
}

/// Unresolved issues whose age falls in `[from_days, to_days)`; the last
/// bin also includes its upper edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub from_days: f64,
    pub to_days: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionBreakdown {
    pub global: Option<ResolutionStats>,
    /// Fastest module first
    pub by_module: Vec<DimensionStats>,
    /// Fastest client first
    pub by_client: Vec<DimensionStats>,
    pub distribution: Vec<BucketCount>,
    pub monthly_trend: Vec<TrendPoint>,
}

/// Everything the engine computes over one filtered set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregates {
    pub kpis: Kpis,
    pub modules: Vec<ModuleSummary>,
    pub module_counts: Vec<ModuleCount>,
    pub clients: Vec<ClientSummary>,
    pub client_modules: Vec<ClientModuleSummary>,
    pub resolution: ResolutionBreakdown,
    pub unresolved_age_histogram: Vec<HistogramBin>,
    pub oldest_unresolved: Vec<Issue>,
}

pub fn aggregate(issues: &[&Issue]) -> Aggregates {
    let modules = summarize_modules(issues);
    let module_counts = count_modules(&modules);

    Aggregates {
        kpis: Kpis::from_issues(issues),
        modules,
        module_counts,
        clients: summarize_clients(issues),
        client_modules: summarize_client_modules(issues),
        resolution: resolution_breakdown(issues),
        unresolved_age_histogram: unresolved_age_histogram(issues),
        oldest_unresolved: oldest_unresolved(issues, OLDEST_UNRESOLVED_LIMIT),
    }
}

fn group_by<'a, K, F>(issues: &[&'a Issue], key: F) -> BTreeMap<K, Vec<&'a Issue>>
where
    K: Ord,
    F: Fn(&'a Issue) -> K,
{
    let mut groups: BTreeMap<K, Vec<&'a Issue>> = BTreeMap::new();
    for &issue in issues {
        groups.entry(key(issue)).or_default().push(issue);
    }
    groups
}

pub fn summarize_modules(issues: &[&Issue]) -> Vec<ModuleSummary> {
    group_by(issues, |issue| issue.module_name.as_str())
        .into_iter()
        .map(|(module_name, group)| ModuleSummary {
            module_name: module_name.to_string(),
            tally: GroupTally::from_issues(group),
        })
        .collect()
}

pub fn summarize_clients(issues: &[&Issue]) -> Vec<ClientSummary> {
    group_by(issues, |issue| issue.client.as_str())
        .into_iter()
        .map(|(client, group)| ClientSummary {
            client: client.to_string(),
            tally: GroupTally::from_issues(group),
        })
        .collect()
}

pub fn summarize_client_modules(issues: &[&Issue]) -> Vec<ClientModuleSummary> {
    group_by(issues, |issue| (issue.client.as_str(), issue.module_name.as_str()))
        .into_iter()
        .map(|((client, module_name), group)| ClientModuleSummary {
            client: client.to_string(),
            module_name: module_name.to_string(),
            tally: GroupTally::from_issues(group),
        })
        .collect()
}

fn count_modules(modules: &[ModuleSummary]) -> Vec<ModuleCount> {
    let mut counts: Vec<ModuleCount> = modules
        .iter()
        .map(|m| ModuleCount {
            module_name: m.module_name.clone(),
            count: m.tally.total,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.module_name.cmp(&b.module_name)));
    counts
}

pub fn resolution_breakdown(issues: &[&Issue]) -> ResolutionBreakdown {
    let resolved: Vec<&Issue> = issues
        .iter()
        .copied()
        .filter(|issue| issue.resolution_time_days.is_some())
        .collect();
    let days = resolution_days(&resolved);

    ResolutionBreakdown {
        global: ResolutionStats::from_days(&days),
        by_module: rank_by_mean(group_by(&resolved, |issue| issue.module_name.as_str())),
        by_client: rank_by_mean(group_by(&resolved, |issue| issue.client.as_str())),
        distribution: bucket_distribution(&days),
        monthly_trend: monthly_trend(&resolved),
    }
}

fn resolution_days(issues: &[&Issue]) -> Vec<f64> {
    issues.iter().filter_map(|issue| issue.resolution_time_days).collect()
}

fn rank_by_mean(groups: BTreeMap<&str, Vec<&Issue>>) -> Vec<DimensionStats> {
    let mut ranked: Vec<DimensionStats> = groups
        .into_iter()
        .filter_map(|(label, group)| {
            ResolutionStats::from_days(&resolution_days(&group)).map(|stats| DimensionStats {
                label: label.to_string(),
                stats,
            })
        })
        .collect();
    ranked.sort_by(|a, b| {
        a.stats
            .mean
            .total_cmp(&b.stats.mean)
            .then_with(|| a.label.cmp(&b.label))
    });
    ranked
}

/// Count per fixed bucket; every bucket is present even when empty.
pub fn bucket_distribution(days: &[f64]) -> Vec<BucketCount> {
    let mut counts: BTreeMap<ResolutionBucket, usize> = BTreeMap::new();
    for &d in days {
        *counts.entry(ResolutionBucket::for_days(d)).or_default() += 1;
    }

    ResolutionBucket::ALL
        .iter()
        .map(|&bucket| {
            let count = counts.get(&bucket).copied().unwrap_or(0);
            BucketCount {
                label: bucket,
                count,
                percentage: pct(count, days.len()),
            }
        })
        .collect()
}

pub fn monthly_trend(resolved: &[&Issue]) -> Vec<TrendPoint> {
    group_by(resolved, |issue| issue.reported_date.format("%Y-%m").to_string())
        .into_iter()
        .map(|(month, group)| {
            let days = resolution_days(&group);
            TrendPoint {
                month,
                mean_resolution_days: round1(stats::mean(&days)),
                count: days.len(),
            }
        })
        .collect()
}

/// Age histogram of unresolved issues: equal-width bins spanning the
/// youngest to the oldest age. A single distinct age gets a one-day range
/// centred on it.
pub fn unresolved_age_histogram(issues: &[&Issue]) -> Vec<HistogramBin> {
    let ages: Vec<f64> = issues
        .iter()
        .filter(|issue| !issue.status.is_resolved())
        .map(|issue| issue.days_open as f64)
        .collect();

    let (Some(min), Some(max)) = (
        ages.iter().copied().reduce(f64::min),
        ages.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };

    let (low, high) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
    let width = (high - low) / AGE_HISTOGRAM_BINS as f64;

    let mut histogram: Vec<HistogramBin> = (0..AGE_HISTOGRAM_BINS)
        .map(|i| HistogramBin {
            from_days: low + i as f64 * width,
            to_days: if i + 1 == AGE_HISTOGRAM_BINS {
                high
            } else {
                low + (i + 1) as f64 * width
            },
            count: 0,
        })
        .collect();

    for age in ages {
        let index = ((age - low) / width) as usize;
        histogram[index.min(AGE_HISTOGRAM_BINS - 1)].count += 1;
    }

    histogram
}

/// Non-resolved issues, oldest first; ties go to the lower id.
pub fn oldest_unresolved(issues: &[&Issue], limit: usize) -> Vec<Issue> {
    let mut unresolved: Vec<&Issue> = issues
        .iter()
        .copied()
        .filter(|issue| !issue.status.is_resolved())
        .collect();
    unresolved.sort_by(|a, b| match b.days_open.cmp(&a.days_open) {
        Ordering::Equal => a.id.cmp(&b.id),
        other => other,
    });
    unresolved.into_iter().take(limit).cloned().collect()
}

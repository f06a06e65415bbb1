//! Filter stage - restrict the working set to a client selection

use std::collections::BTreeSet;

use crate::models::{Issue, Selection};

/// Issues belonging to `selection`, borrowed from the enriched set.
///
/// `Selection::All` keeps everything; an explicit empty selection keeps nothing.
pub fn filter<'a>(issues: &'a [Issue], selection: &Selection) -> Vec<&'a Issue> {
    match selection {
        Selection::All => issues.iter().collect(),
        _ => issues.iter().filter(|issue| selection.matches(issue)).collect(),
    }
}

/// Distinct client labels present in a snapshot, sorted.
pub fn available_clients(issues: &[Issue]) -> Vec<String> {
    issues
        .iter()
        .map(|issue| issue.client.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::issue;
    use crate::models::IssueStatus;

    fn sample() -> Vec<Issue> {
        vec![
            issue(1, "Fees", "hhrd", Some(5), IssueStatus::Resolved, 3),
            issue(2, "Fees", "oak", Some(6), IssueStatus::InProgress, 4),
            issue(3, "Exams", "localhost", None, IssueStatus::Unassigned, 1),
        ]
    }

    #[test]
    fn test_all_is_identity() {
        let issues = sample();
        let kept = filter(&issues, &Selection::All);
        assert_eq!(kept.len(), issues.len());
        assert!(kept.iter().zip(&issues).all(|(a, b)| *a == b));
    }

    #[test]
    fn test_explicit_empty_selection_keeps_nothing() {
        let issues = sample();
        assert!(filter(&issues, &Selection::Clients(BTreeSet::new())).is_empty());
    }

    #[test]
    fn test_client_selection() {
        let issues = sample();
        let kept = filter(&issues, &Selection::clients(["oak", "localhost"]));
        let ids: Vec<_> = kept.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_host_selection_never_matches_null_host() {
        let issues = sample();
        let kept = filter(&issues, &Selection::hosts([5]));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 1);
    }

    #[test]
    fn test_available_clients_sorted_distinct() {
        let issues = sample();
        assert_eq!(available_clients(&issues), vec!["hhrd", "localhost", "oak"]);
    }
}

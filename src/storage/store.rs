//! In-memory issue store.
//!
//! Append-only sequence of confirmed issues. Insertion order is detection
//! order; the only removal is `clear`.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::extraction::patterns::Category;
use crate::storage::models::Issue;

#[derive(Debug, Default)]
pub struct IssueStore {
    issues: RwLock<Vec<Issue>>,
}

impl IssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an issue, returning the new count.
    pub fn append(&self, issue: Issue) -> usize {
        let mut issues = self.issues.write();
        issues.push(issue);
        issues.len()
    }

    /// Issues in insertion order, filtered by category, then cut to the
    /// most recent `limit` when a positive limit is given.
    pub fn query(&self, limit: Option<usize>, category: Option<Category>) -> Vec<Issue> {
        let issues = self.issues.read();

        let mut matching: Vec<Issue> = issues
            .iter()
            .filter(|issue| category.map_or(true, |c| issue.category == c))
            .cloned()
            .collect();

        if let Some(limit) = limit.filter(|&l| l > 0) {
            if matching.len() > limit {
                matching.drain(..matching.len() - limit);
            }
        }

        matching
    }

    pub fn last(&self) -> Option<Issue> {
        self.issues.read().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.issues.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.read().is_empty()
    }

    /// Remove every issue, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let mut issues = self.issues.write();
        let dropped = issues.len();
        issues.clear();
        dropped
    }

    /// Issue count per category; categories without issues are omitted.
    pub fn counts_by_category(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for issue in self.issues.read().iter() {
            *counts.entry(issue.category).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::IssueMetadata;
    use chrono::Utc;

    fn issue(category: Category, fix: &str) -> Issue {
        Issue {
            category,
            log_snippet: format!("snippet for {}", fix),
            suggested_fix: fix.to_string(),
            details: String::new(),
            confidence: 50,
            detected_at: Utc::now(),
            metadata: IssueMetadata::empty(category),
        }
    }

    fn fixes(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.suggested_fix.as_str()).collect()
    }

    fn populated() -> IssueStore {
        let store = IssueStore::new();
        store.append(issue(Category::ScriptError, "one"));
        store.append(issue(Category::EntityUnavailable, "two"));
        store.append(issue(Category::ScriptError, "three"));
        store.append(issue(Category::GeneralError, "four"));
        store.append(issue(Category::ScriptError, "five"));
        store
    }

    #[test]
    fn test_limit_keeps_most_recent_in_order() {
        let store = populated();
        assert_eq!(fixes(&store.query(Some(2), None)), vec!["four", "five"]);
    }

    #[test]
    fn test_category_filter_preserves_order() {
        let store = populated();
        assert_eq!(
            fixes(&store.query(None, Some(Category::ScriptError))),
            vec!["one", "three", "five"]
        );
        assert_eq!(
            fixes(&store.query(Some(1), Some(Category::ScriptError))),
            vec!["five"]
        );
    }

    #[test]
    fn test_zero_or_large_limit_returns_everything() {
        let store = populated();
        assert_eq!(store.query(Some(0), None).len(), 5);
        assert_eq!(store.query(Some(50), None).len(), 5);
    }

    #[test]
    fn test_counts_and_clear() {
        let store = populated();
        let counts = store.counts_by_category();
        assert_eq!(counts.get(&Category::ScriptError), Some(&3));
        assert_eq!(counts.get(&Category::AutomationError), None);
        assert_eq!(store.last().map(|i| i.suggested_fix), Some("five".to_string()));

        assert_eq!(store.clear(), 5);
        assert!(store.is_empty());
        assert!(store.query(None, None).is_empty());
    }
}

//! Issue models.
//!
//! These models represent confirmed diagnoses and the context extracted
//! from the log snippet they were produced for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extraction::patterns::Category;

/// Context extracted from one log snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueMetadata {
    #[serde(rename = "issue_type")]
    pub category: Category,
    pub entities: Vec<String>,
    pub components: Vec<String>,
    pub services: Vec<String>,
}

impl IssueMetadata {
    pub fn empty(category: Category) -> Self {
        Self {
            category,
            entities: Vec::new(),
            components: Vec::new(),
            services: Vec::new(),
        }
    }
}

/// One confirmed diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "issue_type")]
    pub category: Category,
    /// Full context window the diagnosis was produced for.
    pub log_snippet: String,
    pub suggested_fix: String,
    pub details: String,
    /// Always within 0..=100.
    pub confidence: u8,
    pub detected_at: DateTime<Utc>,
    pub metadata: IssueMetadata,
}

impl Issue {
    /// Snippet shortened for display; `...` is appended only when cut.
    pub fn display_snippet(&self, max_chars: usize) -> String {
        let prefix = char_prefix(&self.log_snippet, max_chars);
        if prefix.len() < self.log_snippet.len() {
            format!("{}...", prefix)
        } else {
            prefix.to_string()
        }
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub(crate) fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

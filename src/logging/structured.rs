//! Structured logging utilities.
//!
//! Every message emitted inside a scan cycle is prefixed with the scan id,
//! and while candidates are analyzed also with their category and ordinal:
//! `[scan-1a2b3c4d script_error #2] ANALYSIS_REQUEST ...`.

use std::fmt;

use crate::extraction::patterns::Category;

/// Logging context for one scan cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub scan_id: String,
    pub category: Option<Category>,
    /// 1-based position of the candidate within its category.
    pub candidate: Option<usize>,
}

impl LogContext {
    pub fn new(scan_id: &str) -> Self {
        Self {
            scan_id: scan_id.to_string(),
            category: None,
            candidate: None,
        }
    }

    pub fn for_category(&self, category: Category) -> Self {
        Self {
            scan_id: self.scan_id.clone(),
            category: Some(category),
            candidate: None,
        }
    }

    pub fn for_candidate(&self, ordinal: usize) -> Self {
        Self {
            candidate: Some(ordinal),
            ..self.clone()
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.scan_id)?;
        if let Some(category) = self.category {
            write!(f, " {}", category)?;
        }
        if let Some(n) = self.candidate {
            write!(f, " #{}", n)?;
        }
        write!(f, "]")
    }
}

/// Install the process-wide logger.
///
/// Safe to call repeatedly; only the first call takes effect. `RUST_LOG`
/// overrides the default `info` filter.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

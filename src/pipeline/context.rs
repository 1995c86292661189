//! Scan context management.
//!
//! Provides the per-cycle context used for logging and timing.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::extraction::patterns::Category;
use crate::logging::structured::LogContext;

/// Context for one scan cycle.
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub scan_id: String,
    pub started_at: DateTime<Utc>,
}

impl ScanContext {
    pub fn new() -> Self {
        Self {
            scan_id: format!("scan-{}", &Uuid::new_v4().to_string()[..8]),
            started_at: Utc::now(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.scan_id)
    }

    /// Log context narrowed to one category.
    pub fn category_context(&self, category: Category) -> LogContext {
        self.log_context().for_category(category)
    }

    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}

impl Default for ScanContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_id_shape() {
        let ctx = ScanContext::new();
        assert!(ctx.scan_id.starts_with("scan-"));
        assert_eq!(ctx.scan_id.len(), "scan-".len() + 8);
        assert_ne!(ctx.scan_id, ScanContext::new().scan_id);
    }

    #[test]
    fn test_category_context() {
        let ctx = ScanContext::new();
        let log_ctx = ctx.category_context(Category::ScriptError);
        assert_eq!(
            log_ctx.to_string(),
            format!("[{} script_error]", ctx.scan_id)
        );
    }
}

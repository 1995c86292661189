//! Structured logging with scan context.
//!
//! Every log message emitted during a scan cycle carries the scan_id (and
//! the category being processed, when there is one) for easy correlation.

pub mod structured;

pub use structured::*;

//! Log Assistant Core - incremental log scanning with remote issue diagnosis
//!
//! This crate tails a Home Assistant log, classifies new entries into a
//! fixed set of issue categories, and asks a remote completion service for
//! a fix for a bounded number of candidates per cycle. The implementation
//! prioritizes:
//!
//! 1. **Resilience** - A failed cycle is logged and swallowed, never raised
//! 2. **Logging** - Every decision point logged with scan context
//! 3. **Bounded cost** - Per-category caps and a response cache limit remote calls
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `pipeline` - Scan cycle orchestrator, read cursor, notification sink
//! - `extraction` - Entry segmentation, category matching, metadata
//! - `analysis` - Prompting, completion client with retry, response cache
//! - `storage` - Issue models and the in-memory issue store
//! - `trigger` - Periodic scan scheduling on tokio
//! - `config` - JSON configuration
//! - `logging` - Structured logging with scan context
//!
//! With the `python` feature the crate builds as the `log_assistant_core`
//! extension module exposing a `LogAssistant` class.

pub mod analysis;
pub mod config;
pub mod error;
pub mod extraction;
pub mod logging;
pub mod pipeline;
pub mod storage;
pub mod trigger;

#[cfg(feature = "python")]
mod bindings;

pub use analysis::analyzer::RemoteAnalyzer;
pub use config::AssistantConfig;
pub use error::{CompletionError, ConfigError};
pub use extraction::patterns::Category;
pub use pipeline::engine::{ScanEngine, ScanOutcome, ScanReport, StoreSummary};
pub use storage::models::{Issue, IssueMetadata};
pub use trigger::PeriodicTrigger;

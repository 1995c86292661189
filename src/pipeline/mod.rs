//! Scan pipeline module.
//!
//! Incremental log reading, the scan cycle that coordinates extraction and
//! remote analysis, and the notification sink the cycle reports to.

pub mod context;
pub mod cursor;
pub mod engine;
pub mod notify;

pub use context::*;
pub use cursor::*;
pub use engine::*;
pub use notify::*;

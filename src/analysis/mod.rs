//! Remote analysis module.
//!
//! Prompt construction, the completion client with retry/backoff, response
//! repair and the bounded response cache.

pub mod analyzer;
pub mod cache;
pub mod client;
pub mod json_path;
pub mod prompt;
pub mod response;
pub mod retry;

pub use analyzer::*;
pub use cache::*;
pub use client::*;
pub use response::*;
pub use retry::*;

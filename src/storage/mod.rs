//! Storage module.
//!
//! Issue models and the in-memory issue store. Issues live only as long as
//! the process.

pub mod models;
pub mod store;

pub use models::*;
pub use store::*;

//! Issue extraction module.
//!
//! Segments log text, classifies entries into issue categories and pulls
//! contextual metadata out of the resulting snippets.

pub mod entries;
pub mod extractor;
pub mod metadata;
pub mod patterns;

pub use entries::*;
pub use extractor::*;
pub use metadata::*;
pub use patterns::*;

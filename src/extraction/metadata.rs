//! Metadata extraction from log snippets.
//!
//! Pulls entity ids, component/integration names and service ids out of a
//! snippet so the remote analyzer gets structured context next to the raw
//! text.

use lazy_static::lazy_static;
use regex::Regex;

use crate::extraction::patterns::Category;
use crate::storage::models::IssueMetadata;

lazy_static! {
    /// Dotted `domain.object` entity ids, e.g. `light.kitchen`. Must start
    /// at a word boundary so `Foo.bar` does not yield `oo.bar`.
    pub(crate) static ref ENTITY_ID_PATTERN: Regex = Regex::new(
        r"\b([a-z_]+\.[a-z0-9_]+)"
    ).unwrap();

    /// `component|integration|platform <name>`; only the name is kept.
    static ref COMPONENT_PATTERN: Regex = Regex::new(
        r"(?i)(component|integration|platform) ([a-z_]+)"
    ).unwrap();

    /// `service <domain.service>`.
    static ref SERVICE_PATTERN: Regex = Regex::new(
        r"(?i)service ([a-z_]+\.[a-z_]+)"
    ).unwrap();
}

/// Extract metadata from a snippet.
///
/// Each list is deduplicated, keeping first-seen order.
pub fn extract_metadata(snippet: &str, category: Category) -> IssueMetadata {
    let entities = dedup(ENTITY_ID_PATTERN.captures_iter(snippet).map(|c| c[1].to_string()));
    let components = dedup(COMPONENT_PATTERN.captures_iter(snippet).map(|c| c[2].to_string()));
    let services = dedup(SERVICE_PATTERN.captures_iter(snippet).map(|c| c[1].to_string()));

    log::debug!(
        "METADATA_EXTRACTED category={} entities={} components={} services={}",
        category,
        entities.len(),
        components.len(),
        services.len()
    );

    IssueMetadata {
        category,
        entities,
        components,
        services,
    }
}

fn dedup(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

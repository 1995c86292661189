//! Candidate extraction.
//!
//! Turns a chunk of new log text into per-category lists of context
//! windows worth sending for diagnosis:
//! 1. Segment the text into entries
//! 2. Match every category pattern against every entry (categories run in
//!    parallel over the same immutable entry list)
//! 3. Expand each match to a window of neighbouring entries
//! 4. Drop windows similar to one already accepted for the category

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::extraction::entries::split_entries;
use crate::extraction::patterns::Category;

/// Entries included before and after a matching entry.
pub const CONTEXT_RADIUS: usize = 2;

/// Candidates shorter than this compare by exact equality.
pub const SIMILARITY_MIN_LEN: usize = 20;

/// Character window `[start, end)` compared for longer candidates.
pub const SIMILARITY_WINDOW: (usize, usize) = (20, 100);

/// Category -> ordered, deduplicated candidate snippets.
///
/// Only categories with at least one candidate are present; iteration
/// follows category declaration order.
pub type CandidateMap = BTreeMap<Category, Vec<String>>;

/// Extract categorized candidates from raw log text.
pub fn extract_candidates(text: &str) -> CandidateMap {
    let entries = split_entries(text);

    log::debug!("ENTRIES_SEGMENTED count={}", entries.len());

    Category::ALL
        .par_iter()
        .map(|&category| (category, find_matching_entries(category, &entries)))
        .collect::<Vec<_>>()
        .into_iter()
        .filter(|(_, candidates)| !candidates.is_empty())
        .collect()
}

/// Collect deduplicated context windows for one category.
pub fn find_matching_entries(category: Category, entries: &[&str]) -> Vec<String> {
    let pattern = category.pattern();
    let mut accepted: Vec<String> = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        if !pattern.is_match(entry) {
            continue;
        }

        let window = context_window(entries, index);
        if !accepted.iter().any(|existing| is_similar(&window, existing)) {
            accepted.push(window);
        }
    }

    log::debug!(
        "CATEGORY_MATCHED category={} candidates={}",
        category,
        accepted.len()
    );

    accepted
}

/// The entry at `index` plus up to `CONTEXT_RADIUS` neighbours on each side.
fn context_window(entries: &[&str], index: usize) -> String {
    let start = index.saturating_sub(CONTEXT_RADIUS);
    let end = (index + CONTEXT_RADIUS + 1).min(entries.len());
    entries[start..end].join("\n")
}

/// Cheap fingerprint comparison between two candidates.
///
/// If either is shorter than `SIMILARITY_MIN_LEN` characters they must be
/// equal; otherwise only characters `[20, 100)` are compared.
pub fn is_similar(a: &str, b: &str) -> bool {
    if a.chars().count() < SIMILARITY_MIN_LEN || b.chars().count() < SIMILARITY_MIN_LEN {
        return a == b;
    }

    let (start, end) = SIMILARITY_WINDOW;
    a.chars()
        .skip(start)
        .take(end - start)
        .eq(b.chars().skip(start).take(end - start))
}

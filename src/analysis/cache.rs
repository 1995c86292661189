//! Response cache.
//!
//! Bounded in-memory store of diagnoses keyed by a cheap fingerprint of the
//! snippet, so recurring issues do not trigger repeated remote calls.
//! Eviction is pure FIFO: a hit does not refresh an entry, and entries
//! never expire by age.

use std::collections::{HashMap, VecDeque};

use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::response::Diagnosis;
use crate::extraction::metadata::ENTITY_ID_PATTERN;
use crate::extraction::patterns::Category;

/// Maximum number of cached diagnoses.
pub const CACHE_CAPACITY: usize = 50;

/// Error fragments contributing to a cache key.
const KEY_ERROR_FRAGMENTS: usize = 2;

/// Entity ids contributing to a cache key.
const KEY_ENTITY_IDS: usize = 3;

lazy_static! {
    /// Severity keyword opening an error fragment.
    static ref ERROR_FRAGMENT_PATTERN: Regex = Regex::new(
        r"(?i)(Error|Exception|Failed|WARNING|ERROR)[^\n]*"
    ).unwrap();
}

/// Derive the cache key for a snippet.
///
/// `category | first two severity keywords | first three entity ids`. The
/// keyword is taken as written in the log, so `Error` and `ERROR` differ.
pub fn cache_key(snippet: &str, category: Category) -> String {
    let mut parts = vec![category.as_str().to_string()];

    parts.extend(
        ERROR_FRAGMENT_PATTERN
            .captures_iter(snippet)
            .take(KEY_ERROR_FRAGMENTS)
            .map(|c| c[1].to_string()),
    );

    parts.extend(
        ENTITY_ID_PATTERN
            .captures_iter(snippet)
            .take(KEY_ENTITY_IDS)
            .map(|c| c[1].to_string()),
    );

    parts.join("|")
}

/// FIFO-bounded key -> diagnosis map.
#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<String, Diagnosis>,
    order: VecDeque<String>,
    capacity: usize,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::with_capacity(CACHE_CAPACITY)
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Diagnosis> {
        self.entries.get(key)
    }

    /// Insert a diagnosis, evicting the oldest entry when full.
    ///
    /// Re-inserting an existing key replaces its value in place without
    /// changing its position in the eviction order.
    pub fn put(&mut self, key: String, value: Diagnosis) {
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = value;
            return;
        }

        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                log::debug!("CACHE_EVICTED key={:?}", oldest);
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        log::info!("RESPONSE_CACHE_CLEARED");
    }
}

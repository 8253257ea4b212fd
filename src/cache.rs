//! Dataset Cache Module
//! Memoizes parsed reports keyed by their source content.

use crate::data::{parse_csv, Dataset};
use crate::error::Result;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use tracing::debug;

struct CacheEntry {
    content: Vec<u8>,
    dataset: Dataset,
}

/// Memoizes parsed reports by the content they were parsed from.
///
/// Keys are derived from the raw bytes, so a file that changes on disk or a
/// different upload is always parsed again. Owned by the caller; nothing is
/// shared between caches.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<u64, Vec<CacheEntry>>,
    hits: usize,
    misses: usize,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the dataset previously parsed from identical bytes, or parse and remember it.
    ///
    /// Failed parses are not cached.
    pub fn get_or_parse(&mut self, content: Vec<u8>) -> Result<Dataset> {
        let key = content_key(&content);
        let bucket = self.entries.entry(key).or_default();

        if let Some(entry) = bucket.iter().find(|entry| entry.content == content) {
            self.hits += 1;
            debug!(key, "dataset cache hit");
            return Ok(entry.dataset.clone());
        }

        self.misses += 1;
        let dataset = parse_csv(content.clone())?;
        bucket.push(CacheEntry {
            content,
            dataset: dataset.clone(),
        });
        debug!(key, "dataset cache miss");
        Ok(dataset)
    }

    /// Number of distinct contents held.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    /// Drop every entry and reset the hit/miss counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

fn content_key(content: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

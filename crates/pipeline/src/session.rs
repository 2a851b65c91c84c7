//! Session-scoped result cache.
//!
//! Consensus results are expensive to recompute and stable for a given
//! (selected sources, selected file) pair, so the surrounding app keeps one
//! [`SessionCache`] per user session. The cache is explicitly owned and
//! explicitly invalidated: selection changes remove entries, and nothing is
//! shared between sessions or mutated behind the caller's back.

use std::collections::HashMap;

use concord_core::hashing::sha256_hex;

use crate::run::ConsensusOutcome;

/// Derive the cache key for a (media item, source selection) pair.
///
/// Source order does not affect identity (the same set of sources over the
/// same file is the same pass), so sources are sorted before hashing.
pub fn cache_key(data_hash: &str, source_hashes: &[String]) -> String {
    let mut sorted: Vec<&str> = source_hashes.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut material = String::from(data_hash);
    for source in sorted {
        material.push('\n');
        material.push_str(source);
    }
    sha256_hex(material.as_bytes())
}

/// Cache of completed consensus passes for one user session.
#[derive(Debug, Default)]
pub struct SessionCache {
    entries: HashMap<String, ConsensusOutcome>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a completed pass by cache key.
    pub fn get(&self, key: &str) -> Option<&ConsensusOutcome> {
        self.entries.get(key)
    }

    /// Store a completed pass, replacing any previous result for the key.
    pub fn insert(&mut self, key: String, outcome: ConsensusOutcome) {
        self.entries.insert(key, outcome);
    }

    /// Drop the entry for one selection. Returns whether it existed.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop everything, e.g. on project switch.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

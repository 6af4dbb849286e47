//! Shared per-horse history cache

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::models::PastResult;

/// Cache of full parsed histories keyed by horse id
///
/// Clones share the same storage, so one cache can be handed to several
/// providers and reset between requests with [`HistoryCache::clear`].
#[derive(Debug, Clone, Default)]
pub struct HistoryCache {
    entries: Arc<RwLock<HashMap<String, Vec<PastResult>>>>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// First `limit` cached results for a horse
    pub fn get(&self, horse_id: &str, limit: usize) -> Option<Vec<PastResult>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(horse_id)
            .map(|history| history.iter().take(limit).cloned().collect())
    }

    pub fn insert(&self, horse_id: &str, history: Vec<PastResult>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(horse_id.to_string(), history);
    }

    pub fn contains(&self, horse_id: &str) -> bool {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.contains_key(horse_id)
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Number of cached horses
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! In-memory history provider

use async_trait::async_trait;

use super::{HistoryCache, HistoryError, HistoryProvider};
use crate::models::PastResult;

/// Provider answering from a preloaded cache
///
/// Unknown horses have no history rather than an error.
#[derive(Debug, Clone, Default)]
pub struct StaticHistory {
    cache: HistoryCache,
}

impl StaticHistory {
    pub fn new(cache: HistoryCache) -> Self {
        Self { cache }
    }

    pub fn insert(&self, horse_id: &str, history: Vec<PastResult>) {
        self.cache.insert(horse_id, history);
    }
}

#[async_trait]
impl HistoryProvider for StaticHistory {
    async fn recent_results(&self, horse_id: &str, limit: usize) -> Result<Vec<PastResult>, HistoryError> {
        Ok(self.cache.get(horse_id, limit).unwrap_or_default())
    }
}

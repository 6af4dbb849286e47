//! Past race history for entrants
//!
//! History retrieval sits behind [`HistoryProvider`] so the form model
//! only ever sees [`PastResult`] records, never scraping heuristics.
//! Providers share an explicit [`HistoryCache`] passed in at
//! construction.
//!
//! # Example
//!
//! ```no_run
//! use keiba::history::{attach_history, HistoryCache, NetkeibaHistory, HistoryClientConfig};
//! use keiba::Entrant;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = HistoryCache::new();
//!     let provider = NetkeibaHistory::new(HistoryClientConfig::default(), cache.clone())?;
//!
//!     let mut entrants = vec![Entrant { horse_id: "2019104308".into(), odds_win: 3.2, ..Default::default() }];
//!     attach_history(&mut entrants, &provider, 5).await;
//!     println!("{} past results", entrants[0].race_history.len());
//!
//!     cache.clear();
//!     Ok(())
//! }
//! ```

mod cache;
mod memory;

#[cfg(feature = "scraper")]
mod client;
#[cfg(feature = "scraper")]
mod parser;

pub use cache::HistoryCache;
pub use memory::StaticHistory;

#[cfg(feature = "scraper")]
pub use client::{HistoryClientConfig, NetkeibaHistory};
#[cfg(feature = "scraper")]
pub use parser::{parse_history, ColumnIndex, HistoryParser};

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::models::{Entrant, PastResult};

/// Number of past results fetched per entrant
pub const HISTORY_RACES: usize = 5;

/// History retrieval errors
#[derive(Debug, Error)]
pub enum HistoryError {
    #[cfg(feature = "scraper")]
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Failed to parse HTML: {0}")]
    ParseError(String),

    #[error("No results table found")]
    NoResultsTable,

    #[error("Failed to fetch {url} after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },
}

/// Source of per-horse race history, most recent first
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn recent_results(&self, horse_id: &str, limit: usize) -> Result<Vec<PastResult>, HistoryError>;
}

/// Fill `race_history` for every entrant with a horse id
///
/// A provider failure leaves that entrant's history empty, which the form
/// model treats as neutral. Returns the number of entrants that received
/// history.
pub async fn attach_history(entrants: &mut [Entrant], provider: &dyn HistoryProvider, limit: usize) -> usize {
    let mut attached = 0;

    for entrant in entrants.iter_mut() {
        if entrant.horse_id.is_empty() {
            continue;
        }

        match provider.recent_results(&entrant.horse_id, limit).await {
            Ok(history) => {
                if !history.is_empty() {
                    attached += 1;
                }
                entrant.race_history = history;
            }
            Err(e) => {
                warn!("No history for horse {}: {}", entrant.horse_id, e);
                entrant.race_history.clear();
            }
        }
    }

    attached
}

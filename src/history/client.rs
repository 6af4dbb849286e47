//! HTTP client with rate limiting for db.netkeiba.com horse pages

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use encoding_rs::EUC_JP;
use tokio::sync::Mutex;

use super::parser::HistoryParser;
use super::{HistoryCache, HistoryError, HistoryProvider};
use crate::models::PastResult;

/// Base URL for horse pages
const BASE_URL_HORSE: &str = "https://db.netkeiba.com/horse";

/// History client configuration
#[derive(Debug, Clone)]
pub struct HistoryClientConfig {
    /// Delay between requests in milliseconds
    pub delay_ms: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Max retry attempts
    pub max_retries: u32,
    /// User agent string
    pub user_agent: String,
    pub base_url: String,
}

impl Default for HistoryClientConfig {
    fn default() -> Self {
        Self {
            delay_ms: 250,
            timeout_secs: 15,
            max_retries: 3,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            base_url: BASE_URL_HORSE.to_string(),
        }
    }
}

/// Horse history scraper with rate limiting and a shared cache
pub struct NetkeibaHistory {
    client: reqwest::Client,
    config: HistoryClientConfig,
    parser: HistoryParser,
    cache: HistoryCache,
    last_request: Arc<Mutex<Instant>>,
}

impl NetkeibaHistory {
    /// Create a new client with the given configuration and cache
    pub fn new(config: HistoryClientConfig, cache: HistoryCache) -> Result<Self, HistoryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        let last_request = Instant::now()
            .checked_sub(Duration::from_secs(10))
            .unwrap_or_else(Instant::now);

        Ok(Self {
            client,
            config,
            parser: HistoryParser::new()?,
            cache,
            last_request: Arc::new(Mutex::new(last_request)),
        })
    }

    pub fn cache(&self) -> &HistoryCache {
        &self.cache
    }

    /// Wait for rate limit
    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        let delay = Duration::from_millis(self.config.delay_ms);

        if elapsed < delay {
            tokio::time::sleep(delay - elapsed).await;
        }

        *last = Instant::now();
    }

    /// Build URL for a horse page
    fn build_url(&self, horse_id: &str) -> String {
        format!("{}/{}/", self.config.base_url.trim_end_matches('/'), horse_id)
    }

    /// Fetch and decode an EUC-JP page with rate limiting and retry
    async fn fetch_page(&self, url: &str) -> Result<String, HistoryError> {
        for attempt in 0..self.config.max_retries {
            self.wait_for_rate_limit().await;

            match self.client.get(url).header("Referer", "https://db.netkeiba.com/").send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        let bytes = response.bytes().await?;
                        let (text, _, had_errors) = EUC_JP.decode(&bytes);
                        if had_errors {
                            tracing::debug!("Lossy EUC-JP decode for {}", url);
                        }
                        return Ok(text.into_owned());
                    }
                    tracing::warn!(
                        "Request failed with status {} (attempt {}/{})",
                        response.status(),
                        attempt + 1,
                        self.config.max_retries
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}",
                        attempt + 1,
                        self.config.max_retries,
                        e
                    );
                }
            }

            if attempt + 1 < self.config.max_retries {
                let backoff = Duration::from_millis(self.config.delay_ms * (attempt as u64 + 1));
                tokio::time::sleep(backoff).await;
            }
        }

        Err(HistoryError::RetriesExhausted {
            url: url.to_string(),
            attempts: self.config.max_retries,
        })
    }
}

#[async_trait]
impl HistoryProvider for NetkeibaHistory {
    async fn recent_results(&self, horse_id: &str, limit: usize) -> Result<Vec<PastResult>, HistoryError> {
        if horse_id.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(cached) = self.cache.get(horse_id, limit) {
            return Ok(cached);
        }

        let url = self.build_url(horse_id);
        tracing::info!("Fetching history: {}", url);

        let html = self.fetch_page(&url).await?;
        let history = self.parser.parse(&html)?;
        let recent = history.iter().take(limit).cloned().collect();

        self.cache.insert(horse_id, history);
        Ok(recent)
    }
}

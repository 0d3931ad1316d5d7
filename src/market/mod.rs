pub mod cache;
pub mod client;

pub use cache::ReadingCache;
pub use client::MarketClient;

use anyhow::Result;
use log::{debug, warn};
use std::env;
use std::time::Duration;

use crate::valuation::MarketReading;
use crate::valuation::config::parse_or;

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_BLOCKCHAIN_INFO_URL: &str = "https://api.blockchain.info";

/// Seconds before an upstream request is abandoned.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Seconds a fetched reading is reused.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub coingecko_url: String,
    pub blockchain_info_url: String,
    pub http_timeout_secs: u64,
    pub cache_ttl_secs: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            coingecko_url: DEFAULT_COINGECKO_URL.to_string(),
            blockchain_info_url: DEFAULT_BLOCKCHAIN_INFO_URL.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl MarketConfig {
    /// `COINGECKO_URL`, `BLOCKCHAIN_INFO_URL`, `HTTP_TIMEOUT_SECS`, `CACHE_TTL_SECS`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(url) = env::var("COINGECKO_URL") {
            cfg.coingecko_url = url;
        }
        if let Ok(url) = env::var("BLOCKCHAIN_INFO_URL") {
            cfg.blockchain_info_url = url;
        }
        if let Ok(raw) = env::var("HTTP_TIMEOUT_SECS") {
            cfg.http_timeout_secs = parse_or("HTTP_TIMEOUT_SECS", &raw, cfg.http_timeout_secs);
        }
        if let Ok(raw) = env::var("CACHE_TTL_SECS") {
            cfg.cache_ttl_secs = parse_or("CACHE_TTL_SECS", &raw, cfg.cache_ttl_secs);
        }
        cfg
    }
}

/// Client plus TTL cache: what the handlers call on each refresh.
pub struct MarketFeed {
    client: MarketClient,
    cache: ReadingCache,
}

impl MarketFeed {
    pub fn new(config: &MarketConfig) -> Result<Self> {
        Ok(Self {
            client: MarketClient::new(config)?,
            cache: ReadingCache::new(Duration::from_secs(config.cache_ttl_secs)),
        })
    }

    /// Feed whose cache already holds `reading`, so no request goes out
    /// until the TTL runs out.
    #[cfg(test)]
    pub fn seeded(config: &MarketConfig, reading: MarketReading) -> Result<Self> {
        let feed = Self::new(config)?;
        feed.cache.put(reading);
        Ok(feed)
    }

    pub async fn reading(&self) -> Result<MarketReading> {
        if let Some(reading) = self.cache.get() {
            debug!("CACHE hit price={} emitted={}", reading.price_usd, reading.emitted_supply_btc);
            return Ok(reading);
        }
        match self.client.fetch_reading().await {
            Ok(reading) => {
                self.cache.put(reading);
                Ok(reading)
            }
            Err(e) => {
                warn!("market fetch failed: {e:#}");
                Err(e)
            }
        }
    }
}

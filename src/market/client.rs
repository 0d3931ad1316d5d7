use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::MarketConfig;
use crate::valuation::{MarketReading, SATS_PER_BTC};

/// Pulls spot price and emitted supply from public APIs.
pub struct MarketClient {
    client: Client,
    coingecko_url: String,
    blockchain_info_url: String,
}

#[derive(Deserialize)]
struct SimplePrice {
    bitcoin: UsdQuote,
}

#[derive(Deserialize)]
struct UsdQuote {
    usd: f64,
}

impl MarketClient {
    pub fn new(config: &MarketConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            coingecko_url: config.coingecko_url.trim_end_matches('/').to_string(),
            blockchain_info_url: config.blockchain_info_url.trim_end_matches('/').to_string(),
        })
    }

    /// BTC/USD from CoinGecko's `simple/price`.
    pub async fn fetch_price_usd(&self) -> Result<f64> {
        let url = format!("{}/simple/price", self.coingecko_url);
        let body = self
            .get_text(&url, &[("ids", "bitcoin"), ("vs_currencies", "usd")])
            .await
            .context("Failed to fetch BTC price")?;
        let price = parse_simple_price(&body)?;
        debug!("PRICE usd={price}");
        Ok(price)
    }

    /// Total mined coins from blockchain.info's `q/totalbc` (satoshis).
    pub async fn fetch_emitted_supply(&self) -> Result<f64> {
        let url = format!("{}/q/totalbc", self.blockchain_info_url);
        let body = self
            .get_text(&url, &[])
            .await
            .context("Failed to fetch emitted supply")?;
        let emitted = parse_total_bc(&body)?;
        debug!("SUPPLY emitted={emitted} BTC");
        Ok(emitted)
    }

    pub async fn fetch_reading(&self) -> Result<MarketReading> {
        let price_usd = self.fetch_price_usd().await?;
        let emitted_supply_btc = self.fetch_emitted_supply().await?;
        Ok(MarketReading {
            price_usd,
            emitted_supply_btc,
        })
    }

    async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let response = self.client.get(url).query(query).send().await?;
        if !response.status().is_success() {
            bail!("{url} returned status {}", response.status());
        }
        Ok(response.text().await?)
    }
}

/// `{"bitcoin":{"usd":<number>}}`
pub fn parse_simple_price(body: &str) -> Result<f64> {
    let parsed: SimplePrice =
        serde_json::from_str(body).context("Failed to parse CoinGecko price JSON")?;
    let usd = parsed.bitcoin.usd;
    if !usd.is_finite() || usd <= 0.0 {
        return Err(anyhow!("CoinGecko returned a non-positive price: {usd}"));
    }
    Ok(usd)
}

/// Plain integer satoshi count, converted to BTC.
pub fn parse_total_bc(body: &str) -> Result<f64> {
    let sats: u64 = body
        .trim()
        .parse()
        .with_context(|| format!("totalbc is not an integer: {:?}", body.trim()))?;
    Ok(sats as f64 / SATS_PER_BTC)
}

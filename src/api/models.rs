use crate::market::MarketFeed;
use crate::valuation::{
    MarketReading, MiningHorizon, NetworkSignals, SupplyDistribution, SupplyEstimate,
    SupplyValuationEngine,
};
use serde::{Deserialize, Serialize};

/// Shared application state: the valuation engine and the cached market feed.
pub struct AppState {
    pub engine: SupplyValuationEngine,
    pub feed: MarketFeed,
}

/* ---------- Supply API Models ---------- */

#[derive(Serialize)]
pub struct SupplyResponse {
    pub reading: MarketReading,
    pub supply: SupplyEstimate,
    pub consistent: bool,
    pub distribution: SupplyDistribution,
    /// (active_liquid, dormant, lost) as fractions, absent when a segment is negative
    pub shares: Option<[f64; 3]>,
    pub remaining_btc: f64,
}

#[derive(Serialize)]
pub struct HorizonResponse {
    pub reading: MarketReading,
    pub remaining_btc: f64,
    pub constant_reward: Option<MiningHorizon>,
    pub halving_schedule: Option<MiningHorizon>,
}

/* ---------- Valuation API Models ---------- */

#[derive(Deserialize)]
pub struct ComputeRequest {
    pub reading: MarketReading,
    #[serde(default)]
    pub signals: NetworkSignals,
    /// Overrides the day count derived from the current time.
    pub days_since_genesis: Option<f64>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::config::CompositeWeights;
use super::{Estimate, Unavailable};

/// The valuation models a caller can pick from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationModel {
    /// Market cap spread over the liquid supply.
    Ratio,
    StockToFlow,
    Metcalfe,
    /// Network value to transactions.
    Nvt,
    /// Power law over days since genesis.
    LogRegression,
    /// Weighted blend of stock-to-flow, Metcalfe, ratio and log-regression.
    Composite,
}

impl ValuationModel {
    pub const ALL: [ValuationModel; 6] = [
        ValuationModel::Ratio,
        ValuationModel::StockToFlow,
        ValuationModel::Metcalfe,
        ValuationModel::Nvt,
        ValuationModel::LogRegression,
        ValuationModel::Composite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValuationModel::Ratio => "ratio",
            ValuationModel::StockToFlow => "stock_to_flow",
            ValuationModel::Metcalfe => "metcalfe",
            ValuationModel::Nvt => "nvt",
            ValuationModel::LogRegression => "log_regression",
            ValuationModel::Composite => "composite",
        }
    }
}

impl fmt::Display for ValuationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValuationModel {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        ValuationModel::ALL
            .into_iter()
            .find(|m| m.as_str() == key)
            .ok_or("unknown valuation model")
    }
}

/// A USD fair-value figure tagged with the model that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TheoreticalPrice {
    pub model: ValuationModel,
    pub usd: f64,
}

/// Sub-model outputs fed into [`composite_valuation`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeInputs {
    pub stock_to_flow: f64,
    pub metcalfe: f64,
    pub liquidity_ratio: f64,
    pub log_regression: f64,
}

/// NaN and infinities are reported as [`Unavailable::NonFinite`].
pub fn finite(usd: f64) -> Estimate<f64> {
    if usd.is_finite() {
        Ok(usd)
    } else {
        Err(Unavailable::NonFinite)
    }
}

pub fn market_cap(price: f64, circulating: f64) -> f64 {
    price * circulating
}

/// `price * supply / (supply - lost)`: the spot price if today's market
/// cap were carried only by coins that can still move.
pub fn theoretical_price_ratio(price: f64, supply: f64, lost: f64) -> Estimate<f64> {
    if supply <= lost {
        return Err(Unavailable::SupplyNotAboveLost);
    }
    finite(market_cap(price, supply) / (supply - lost))
}

/// `a * (supply / flow)^b` with `flow = block_reward * blocks_per_year`.
pub fn theoretical_price_stock_to_flow(
    supply: f64,
    block_reward: f64,
    blocks_per_year: f64,
    a: f64,
    b: f64,
) -> Estimate<f64> {
    let flow = block_reward * blocks_per_year;
    if flow == 0.0 {
        return Err(Unavailable::ZeroFlow);
    }
    let stock_to_flow_ratio = supply / flow;
    finite(a * stock_to_flow_ratio.powf(b))
}

/// `c * n^2` over active addresses.
pub fn theoretical_price_metcalfe(active_addresses: Option<f64>, c: f64) -> Estimate<f64> {
    match active_addresses {
        Some(n) if n > 0.0 => finite(c * n.powi(2)),
        _ => Err(Unavailable::NoActiveAddresses),
    }
}

/// Computed as `market_cap / (market_cap / on_chain_volume)`. The two steps
/// are kept as-is; they are not folded into `on_chain_volume`.
pub fn theoretical_price_nvt(market_cap: f64, on_chain_volume: f64) -> Estimate<f64> {
    if on_chain_volume == 0.0 {
        return Err(Unavailable::ZeroVolume);
    }
    let nvt = market_cap / on_chain_volume;
    if nvt == 0.0 {
        return Err(Unavailable::ZeroNvt);
    }
    finite(market_cap / nvt)
}

/// `exp(k * ln(days) + c)`.
pub fn log_regression_model(days_since_epoch: f64, k: f64, c: f64) -> Estimate<f64> {
    if days_since_epoch <= 0.0 {
        return Err(Unavailable::NonPositiveDays);
    }
    finite((k * days_since_epoch.ln() + c).exp())
}

/// Weighted sum of the four sub-model outputs. Weights are used as given;
/// they are expected (not forced) to sum to 1.0.
pub fn composite_valuation(weights: &CompositeWeights, outputs: &CompositeInputs) -> f64 {
    weights.stock_to_flow * outputs.stock_to_flow
        + weights.metcalfe * outputs.metcalfe
        + weights.liquidity_ratio * outputs.liquidity_ratio
        + weights.log_regression * outputs.log_regression
}

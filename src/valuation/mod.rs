pub mod config;
pub mod engine;
pub mod models;
pub mod supply;

pub use config::ValuationConfig;
pub use engine::{MarketReading, ModelOutput, NetworkSignals, SupplyValuationEngine};
pub use models::ValuationModel;
pub use supply::{MiningHorizon, SupplyDistribution, SupplyEstimate};

use serde::Serialize;

/// Hard cap on the number of coins that will ever exist.
pub const TOTAL_SUPPLY_BTC: f64 = 21_000_000.0;

/// Coins assumed permanently lost (burned keys, forgotten wallets).
pub const DEFAULT_LOST_ESTIMATE: f64 = 4_000_000.0;

/// Coins assumed inactive but still spendable.
pub const DEFAULT_DORMANT_ESTIMATE: f64 = 1_500_000.0;

/// Block subsidy treated as constant for the remaining horizon.
pub const DEFAULT_BLOCK_REWARD: f64 = 6.25;

/// Block subsidy at genesis, halved every `HALVING_INTERVAL_BLOCKS`.
pub const INITIAL_SUBSIDY_BTC: f64 = 50.0;

/// Target seconds between blocks.
pub const SECONDS_PER_BLOCK: f64 = 600.0;

/// 144 blocks/day * 365 days
pub const BLOCKS_PER_YEAR: f64 = 52_560.0;

/// Blocks between subsidy halvings.
pub const HALVING_INTERVAL_BLOCKS: f64 = 210_000.0;

/// Satoshis per BTC.
pub const SATS_PER_BTC: f64 = 100_000_000.0;

/// Stock-to-flow fit: price = a * sf^b
pub const S2F_A: f64 = 0.4;
pub const S2F_B: f64 = 3.3;

/// Metcalfe fit: price = c * n^2
pub const METCALFE_C: f64 = 1e-7;

/// Log-regression fit over days since genesis: price = exp(k * ln(days) + c)
pub const LOG_REG_K: f64 = 0.5;
pub const LOG_REG_C: f64 = 4.0;

/// Why a computation produced no number. Returned instead of NaN/inf or
/// sentinels so a caller can tell "zero" apart from "could not compute".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum Unavailable {
    #[error("supply does not exceed the lost-coin estimate")]
    SupplyNotAboveLost,
    #[error("annual flow is zero")]
    ZeroFlow,
    #[error("active address count is missing or not positive")]
    NoActiveAddresses,
    #[error("on-chain volume is missing or zero")]
    ZeroVolume,
    #[error("NVT ratio is zero")]
    ZeroNvt,
    #[error("days since genesis must be positive")]
    NonPositiveDays,
    #[error("block reward must be positive")]
    NonPositiveReward,
    #[error("block reward is below one satoshi")]
    SubSatoshiReward,
    #[error("halving interval must be positive")]
    NonPositiveInterval,
    #[error("horizon is outside the representable time range")]
    HorizonOutOfRange,
    #[error("a composite sub-model is unavailable")]
    MissingSubModel,
    #[error("result is not a finite number")]
    NonFinite,
}

/// Result of a model computation.
pub type Estimate<T> = Result<T, Unavailable>;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::ValuationConfig;
use super::models::{
    self, CompositeInputs, TheoreticalPrice, ValuationModel, composite_valuation, market_cap,
};
use super::supply::{
    self, MiningHorizon, SupplyDistribution, SupplyEstimate, days_since_genesis,
};
use super::{Estimate, INITIAL_SUBSIDY_BTC, Unavailable};

/// Spot readings fetched on each refresh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketReading {
    pub price_usd: f64,
    pub emitted_supply_btc: f64,
}

/// Optional network signals. Models needing an absent signal report
/// themselves unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSignals {
    pub active_addresses: Option<f64>,
    pub on_chain_volume_usd: Option<f64>,
    pub node_count: Option<u64>,
}

/// One model's result as exposed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutput {
    Available {
        model: ValuationModel,
        usd: f64,
    },
    Unavailable {
        model: ValuationModel,
        reason: Unavailable,
        message: String,
    },
}

impl ModelOutput {
    pub fn new(model: ValuationModel, estimate: Estimate<f64>) -> Self {
        match estimate.and_then(models::finite) {
            Ok(usd) => ModelOutput::Available { model, usd },
            Err(reason) => ModelOutput::Unavailable {
                model,
                reason,
                message: reason.to_string(),
            },
        }
    }

    pub fn model(&self) -> ValuationModel {
        match self {
            ModelOutput::Available { model, .. } | ModelOutput::Unavailable { model, .. } => *model,
        }
    }

    pub fn usd(&self) -> Option<f64> {
        match self {
            ModelOutput::Available { usd, .. } => Some(*usd),
            ModelOutput::Unavailable { .. } => None,
        }
    }
}

/// Everything derived from one refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationReport {
    pub generated_at: DateTime<Utc>,
    pub reading: MarketReading,
    pub signals: NetworkSignals,
    pub market_cap_usd: f64,
    pub days_since_genesis: f64,
    pub supply: SupplyEstimate,
    pub supply_consistent: bool,
    pub distribution: SupplyDistribution,
    pub remaining_btc: f64,
    /// `None` when the horizon cannot be computed (e.g. zero block reward).
    pub mining_horizon: Option<MiningHorizon>,
    pub models: Vec<ModelOutput>,
}

/// Stateless valuation over a fixed set of assumptions.
#[derive(Debug, Clone, Default)]
pub struct SupplyValuationEngine {
    config: ValuationConfig,
}

impl SupplyValuationEngine {
    pub fn new(config: ValuationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    pub fn supply(&self, emitted: f64) -> SupplyEstimate {
        let cfg = &self.config;
        supply::estimate_supply(emitted, cfg.lost_estimate, cfg.dormant_estimate, cfg.total_supply)
    }

    pub fn remaining(&self, emitted: f64) -> f64 {
        supply::remaining_supply(emitted, self.config.total_supply)
    }

    /// Constant-reward completion estimate.
    pub fn horizon(&self, emitted: f64, now: DateTime<Utc>) -> Estimate<MiningHorizon> {
        let cfg = &self.config;
        supply::mining_completion_estimate(
            emitted,
            cfg.block_reward,
            cfg.seconds_per_block,
            cfg.total_supply,
            now,
        )
    }

    /// Completion estimate following the 50 BTC halving schedule.
    pub fn halving_horizon(&self, emitted: f64, now: DateTime<Utc>) -> Estimate<MiningHorizon> {
        let cfg = &self.config;
        supply::mining_completion_with_halvings(
            emitted,
            INITIAL_SUBSIDY_BTC,
            cfg.halving_interval,
            cfg.seconds_per_block,
            cfg.total_supply,
            now,
        )
    }

    /// Run a single caller-selected model.
    pub fn price(
        &self,
        model: ValuationModel,
        reading: &MarketReading,
        signals: &NetworkSignals,
        days_since_genesis: f64,
    ) -> Estimate<TheoreticalPrice> {
        let cfg = &self.config;
        let supply = reading.emitted_supply_btc;
        let usd = match model {
            ValuationModel::Ratio => {
                models::theoretical_price_ratio(reading.price_usd, supply, cfg.lost_estimate)
            }
            ValuationModel::StockToFlow => models::theoretical_price_stock_to_flow(
                supply,
                cfg.block_reward,
                cfg.blocks_per_year,
                cfg.s2f_a,
                cfg.s2f_b,
            ),
            ValuationModel::Metcalfe => {
                models::theoretical_price_metcalfe(signals.active_addresses, cfg.metcalfe_c)
            }
            ValuationModel::Nvt => match signals.on_chain_volume_usd {
                Some(volume) => {
                    models::theoretical_price_nvt(market_cap(reading.price_usd, supply), volume)
                }
                None => Err(Unavailable::ZeroVolume),
            },
            ValuationModel::LogRegression => {
                models::log_regression_model(days_since_genesis, cfg.log_reg_k, cfg.log_reg_c)
            }
            ValuationModel::Composite => {
                let sub = |m| {
                    self.price(m, reading, signals, days_since_genesis)
                        .map(|p| p.usd)
                        .map_err(|_| Unavailable::MissingSubModel)
                };
                let inputs = CompositeInputs {
                    stock_to_flow: sub(ValuationModel::StockToFlow)?,
                    metcalfe: sub(ValuationModel::Metcalfe)?,
                    liquidity_ratio: sub(ValuationModel::Ratio)?,
                    log_regression: sub(ValuationModel::LogRegression)?,
                };
                Ok(composite_valuation(&cfg.weights, &inputs))
            }
        }?;
        Ok(TheoreticalPrice {
            model,
            usd: models::finite(usd)?,
        })
    }

    /// Full report with the day count taken from `now`.
    pub fn report(
        &self,
        reading: &MarketReading,
        signals: &NetworkSignals,
        now: DateTime<Utc>,
    ) -> ValuationReport {
        self.report_with_days(reading, signals, now, days_since_genesis(now))
    }

    pub fn report_with_days(
        &self,
        reading: &MarketReading,
        signals: &NetworkSignals,
        now: DateTime<Utc>,
        days: f64,
    ) -> ValuationReport {
        let emitted = reading.emitted_supply_btc;
        let supply = self.supply(emitted);
        let models = ValuationModel::ALL
            .into_iter()
            .map(|m| ModelOutput::new(m, self.price(m, reading, signals, days).map(|p| p.usd)))
            .collect();

        ValuationReport {
            generated_at: now,
            reading: *reading,
            signals: *signals,
            market_cap_usd: market_cap(reading.price_usd, emitted),
            days_since_genesis: days,
            supply,
            supply_consistent: supply.is_consistent(),
            distribution: supply.distribution(),
            remaining_btc: self.remaining(emitted),
            mining_horizon: self.horizon(emitted, now).ok(),
            models,
        }
    }
}

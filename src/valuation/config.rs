use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use super::{
    BLOCKS_PER_YEAR, DEFAULT_BLOCK_REWARD, DEFAULT_DORMANT_ESTIMATE, DEFAULT_LOST_ESTIMATE,
    HALVING_INTERVAL_BLOCKS, LOG_REG_C, LOG_REG_K, METCALFE_C, S2F_A, S2F_B, SECONDS_PER_BLOCK,
    TOTAL_SUPPLY_BTC,
};

/// Weights of the four sub-models blended by the composite valuation.
///
/// The composite does not renormalize: callers supplying their own weights
/// are expected to make them sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeWeights {
    pub stock_to_flow: f64,
    pub metcalfe: f64,
    pub liquidity_ratio: f64,
    pub log_regression: f64,
}

impl CompositeWeights {
    pub fn sum(&self) -> f64 {
        self.stock_to_flow + self.metcalfe + self.liquidity_ratio + self.log_regression
    }
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            stock_to_flow: 0.25,
            metcalfe: 0.25,
            liquidity_ratio: 0.30,
            log_regression: 0.20,
        }
    }
}

/// Assumptions and model constants used by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    pub total_supply: f64,
    pub lost_estimate: f64,
    pub dormant_estimate: f64,
    pub block_reward: f64,
    pub seconds_per_block: f64,
    pub blocks_per_year: f64,
    pub halving_interval: f64,
    pub s2f_a: f64,
    pub s2f_b: f64,
    pub metcalfe_c: f64,
    pub log_reg_k: f64,
    pub log_reg_c: f64,
    pub weights: CompositeWeights,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            total_supply: TOTAL_SUPPLY_BTC,
            lost_estimate: DEFAULT_LOST_ESTIMATE,
            dormant_estimate: DEFAULT_DORMANT_ESTIMATE,
            block_reward: DEFAULT_BLOCK_REWARD,
            seconds_per_block: SECONDS_PER_BLOCK,
            blocks_per_year: BLOCKS_PER_YEAR,
            halving_interval: HALVING_INTERVAL_BLOCKS,
            s2f_a: S2F_A,
            s2f_b: S2F_B,
            metcalfe_c: METCALFE_C,
            log_reg_k: LOG_REG_K,
            log_reg_c: LOG_REG_C,
            weights: CompositeWeights::default(),
        }
    }
}

impl ValuationConfig {
    /// Defaults overridden by any of `LOST_ESTIMATE`, `DORMANT_ESTIMATE`,
    /// `TOTAL_SUPPLY`, `BLOCK_REWARD`, `SECONDS_PER_BLOCK`, `BLOCKS_PER_YEAR`,
    /// `HALVING_INTERVAL`, `S2F_A`, `S2F_B`, `METCALFE_C`, `LOG_REG_K`,
    /// `LOG_REG_C` and the `WEIGHT_*` composite weights that are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let fields: [(&str, &mut f64); 16] = [
            ("TOTAL_SUPPLY", &mut cfg.total_supply),
            ("LOST_ESTIMATE", &mut cfg.lost_estimate),
            ("DORMANT_ESTIMATE", &mut cfg.dormant_estimate),
            ("BLOCK_REWARD", &mut cfg.block_reward),
            ("SECONDS_PER_BLOCK", &mut cfg.seconds_per_block),
            ("BLOCKS_PER_YEAR", &mut cfg.blocks_per_year),
            ("HALVING_INTERVAL", &mut cfg.halving_interval),
            ("S2F_A", &mut cfg.s2f_a),
            ("S2F_B", &mut cfg.s2f_b),
            ("METCALFE_C", &mut cfg.metcalfe_c),
            ("LOG_REG_K", &mut cfg.log_reg_k),
            ("LOG_REG_C", &mut cfg.log_reg_c),
            ("WEIGHT_STOCK_TO_FLOW", &mut cfg.weights.stock_to_flow),
            ("WEIGHT_METCALFE", &mut cfg.weights.metcalfe),
            ("WEIGHT_LIQUIDITY_RATIO", &mut cfg.weights.liquidity_ratio),
            ("WEIGHT_LOG_REGRESSION", &mut cfg.weights.log_regression),
        ];
        for (key, slot) in fields {
            if let Some(raw) = lookup(key) {
                *slot = parse_or(key, &raw, *slot);
            }
        }
        cfg
    }
}

/// Parse an env override, keeping `fallback` (and warning) when it is malformed.
pub fn parse_or<T>(key: &str, raw: &str, fallback: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!("ignoring {key}={raw:?}: not a number, using {fallback}");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_weights_sum_to_one() {
        let w = CompositeWeights::default();
        assert!((w.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn lookup_overrides_only_set_keys() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("LOST_ESTIMATE", "3000000"), ("S2F_B", " 3.0 ")]);
        let cfg = ValuationConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.lost_estimate, 3_000_000.0);
        assert_eq!(cfg.s2f_b, 3.0);
        assert_eq!(cfg.dormant_estimate, DEFAULT_DORMANT_ESTIMATE);
        assert_eq!(cfg.block_reward, DEFAULT_BLOCK_REWARD);
    }

    #[test]
    fn weights_from_lookup_are_not_renormalized() {
        let cfg = ValuationConfig::from_lookup(|k| (k == "WEIGHT_METCALFE").then(|| "0.5".into()));
        assert_eq!(cfg.weights.metcalfe, 0.5);
        assert!((cfg.weights.sum() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn malformed_override_keeps_default() {
        let cfg = ValuationConfig::from_lookup(|k| (k == "BLOCK_REWARD").then(|| "lots".into()));
        assert_eq!(cfg.block_reward, DEFAULT_BLOCK_REWARD);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: ValuationConfig = serde_json::from_str(r#"{"lost_estimate": 1.0}"#).unwrap();
        assert_eq!(cfg.lost_estimate, 1.0);
        assert_eq!(cfg.total_supply, TOTAL_SUPPLY_BTC);
        assert_eq!(cfg.weights, CompositeWeights::default());
    }
}

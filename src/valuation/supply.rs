use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::{Estimate, Unavailable};

/// Unix timestamp of the genesis block (2009-01-03 18:15:05 UTC).
pub const GENESIS_TIMESTAMP: i64 = 1_231_006_505;

/// Subsidies below one satoshi round to zero on chain.
const MIN_REWARD_BTC: f64 = 1e-8;

/// Partition of the emitted supply under the lost/dormant assumptions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SupplyEstimate {
    pub total_theoretical: f64,
    pub circulating: f64,
    pub liquid: f64,
    pub lost: f64,
    pub dormant: f64,
}

impl SupplyEstimate {
    /// `0 <= liquid <= circulating <= total_theoretical`. A `false` here means
    /// the reading or the assumptions are off, not that the math failed.
    pub fn is_consistent(&self) -> bool {
        0.0 <= self.liquid
            && self.liquid <= self.circulating
            && self.circulating <= self.total_theoretical
    }

    /// Segments shown on the supply pie chart.
    pub fn distribution(&self) -> SupplyDistribution {
        SupplyDistribution {
            active_liquid: self.liquid - self.dormant,
            dormant: self.dormant,
            lost: self.lost,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SupplyDistribution {
    pub active_liquid: f64,
    pub dormant: f64,
    pub lost: f64,
}

impl SupplyDistribution {
    /// Fraction of the segment total held by each of (active_liquid, dormant, lost).
    /// `None` when any segment is negative or all are zero.
    pub fn shares(&self) -> Option<[f64; 3]> {
        let parts = [self.active_liquid, self.dormant, self.lost];
        if parts.iter().any(|p| *p < 0.0) {
            return None;
        }
        let total: f64 = parts.iter().sum();
        if total <= 0.0 {
            return None;
        }
        Some(parts.map(|p| p / total))
    }
}

/// Time left until the last coin is mined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MiningHorizon {
    pub remaining_btc: f64,
    pub remaining_blocks: f64,
    pub estimated_completion: DateTime<Utc>,
    pub halving_aware: bool,
}

/// Split `emitted` into liquid/lost/dormant. No clamping: if `lost_estimate`
/// exceeds `emitted`, `liquid` comes out negative.
pub fn estimate_supply(
    emitted: f64,
    lost_estimate: f64,
    dormant_estimate: f64,
    total_supply: f64,
) -> SupplyEstimate {
    SupplyEstimate {
        total_theoretical: total_supply,
        circulating: emitted,
        liquid: emitted - lost_estimate,
        lost: lost_estimate,
        dormant: dormant_estimate,
    }
}

/// Coins left to mine. Negative when `emitted` is above the cap.
pub fn remaining_supply(emitted: f64, total_supply: f64) -> f64 {
    total_supply - emitted
}

/// Completion time assuming `block_reward` never halves again.
pub fn mining_completion_estimate(
    emitted: f64,
    block_reward: f64,
    seconds_per_block: f64,
    total_supply: f64,
    now: DateTime<Utc>,
) -> Estimate<MiningHorizon> {
    if block_reward <= 0.0 {
        return Err(Unavailable::NonPositiveReward);
    }
    let remaining_btc = remaining_supply(emitted, total_supply);
    let remaining_blocks = remaining_btc / block_reward;
    Ok(MiningHorizon {
        remaining_btc,
        remaining_blocks,
        estimated_completion: offset(now, remaining_blocks * seconds_per_block)?,
        halving_aware: false,
    })
}

/// Completion time following the halving schedule that starts at
/// `initial_reward`. The position inside the current epoch is derived from
/// `emitted`; the walk stops once `total_supply` is reached or the subsidy
/// drops below one satoshi.
pub fn mining_completion_with_halvings(
    emitted: f64,
    initial_reward: f64,
    halving_interval: f64,
    seconds_per_block: f64,
    total_supply: f64,
    now: DateTime<Utc>,
) -> Estimate<MiningHorizon> {
    if initial_reward <= 0.0 {
        return Err(Unavailable::NonPositiveReward);
    }
    if initial_reward < MIN_REWARD_BTC {
        return Err(Unavailable::SubSatoshiReward);
    }
    if halving_interval <= 0.0 {
        return Err(Unavailable::NonPositiveInterval);
    }
    let remaining_btc = remaining_supply(emitted, total_supply);

    // Find the epoch `emitted` falls into.
    let mut reward = initial_reward;
    let mut epoch_floor = 0.0;
    while reward >= MIN_REWARD_BTC && emitted >= epoch_floor + reward * halving_interval {
        epoch_floor += reward * halving_interval;
        reward /= 2.0;
    }

    let mut left = remaining_btc;
    let mut remaining_blocks = 0.0;
    let mut epoch_blocks_left = halving_interval - (emitted - epoch_floor).max(0.0) / reward;
    while reward >= MIN_REWARD_BTC && left > 0.0 {
        let epoch_issue = epoch_blocks_left * reward;
        if epoch_issue >= left {
            remaining_blocks += left / reward;
            break;
        }
        remaining_blocks += epoch_blocks_left;
        left -= epoch_issue;
        reward /= 2.0;
        epoch_blocks_left = halving_interval;
    }

    Ok(MiningHorizon {
        remaining_btc,
        remaining_blocks,
        estimated_completion: offset(now, remaining_blocks * seconds_per_block)?,
        halving_aware: true,
    })
}

/// Fractional days elapsed since the genesis block.
pub fn days_since_genesis(now: DateTime<Utc>) -> f64 {
    (now.timestamp() - GENESIS_TIMESTAMP) as f64 / 86_400.0
}

fn offset(now: DateTime<Utc>, seconds: f64) -> Estimate<DateTime<Utc>> {
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return Err(Unavailable::HorizonOutOfRange);
    }
    Duration::try_milliseconds(millis as i64)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or(Unavailable::HorizonOutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::{
        DEFAULT_BLOCK_REWARD, DEFAULT_DORMANT_ESTIMATE, DEFAULT_LOST_ESTIMATE,
        HALVING_INTERVAL_BLOCKS, SECONDS_PER_BLOCK, TOTAL_SUPPLY_BTC,
    };
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn flat(emitted: f64, reward: f64, now: DateTime<Utc>) -> Estimate<MiningHorizon> {
        mining_completion_estimate(emitted, reward, SECONDS_PER_BLOCK, TOTAL_SUPPLY_BTC, now)
    }

    fn supply(emitted: f64, lost: f64) -> SupplyEstimate {
        estimate_supply(emitted, lost, DEFAULT_DORMANT_ESTIMATE, TOTAL_SUPPLY_BTC)
    }

    #[test]
    fn reference_reading() {
        let s = supply(19_600_000.0, 4_000_000.0);
        assert_eq!(s.liquid, 15_600_000.0);
        assert_eq!(s.lost, 4_000_000.0);
        assert_eq!(s.dormant, 1_500_000.0);
        assert_eq!(s.total_theoretical, 21_000_000.0);
        assert!(s.is_consistent());
    }

    #[test]
    fn lost_above_emitted_goes_negative() {
        let s = supply(1_000_000.0, 4_000_000.0);
        assert_eq!(s.liquid, -3_000_000.0);
        assert!(!s.is_consistent());
        assert!(s.distribution().shares().is_none());
    }

    #[test]
    fn over_cap_reading_is_inconsistent() {
        assert!(!supply(21_500_000.0, DEFAULT_LOST_ESTIMATE).is_consistent());
    }

    #[test]
    fn distribution_segments() {
        let d = supply(19_600_000.0, 4_000_000.0).distribution();
        assert_eq!(d.active_liquid, 14_100_000.0);
        assert_eq!(d.dormant, 1_500_000.0);
        assert_eq!(d.lost, 4_000_000.0);
        let shares = d.shares().unwrap();
        assert!((shares.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((shares[2] - 4.0 / 19.6).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn circulating_is_emitted(emitted in 0.0f64..30_000_000.0) {
            prop_assert_eq!(supply(emitted, DEFAULT_LOST_ESTIMATE).circulating, emitted);
        }

        #[test]
        fn liquid_is_emitted_minus_lost(
            lost in 0.0f64..10_000_000.0,
            extra in 0.001f64..20_000_000.0,
        ) {
            let emitted = lost + extra;
            let s = supply(emitted, lost);
            prop_assert_eq!(s.liquid, emitted - lost);
            prop_assert!(s.liquid >= 0.0);
        }

        #[test]
        fn remaining_plus_emitted_is_total(emitted in 0.0f64..30_000_000.0) {
            let remaining = remaining_supply(emitted, TOTAL_SUPPLY_BTC);
            prop_assert!((remaining + emitted - TOTAL_SUPPLY_BTC).abs() < 1e-6);
        }
    }

    #[test]
    fn remaining_has_no_floor() {
        assert_eq!(remaining_supply(19_600_000.0, TOTAL_SUPPLY_BTC), 1_400_000.0);
        assert_eq!(remaining_supply(21_000_000.0, TOTAL_SUPPLY_BTC), 0.0);
        assert_eq!(remaining_supply(21_000_001.0, TOTAL_SUPPLY_BTC), -1.0);
    }

    #[test]
    fn full_supply_completes_now() {
        let now = fixed_now();
        let h = flat(21_000_000.0, DEFAULT_BLOCK_REWARD, now).unwrap();
        assert_eq!(h.estimated_completion, now);
        assert_eq!(h.remaining_blocks, 0.0);
    }

    #[test]
    fn constant_reward_horizon() {
        let now = fixed_now();
        let h = flat(19_600_000.0, DEFAULT_BLOCK_REWARD, now).unwrap();
        // 1.4M / 6.25 = 224_000 blocks * 600 s
        assert_eq!(h.remaining_blocks, 224_000.0);
        assert_eq!(h.estimated_completion - now, Duration::seconds(134_400_000));
        assert!(!h.halving_aware);
    }

    #[test]
    fn zero_reward_is_unavailable() {
        assert_eq!(flat(19_600_000.0, 0.0, fixed_now()), Err(Unavailable::NonPositiveReward));
    }

    #[test]
    fn tiny_reward_overflows_range() {
        assert_eq!(flat(0.0, 1e-300, fixed_now()), Err(Unavailable::HorizonOutOfRange));
    }

    #[test]
    fn halving_schedule_runs_longer_than_constant_reward() {
        let now = fixed_now();
        let emitted = 19_600_000.0;
        let constant = flat(emitted, DEFAULT_BLOCK_REWARD, now).unwrap();
        let halving = mining_completion_with_halvings(
            emitted,
            50.0,
            HALVING_INTERVAL_BLOCKS,
            SECONDS_PER_BLOCK,
            TOTAL_SUPPLY_BTC,
            now,
        )
        .unwrap();
        assert!(halving.halving_aware);
        assert!(halving.remaining_blocks > constant.remaining_blocks);
        // The schedule ends before ~33 epochs have passed since genesis.
        assert!(halving.remaining_blocks < 33.0 * HALVING_INTERVAL_BLOCKS);
    }

    #[test]
    fn halving_inside_first_epoch() {
        // 100 BTC emitted at 50 BTC/block, cap reached within the epoch.
        let h =
            mining_completion_with_halvings(100.0, 50.0, 10.0, 1.0, 300.0, fixed_now()).unwrap();
        assert_eq!(h.remaining_blocks, 4.0);
        assert_eq!(h.remaining_btc, 200.0);
    }

    #[test]
    fn halving_crosses_epochs() {
        // Epoch 0: 10 blocks * 50 = 500, epoch 1: 10 * 25 = 250.
        // From 400 emitted to 650: 2 blocks at 50 + 6 blocks at 25.
        let h =
            mining_completion_with_halvings(400.0, 50.0, 10.0, 1.0, 650.0, fixed_now()).unwrap();
        assert_eq!(h.remaining_blocks, 8.0);
    }

    #[test]
    fn halving_rejects_bad_schedule() {
        let now = fixed_now();
        assert_eq!(
            mining_completion_with_halvings(1.0, 0.0, 10.0, 1.0, 21.0, now),
            Err(Unavailable::NonPositiveReward)
        );
        assert_eq!(
            mining_completion_with_halvings(1.0, 50.0, 0.0, 1.0, 21.0, now),
            Err(Unavailable::NonPositiveInterval)
        );
        assert_eq!(
            mining_completion_with_halvings(1.0, 1e-9, 10.0, 1.0, 21.0, now),
            Err(Unavailable::SubSatoshiReward)
        );
    }

    #[test]
    fn genesis_day_count() {
        let genesis = DateTime::from_timestamp(GENESIS_TIMESTAMP, 0).unwrap();
        assert_eq!(days_since_genesis(genesis), 0.0);
        assert_eq!(days_since_genesis(genesis + Duration::days(5000)), 5000.0);
    }
}

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::valuation::MarketReading;

/// Last reading, reused until it is older than the TTL.
pub struct ReadingCache {
    ttl: Duration,
    slot: Mutex<Option<(Instant, MarketReading)>>,
}

impl ReadingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Option<MarketReading> {
        self.get_at(Instant::now())
    }

    pub fn put(&self, reading: MarketReading) {
        self.put_at(reading, Instant::now());
    }

    fn get_at(&self, now: Instant) -> Option<MarketReading> {
        let slot = self.slot.lock().expect("mutex poisoned");
        match *slot {
            Some((stored, reading)) if now.saturating_duration_since(stored) < self.ttl => {
                Some(reading)
            }
            _ => None,
        }
    }

    fn put_at(&self, reading: MarketReading, now: Instant) {
        let mut slot = self.slot.lock().expect("mutex poisoned");
        *slot = Some((now, reading));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(price: f64) -> MarketReading {
        MarketReading {
            price_usd: price,
            emitted_supply_btc: 19_600_000.0,
        }
    }

    #[test]
    fn empty_cache_misses() {
        assert!(ReadingCache::new(Duration::from_secs(60)).get().is_none());
    }

    #[test]
    fn hit_within_ttl_miss_after() {
        let cache = ReadingCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.put_at(reading(1.0), t0);
        assert_eq!(cache.get_at(t0 + Duration::from_secs(59)), Some(reading(1.0)));
        assert_eq!(cache.get_at(t0 + Duration::from_secs(60)), None);
    }

    #[test]
    fn put_replaces_previous() {
        let cache = ReadingCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.put_at(reading(1.0), t0);
        cache.put_at(reading(2.0), t0);
        assert_eq!(cache.get_at(t0), Some(reading(2.0)));
    }

    #[test]
    fn zero_ttl_never_hits() {
        let cache = ReadingCache::new(Duration::ZERO);
        cache.put(reading(1.0));
        assert!(cache.get().is_none());
    }
}

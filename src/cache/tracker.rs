//! Hit Tracker Module
//!
//! Windowed per-key hit counting for rule-driven eviction.

use std::hash::Hash;
use std::time::Duration;

use crate::cache::PassiveExpiringCache;

// == Hit Tracker ==
/// Counts hits per key over a rolling time window.
///
/// Built on [`PassiveExpiringCache`] semantics: the "value" is the hit count
/// and the "expiry" is the current window's deadline. A window that has
/// passed its deadline is stale; the next touch resets the count and pushes
/// the deadline out by one interval. Callers never see a stale count.
#[derive(Debug)]
pub struct HitTracker<K> {
    /// Per-key windowed counts; the entry deadline is the window deadline
    windows: PassiveExpiringCache<K, u32>,
    /// Window length, fixed at construction
    interval: Duration,
}

impl<K> HitTracker<K>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates a tracker whose windows are `interval` long.
    pub fn new(interval: Duration) -> Self {
        Self {
            windows: PassiveExpiringCache::new(),
            interval,
        }
    }

    // == Interval ==
    /// Returns the configured window length.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    // == Record Hit ==
    /// Counts one hit for `key`.
    ///
    /// If the key's window is stale or absent, the count restarts at 1 (this
    /// hit) with a fresh deadline. Otherwise the count increments.
    pub fn record_hit(&mut self, key: &K) {
        if self.windows.expired(key) {
            self.windows.put_ttl(key.clone(), 1, self.interval);
            return;
        }

        let current = self.windows.get(key).copied().unwrap_or(0);
        if self.windows.set(key, current + 1).is_err() {
            // Window lapsed between the staleness check and the update
            self.windows.put_ttl(key.clone(), 1, self.interval);
        }
    }

    // == Current Window Hits ==
    /// Returns the hit count for the current window without counting a hit.
    ///
    /// A stale or absent window reads as 0. As a side effect, a fresh
    /// zeroed window is materialized so subsequent reads are consistent.
    pub fn current_window_hits(&mut self, key: &K) -> u32 {
        if self.windows.expired(key) {
            self.windows.put_ttl(key.clone(), 0, self.interval);
            return 0;
        }

        self.windows.get(key).copied().unwrap_or(0)
    }

    // == Reset ==
    /// Starts a fresh zeroed window for `key` (used when an entry is stored).
    pub fn reset(&mut self, key: &K) {
        self.windows.put_ttl(key.clone(), 0, self.interval);
    }

    // == Remove ==
    /// Drops the key's window entirely.
    pub fn remove(&mut self, key: &K) {
        self.windows.remove(key);
    }

    // == Window Deadline ==
    /// Returns the current window's deadline for a key, if one is recorded.
    pub fn window_deadline(&self, key: &K) -> Option<u64> {
        self.windows.expire_at(key)
    }
}

//! Eviction Rule Module
//!
//! The pluggable predicate that replaces fixed TTLs in the rule-driven
//! cache variant.

use std::time::Duration;

// == Rule Trait ==
/// Decides whether a [`RuleDrivenCache`](crate::cache::RuleDrivenCache)
/// entry should be evicted.
///
/// The cache invokes `expired` on every background sweep tick and, with the
/// default evict-on-read policy, before every read. The predicate must be
/// pure with respect to cache state: safe to call concurrently and
/// repeatedly, with no required side effects. A panicking invocation is
/// isolated per key inside background sweeps (logged and skipped for that
/// cycle); on the read path it propagates to the caller.
pub trait Rule<V>: Send + Sync {
    /// The hit-window length: how long per-key windowed hit counts
    /// accumulate before resetting to zero.
    fn interval(&self) -> Duration {
        Duration::from_millis(1000)
    }

    /// Returns true if the entry should be evicted.
    ///
    /// # Arguments
    /// * `window_hits` - Hits within the current interval (see
    ///   [`interval`](Self::interval))
    /// * `lifetime_hits` - Total hits over the entry's lifetime
    /// * `age` - Time since the entry was stored
    /// * `value` - The entry's current value
    fn expired(&self, window_hits: u32, lifetime_hits: u64, age: Duration, value: &V) -> bool;
}

//! Rule Driven Cache Module
//!
//! A cache map whose entries expire when a caller-supplied [`Rule`] says
//! so, based on usage rather than fixed deadlines: per-entry windowed hit
//! counts, lifetime hit counts, age, and the value itself.

use std::collections::HashMap;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::cache::entry::{current_timestamp_ms, TrackedEntry};
use crate::cache::tracker::HitTracker;
use crate::cache::CacheStats;
use crate::cache::Rule;
use crate::config::RuleSweepConfig;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_rule_sweeper;

// == Rule Store ==
/// The synchronous core of the rule-driven cache.
///
/// Each entry carries its value, creation time, and lifetime hit count; a
/// [`HitTracker`] keeps the companion windowed hit counts, its window
/// length taken from [`Rule::interval`]. The two stores are updated as a
/// unit: every insert, hit, and removal touches both, so the rule always
/// sees a consistent `(window_hits, lifetime_hits, age, value)` view of a
/// key.
///
/// With `evict_on_read` enabled (the default), `get` consults the rule
/// before counting the hit and evicts a rule-expired key instead of
/// returning it, so a read cannot resurrect a key past its eviction point.
#[derive(Debug)]
pub struct RuleStore<K, V, R> {
    /// Key-value storage; each record bundles the value with its usage data
    entries: HashMap<K, TrackedEntry<V>>,
    /// Windowed hit counts, one self-expiring window per key
    windows: HitTracker<K>,
    /// The eviction predicate
    rule: R,
    /// Sweep cadence, read-path policy, and optional whole-cache deadline
    config: RuleSweepConfig,
    /// Set once the whole-cache deadline has fired or the sweeper was stopped
    stopped: bool,
    /// Performance statistics
    stats: CacheStats,
}

impl<K, V, R> RuleStore<K, V, R>
where
    K: Eq + Hash + Clone,
    R: Rule<V>,
{
    // == Constructor ==
    /// Creates an empty store governed by `rule`, with the default sweep
    /// configuration.
    pub fn new(rule: R) -> Self {
        Self::with_config(rule, RuleSweepConfig::default())
    }

    /// Creates an empty store governed by `rule`, with the given sweep
    /// configuration.
    pub fn with_config(rule: R, config: RuleSweepConfig) -> Self {
        Self {
            entries: HashMap::new(),
            windows: HitTracker::new(rule.interval()),
            rule,
            config,
            stopped: false,
            stats: CacheStats::new(),
        }
    }

    // == Put ==
    /// Stores a value under a key.
    ///
    /// The entry starts with creation time now, zero lifetime hits, and a
    /// fresh zeroed hit window. Overwriting an existing key resets all
    /// three: a re-put entry is new as far as the rule is concerned.
    pub fn put(&mut self, key: K, value: V) {
        self.windows.reset(&key);
        self.entries.insert(key, TrackedEntry::new(value));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a value by key, counting the read as a hit in both the
    /// current window and the lifetime total.
    ///
    /// When `evict_on_read` is enabled the rule is consulted first, before
    /// the hit is counted; a rule-expired key is evicted and `None`
    /// returned. When disabled, reads never consult the rule and a
    /// rule-expired entry remains readable until a sweep reclaims it.
    ///
    /// A rule panic on this path propagates to the caller.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if !self.entries.contains_key(key) {
            self.stats.record_miss();
            return None;
        }

        if self.config.evict_on_read && self.rule_expired(key) {
            self.delete(key);
            self.stats.record_eviction();
            self.stats.record_miss();
            return None;
        }

        if let Some(entry) = self.entries.get_mut(key) {
            entry.lifetime_hits += 1;
        }
        self.windows.record_hit(key);
        self.stats.record_hit();

        self.entries.get(key).map(|entry| &entry.value)
    }

    // == Set ==
    /// Overwrites the value of an existing, not-rule-expired key.
    ///
    /// Creation time, lifetime hits, and the hit window are untouched; a
    /// `set` is not a hit. Fails with [`CacheError::KeyExpiredOrAbsent`]
    /// when the key is absent or the rule already considers it expired.
    pub fn set(&mut self, key: &K, value: V) -> Result<()> {
        if self.expired(key) {
            return Err(CacheError::KeyExpiredOrAbsent);
        }

        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.value = value;
                Ok(())
            }
            None => Err(CacheError::KeyExpiredOrAbsent),
        }
    }

    // == Remove ==
    /// Deletes an entry and its hit window if present; no-op otherwise.
    /// Idempotent.
    pub fn remove(&mut self, key: &K) {
        self.delete(key);
    }

    // == Expired ==
    /// Checks whether a key is rule-expired (or absent), without evicting.
    ///
    /// The peek reads the key's current window count, which materializes a
    /// zeroed window for a key whose window has lapsed. The entry itself is
    /// never touched.
    pub fn expired(&mut self, key: &K) -> bool {
        if !self.entries.contains_key(key) {
            return true;
        }
        self.rule_expired(key)
    }

    // == Remove Expired ==
    /// Evaluates the rule over every entry and removes the ones it expires.
    ///
    /// A panicking rule invocation is confined to its key: the panic is
    /// logged, that key is skipped for this sweep, and the scan continues.
    /// Returns the number of entries removed.
    pub fn remove_expired(&mut self) -> usize {
        let keys: Vec<K> = self.entries.keys().cloned().collect();
        let mut to_evict: Vec<K> = Vec::new();

        for key in keys {
            let window_hits = self.windows.current_window_hits(&key);
            let entry = match self.entries.get(&key) {
                Some(entry) => entry,
                None => continue,
            };

            let verdict = panic::catch_unwind(AssertUnwindSafe(|| {
                self.rule.expired(
                    window_hits,
                    entry.lifetime_hits,
                    Duration::from_millis(entry.age_ms()),
                    &entry.value,
                )
            }));

            match verdict {
                Ok(true) => to_evict.push(key),
                Ok(false) => {}
                Err(_) => warn!("rule panicked during sweep; key skipped this cycle"),
            }
        }

        let count = to_evict.len();
        for key in &to_evict {
            self.delete(key);
        }
        self.stats.record_evictions(count as u64);
        count
    }

    // == Usage Accessors ==
    /// Returns the lifetime hit count for a key, if present.
    pub fn lifetime_hits(&self, key: &K) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.lifetime_hits)
    }

    /// Returns the current-window hit count for a key, 0 if the key is
    /// absent or its window has lapsed.
    pub fn window_hits(&mut self, key: &K) -> u32 {
        if !self.entries.contains_key(key) {
            return 0;
        }
        self.windows.current_window_hits(key)
    }

    /// Returns the age of a key's entry, if present.
    pub fn age(&self, key: &K) -> Option<Duration> {
        self.entries
            .get(key)
            .map(|entry| Duration::from_millis(entry.age_ms()))
    }

    // == Snapshot ==
    /// Returns an owned copy of the current value store. For diagnostics
    /// and iteration only; the copy is not consulted by the rule.
    pub fn snapshot(&self) -> HashMap<K, V>
    where
        V: Clone,
    {
        self.entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    // == Clear ==
    /// Removes every entry and hit window. Cleared entries count toward
    /// the eviction statistic (the whole-cache deadline path relies on
    /// this).
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.windows = HitTracker::new(self.windows.interval());
        self.stats.record_evictions(count as u64);
        self.stats.set_total_entries(0);
        count
    }

    // == Sweep Configuration ==
    /// Current delay between sweep ticks.
    pub fn sweep_delay(&self) -> Duration {
        self.config.delay
    }

    /// Reconfigures the sweep cadence. Takes effect from the next tick; a
    /// tick already sleeping finishes its old delay first.
    pub fn configure_sweep(&mut self, delay: Duration) {
        self.config.delay = delay;
    }

    // == Deadline ==
    /// True once the whole-cache deadline (if any) has passed.
    pub fn deadline_reached(&self) -> bool {
        match self.config.deadline {
            Some(deadline) => current_timestamp_ms() >= deadline,
            None => false,
        }
    }

    // == Stopped Flag ==
    /// Marks the store as no longer background-swept.
    pub fn mark_stopped(&mut self) {
        self.stopped = true;
    }

    /// True once the sweeper has exited (deadline fired or `stop` called).
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Rule Evaluation ==
    /// Evaluates the rule for one key against its current usage data.
    ///
    /// Reads the window count first (may materialize a zeroed window), then
    /// hands the rule a consistent view of the entry.
    fn rule_expired(&mut self, key: &K) -> bool {
        let window_hits = self.windows.current_window_hits(key);
        match self.entries.get(key) {
            Some(entry) => self.rule.expired(
                window_hits,
                entry.lifetime_hits,
                Duration::from_millis(entry.age_ms()),
                &entry.value,
            ),
            None => true,
        }
    }

    // == Delete ==
    /// Removes an entry and its hit window as a unit.
    fn delete(&mut self, key: &K) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }
        self.windows.remove(key);
        self.stats.set_total_entries(self.entries.len());
        true
    }
}

// == Rule Driven Cache ==
/// Background-swept, rule-governed cache handle.
///
/// Owns a [`RuleStore`] behind `Arc<RwLock<_>>` plus one sweeper task that
/// evaluates the rule over the whole key set every `delay`.
///
/// Constructors must be called within a tokio runtime. Dropping the handle
/// aborts the sweeper. Share the cache between tasks by wrapping it in
/// `Arc`.
#[derive(Debug)]
pub struct RuleDrivenCache<K, V, R> {
    /// Shared store, also held by the sweeper task
    store: Arc<RwLock<RuleStore<K, V, R>>>,
    /// The background sweeper
    sweeper: JoinHandle<()>,
}

impl<K, V, R> RuleDrivenCache<K, V, R>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    R: Rule<V> + 'static,
{
    // == Constructors ==
    /// Creates a cache governed by `rule` with the default sweep
    /// configuration and starts its sweeper.
    pub fn new(rule: R) -> Self {
        Self::with_config(rule, RuleSweepConfig::default())
    }

    /// Creates a cache governed by `rule` with the given sweep
    /// configuration and starts its sweeper.
    pub fn with_config(rule: R, config: RuleSweepConfig) -> Self {
        let store = Arc::new(RwLock::new(RuleStore::with_config(rule, config)));
        let sweeper = spawn_rule_sweeper(Arc::clone(&store));
        Self { store, sweeper }
    }

    // == Operations ==
    /// Stores a value under a key with fresh usage data.
    pub async fn put(&self, key: K, value: V) {
        self.store.write().await.put(key, value);
    }

    /// Retrieves a value by key, counting the read as a hit.
    pub async fn get(&self, key: &K) -> Option<V> {
        self.store.write().await.get(key).cloned()
    }

    /// Overwrites the value of an existing, not-rule-expired key.
    pub async fn set(&self, key: &K, value: V) -> Result<()> {
        self.store.write().await.set(key, value)
    }

    /// Deletes an entry and its hit window if present. Idempotent.
    pub async fn remove(&self, key: &K) {
        self.store.write().await.remove(key);
    }

    /// Checks whether a key is rule-expired (or absent), without evicting.
    pub async fn expired(&self, key: &K) -> bool {
        self.store.write().await.expired(key)
    }

    /// Evaluates the rule over every entry and removes the ones it expires.
    pub async fn remove_expired(&self) -> usize {
        self.store.write().await.remove_expired()
    }

    /// Returns the lifetime hit count for a key, if present.
    pub async fn lifetime_hits(&self, key: &K) -> Option<u64> {
        self.store.read().await.lifetime_hits(key)
    }

    /// Returns the current-window hit count for a key.
    pub async fn window_hits(&self, key: &K) -> u32 {
        self.store.write().await.window_hits(key)
    }

    /// Returns an owned copy of the current value store.
    pub async fn snapshot(&self) -> HashMap<K, V> {
        self.store.read().await.snapshot()
    }

    /// Removes every entry and hit window.
    pub async fn clear(&self) -> usize {
        self.store.write().await.clear()
    }

    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// Returns the current number of entries.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Returns true if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    // == Sweep Control ==
    /// Reconfigures the sweep cadence from the next tick.
    pub async fn configure_sweep(&self, delay: Duration) {
        self.store.write().await.configure_sweep(delay);
    }

    /// Aborts the sweeper and marks the cache stopped. Entries present
    /// afterwards are only removed by explicit calls.
    pub async fn stop(&self) {
        self.sweeper.abort();
        self.store.write().await.mark_stopped();
    }

    /// True once the sweeper has exited (deadline fired or `stop` called).
    pub async fn is_stopped(&self) -> bool {
        self.store.read().await.is_stopped()
    }
}

impl<K, V, R> Drop for RuleDrivenCache<K, V, R> {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

//! Staged Sweeping Cache Module
//!
//! A cache map whose expired entries are reclaimed by a background sweep
//! that visits a bounded batch of keys per tick, instead of scanning the
//! whole map at once or checking deadlines on the read path.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::cache::entry::{current_timestamp_ms, TimedEntry};
use crate::cache::CacheStats;
use crate::config::SweepConfig;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_staged_sweeper;

// == Staged Store ==
/// The synchronous core of the staged sweeping cache.
///
/// Keeps an insertion-order key list alongside the entry map and a cursor
/// into it. Each call to [`remove_expired_stage`](Self::remove_expired_stage)
/// advances the cursor by at most `stage_size` keys, deleting the expired
/// ones it visits, and wraps the cursor back to the start after reaching the
/// end. Every key is visited at least once per full cursor cycle; the
/// visitation order is otherwise unspecified.
///
/// Reads never check deadlines here: an expired entry remains observable
/// until a sweep stage or an explicit `remove_expired` reaches it. Use this
/// type directly to drive sweeps by hand; use [`StagedSweepingCache`] for
/// the background-swept handle.
#[derive(Debug)]
pub struct StagedStore<K, V> {
    /// Key-value storage; each record bundles the value with its deadline
    entries: HashMap<K, TimedEntry<V>>,
    /// Keys in insertion order, kept in sync with the map
    order: Vec<K>,
    /// Index of the next key a sweep stage will visit
    cursor: usize,
    /// Sweep cadence, stage width, and optional whole-cache deadline
    config: SweepConfig,
    /// Set once the whole-cache deadline has fired or the sweeper was stopped
    stopped: bool,
    /// Performance statistics
    stats: CacheStats,
}

impl<K, V> StagedStore<K, V>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates an empty store with the default sweep configuration.
    pub fn new() -> Self {
        Self::with_config(SweepConfig::default())
    }

    /// Creates an empty store with the given sweep configuration.
    pub fn with_config(config: SweepConfig) -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            cursor: 0,
            config,
            stopped: false,
            stats: CacheStats::new(),
        }
    }

    // == Put ==
    /// Stores a value with an absolute expiry deadline (Unix milliseconds).
    ///
    /// Overwriting an existing key replaces value and deadline; the key
    /// keeps its slot in the sweep order.
    pub fn put(&mut self, key: K, value: V, expire_at: u64) {
        if self
            .entries
            .insert(key.clone(), TimedEntry::new(value, expire_at))
            .is_none()
        {
            self.order.push(key);
        }
        self.stats.set_total_entries(self.entries.len());
    }

    // == Put TTL ==
    /// Stores a value expiring `ttl` from now.
    pub fn put_ttl(&mut self, key: K, value: V, ttl: Duration) {
        self.put(key, value, current_timestamp_ms() + ttl.as_millis() as u64);
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// No lazy expiry: a key past its deadline but not yet swept is still
    /// returned. The trade is read-path latency for eventual,
    /// bounded-by-sweep-cycle consistency.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match self.entries.get(key) {
            Some(entry) => {
                self.stats.record_hit();
                Some(&entry.value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Overwrites the value of an existing, unexpired key, preserving its
    /// deadline.
    ///
    /// Unlike `get`, this does honor deadlines: `set` on a
    /// stale-but-unswept entry fails with
    /// [`CacheError::KeyExpiredOrAbsent`], even though a concurrent `get`
    /// would still return the stale value.
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
    /// Deletes an entry if present; no-op otherwise. Idempotent.
    pub fn remove(&mut self, key: &K) {
        self.delete(key);
    }

    // == Expired ==
    /// Checks whether a key is expired (or absent).
    ///
    /// Pure observation, unlike the passive variant: a confirmed-expired
    /// entry is left in place for the sweep to reclaim.
    pub fn expired(&self, key: &K) -> bool {
        match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => true,
        }
    }

    // == Expire At ==
    /// Returns the recorded expiry deadline for a key, if present.
    pub fn expire_at(&self, key: &K) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.expires_at)
    }

    // == Remove Expired Stage ==
    /// Runs one sweep stage: visits up to `stage_size` keys starting at the
    /// cursor and deletes the expired ones.
    ///
    /// Returns the number of entries removed. The cursor stays where the
    /// visit stopped and wraps to the start once it reaches the end of the
    /// key list (including when the list shrank beneath it).
    pub fn remove_expired_stage(&mut self) -> usize {
        let mut visited = 0;
        let mut removed = 0;

        while visited < self.config.stage_size && self.cursor < self.order.len() {
            let expired = {
                let key = &self.order[self.cursor];
                self.entries.get(key).map(|e| e.is_expired()).unwrap_or(true)
            };

            if expired {
                // Removing at the cursor shifts the next key into its place
                let key = self.order.remove(self.cursor);
                self.entries.remove(&key);
                removed += 1;
            } else {
                self.cursor += 1;
            }
            visited += 1;
        }

        if self.cursor >= self.order.len() {
            self.cursor = 0;
        }

        if removed > 0 {
            self.stats.record_evictions(removed as u64);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Remove Expired ==
    /// Removes every currently-expired entry in one full scan, regardless
    /// of the cursor position.
    ///
    /// Returns the number of entries removed.
    pub fn remove_expired(&mut self) -> usize {
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in &expired_keys {
            self.delete(key);
        }

        self.stats.record_evictions(count as u64);
        count
    }

    // == Snapshot ==
    /// Returns an owned copy of the current value store, stale-but-unswept
    /// entries included. For diagnostics and iteration only.
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
    /// Removes every entry and resets the cursor. Cleared entries count
    /// toward the eviction statistic (the whole-cache deadline path relies
    /// on this).
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.order.clear();
        self.cursor = 0;
        self.stats.record_evictions(count as u64);
        self.stats.set_total_entries(0);
        count
    }

    // == Sweep Configuration ==
    /// Current delay between sweep ticks.
    pub fn sweep_delay(&self) -> Duration {
        self.config.delay
    }

    /// Reconfigures sweep cadence and stage width. Takes effect from the
    /// next tick; a tick already sleeping finishes its old delay first.
    pub fn configure_sweep(&mut self, delay: Duration, stage_size: usize) {
        self.config.delay = delay;
        self.config.stage_size = stage_size;
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
    /// Returns the current number of entries, stale-but-unswept ones
    /// included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Delete ==
    /// Removes an entry from the map and the sweep order as a unit,
    /// adjusting the cursor so no surviving key loses its turn.
    fn delete(&mut self, key: &K) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }

        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
            if pos < self.cursor {
                self.cursor -= 1;
            }
        }

        self.stats.set_total_entries(self.entries.len());
        true
    }
}

impl<K, V> Default for StagedStore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// == Staged Sweeping Cache ==
/// Background-swept cache handle.
///
/// Owns a [`StagedStore`] behind `Arc<RwLock<_>>` plus one sweeper task
/// that runs a sweep stage every `delay`. Callers and the sweeper
/// coordinate through the lock; each sweep tick holds it for at most
/// `stage_size` key visits.
///
/// Constructors must be called within a tokio runtime. Dropping the handle
/// aborts the sweeper. Share the cache between tasks by wrapping it in
/// `Arc`.
#[derive(Debug)]
pub struct StagedSweepingCache<K, V> {
    /// Shared store, also held by the sweeper task
    store: Arc<RwLock<StagedStore<K, V>>>,
    /// The background sweeper
    sweeper: JoinHandle<()>,
}

impl<K, V> StagedSweepingCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a cache with the default sweep configuration and starts its
    /// sweeper.
    pub fn new() -> Self {
        Self::with_config(SweepConfig::default())
    }

    /// Creates a cache with the given sweep configuration and starts its
    /// sweeper.
    pub fn with_config(config: SweepConfig) -> Self {
        let store = Arc::new(RwLock::new(StagedStore::with_config(config)));
        let sweeper = spawn_staged_sweeper(Arc::clone(&store));
        Self { store, sweeper }
    }

    // == Operations ==
    /// Stores a value with an absolute expiry deadline (Unix milliseconds).
    pub async fn put(&self, key: K, value: V, expire_at: u64) {
        self.store.write().await.put(key, value, expire_at);
    }

    /// Stores a value expiring `ttl` from now.
    pub async fn put_ttl(&self, key: K, value: V, ttl: Duration) {
        self.store.write().await.put_ttl(key, value, ttl);
    }

    /// Retrieves a value by key. No lazy expiry: may return a
    /// stale-but-unswept value.
    pub async fn get(&self, key: &K) -> Option<V> {
        self.store.write().await.get(key).cloned()
    }

    /// Overwrites the value of an existing, unexpired key.
    pub async fn set(&self, key: &K, value: V) -> Result<()> {
        self.store.write().await.set(key, value)
    }

    /// Deletes an entry if present. Idempotent.
    pub async fn remove(&self, key: &K) {
        self.store.write().await.remove(key);
    }

    /// Checks whether a key is expired (or absent). Pure observation.
    pub async fn expired(&self, key: &K) -> bool {
        self.store.read().await.expired(key)
    }

    /// Returns the recorded expiry deadline for a key, if present.
    pub async fn expire_at(&self, key: &K) -> Option<u64> {
        self.store.read().await.expire_at(key)
    }

    /// Removes every currently-expired entry in one full scan.
    pub async fn remove_expired(&self) -> usize {
        self.store.write().await.remove_expired()
    }

    /// Returns an owned copy of the current value store.
    pub async fn snapshot(&self) -> HashMap<K, V> {
        self.store.read().await.snapshot()
    }

    /// Removes every entry.
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
    /// Reconfigures sweep cadence and stage width from the next tick.
    pub async fn configure_sweep(&self, delay: Duration, stage_size: usize) {
        self.store.write().await.configure_sweep(delay, stage_size);
    }

    /// Aborts the sweeper and marks the cache stopped. Entries present
    /// afterwards are never removed automatically.
    pub async fn stop(&self) {
        self.sweeper.abort();
        self.store.write().await.mark_stopped();
    }

    /// True once the sweeper has exited (deadline fired or `stop` called).
    pub async fn is_stopped(&self) -> bool {
        self.store.read().await.is_stopped()
    }
}

impl<K, V> Default for StagedSweepingCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for StagedSweepingCache<K, V> {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

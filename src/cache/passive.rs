//! Passive Expiring Cache Module
//!
//! A cache map that never checks expiry until a key is touched. Expired
//! entries are reclaimed lazily, paid for by whichever caller happens to
//! trigger the check (observe-and-reconcile semantics).

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use crate::cache::entry::{current_timestamp_ms, TimedEntry};
use crate::cache::CacheStats;
use crate::error::{CacheError, Result};

// == Passive Expiring Cache ==
/// Key/value store with lazy, access-time expiry.
///
/// Every entry carries an absolute expiry deadline. Nothing runs in the
/// background: an expired entry stays in memory until `get`, `expired`, or
/// `remove_expired` touches it, at which point it is deleted.
///
/// All methods take `&mut self`; wrap the cache in `Arc<RwLock<_>>` to share
/// it between tasks.
#[derive(Debug)]
pub struct PassiveExpiringCache<K, V> {
    /// Key-value storage; each record bundles the value with its deadline
    entries: HashMap<K, TimedEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
}

impl<K, V> PassiveExpiringCache<K, V>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
        }
    }

    // == Put ==
    /// Stores a value with an absolute expiry deadline (Unix milliseconds).
    ///
    /// If the key already exists, both value and deadline are overwritten.
    pub fn put(&mut self, key: K, value: V, expire_at: u64) {
        self.entries.insert(key, TimedEntry::new(value, expire_at));
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
    /// Returns `None` if the key is unknown or expired. Detecting expiry
    /// here deletes the entry before returning (tombstone-on-read), so a
    /// `None` from an expired key also reclaims its memory.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if self.expired(key) {
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.entries.get(key).map(|entry| &entry.value)
    }

    // == Set ==
    /// Overwrites the value of an existing, unexpired key.
    ///
    /// The recorded expiry deadline is preserved. Fails with
    /// [`CacheError::KeyExpiredOrAbsent`] if the key is unknown or expired;
    /// `set` never creates a new key.
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
        if self.entries.remove(key).is_some() {
            self.stats.set_total_entries(self.entries.len());
        }
    }

    // == Expired ==
    /// Checks whether a key is expired (or absent).
    ///
    /// Side effect: confirming expiry deletes the entry, so a `true` answer
    /// also means the key is now gone. Callers that only want to observe the
    /// deadline should use [`expire_at`](Self::expire_at) instead.
    pub fn expired(&mut self, key: &K) -> bool {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(key);
                self.stats.record_eviction();
                self.stats.set_total_entries(self.entries.len());
                true
            }
            Some(_) => false,
            None => true,
        }
    }

    // == Expire At ==
    /// Returns the recorded expiry deadline for a key, if present.
    ///
    /// Pure observation: an expired-but-untouched entry still reports its
    /// deadline.
    pub fn expire_at(&self, key: &K) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.expires_at)
    }

    // == Remove Expired ==
    /// Removes every currently-expired entry in one linear scan.
    ///
    /// Returns the number of entries removed. Used for manual/bulk cleanup.
    pub fn remove_expired(&mut self) -> usize {
        let expired_keys: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in &expired_keys {
            self.entries.remove(key);
        }

        self.stats.record_evictions(count as u64);
        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Snapshot ==
    /// Returns an owned copy of the current value store.
    ///
    /// For diagnostics and iteration only. Includes entries that are
    /// expired but not yet touched.
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
    /// Removes every entry. Cleared entries count toward the eviction
    /// statistic (the whole-cache deadline path relies on this).
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.stats.record_evictions(count as u64);
        self.stats.set_total_entries(0);
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the current number of entries, expired-but-untouched ones
    /// included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Default for PassiveExpiringCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn far_future() -> u64 {
        current_timestamp_ms() + 60_000
    }

    fn past() -> u64 {
        current_timestamp_ms().saturating_sub(1)
    }

    #[test]
    fn test_cache_new() {
        let cache: PassiveExpiringCache<String, String> = PassiveExpiringCache::new();
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_and_get() {
        let mut cache = PassiveExpiringCache::new();

        cache.put("key1".to_string(), "value1".to_string(), far_future());

        assert_eq!(cache.get(&"key1".to_string()), Some(&"value1".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let mut cache: PassiveExpiringCache<String, String> = PassiveExpiringCache::new();
        assert_eq!(cache.get(&"nonexistent".to_string()), None);
    }

    #[test]
    fn test_get_expired_removes_entry() {
        let mut cache = PassiveExpiringCache::new();

        cache.put("key1".to_string(), "value1".to_string(), past());
        assert_eq!(cache.len(), 1);

        // The read observes expiry and reclaims the entry
        assert_eq!(cache.get(&"key1".to_string()), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_ttl_expiration() {
        let mut cache = PassiveExpiringCache::new();

        cache.put_ttl("key1".to_string(), "value1".to_string(), Duration::from_millis(100));

        // Accessible before the deadline
        assert!(cache.get(&"key1".to_string()).is_some());

        sleep(Duration::from_millis(150));

        // Expired now
        assert_eq!(cache.get(&"key1".to_string()), None);
    }

    #[test]
    fn test_set_overwrites_value_only() {
        let mut cache = PassiveExpiringCache::new();
        let deadline = far_future();

        cache.put("key1".to_string(), "value1".to_string(), deadline);
        cache.set(&"key1".to_string(), "value2".to_string()).unwrap();

        assert_eq!(cache.get(&"key1".to_string()), Some(&"value2".to_string()));
        // Expiry is preserved by set
        assert_eq!(cache.expire_at(&"key1".to_string()), Some(deadline));
    }

    #[test]
    fn test_set_absent_key_fails() {
        let mut cache: PassiveExpiringCache<String, String> = PassiveExpiringCache::new();

        let result = cache.set(&"missing".to_string(), "value".to_string());
        assert_eq!(result, Err(CacheError::KeyExpiredOrAbsent));
    }

    #[test]
    fn test_set_expired_key_fails_and_removes() {
        let mut cache = PassiveExpiringCache::new();

        cache.put("key1".to_string(), "value1".to_string(), past());

        let result = cache.set(&"key1".to_string(), "value2".to_string());
        assert_eq!(result, Err(CacheError::KeyExpiredOrAbsent));
        // The failed set's expiry check reclaimed the entry
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_remove() {
        let mut cache = PassiveExpiringCache::new();

        cache.put("key1".to_string(), "value1".to_string(), far_future());
        cache.remove(&"key1".to_string());

        assert!(cache.is_empty());
        assert_eq!(cache.get(&"key1".to_string()), None);
    }

    #[test]
    fn test_remove_idempotent() {
        let mut cache = PassiveExpiringCache::new();

        cache.put("key1".to_string(), "value1".to_string(), far_future());
        cache.remove(&"key1".to_string());
        cache.remove(&"key1".to_string());

        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_semantics() {
        let mut cache = PassiveExpiringCache::new();

        // Absent key is expired
        assert!(cache.expired(&"missing".to_string()));

        // Live key is not
        cache.put("live".to_string(), "v".to_string(), far_future());
        assert!(!cache.expired(&"live".to_string()));

        // Past-deadline key is expired, and the check removes it
        cache.put("stale".to_string(), "v".to_string(), past());
        assert!(cache.expired(&"stale".to_string()));
        assert_eq!(cache.expire_at(&"stale".to_string()), None);
    }

    #[test]
    fn test_overwrite_leaves_latest() {
        let mut cache = PassiveExpiringCache::new();
        let t1 = far_future();
        let t2 = t1 + 5_000;

        cache.put("key1".to_string(), "value1".to_string(), t1);
        cache.put("key1".to_string(), "value2".to_string(), t2);

        assert_eq!(cache.get(&"key1".to_string()), Some(&"value2".to_string()));
        assert_eq!(cache.expire_at(&"key1".to_string()), Some(t2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_expired_bulk() {
        let mut cache = PassiveExpiringCache::new();

        cache.put("stale1".to_string(), "v".to_string(), past());
        cache.put("stale2".to_string(), "v".to_string(), past());
        cache.put("live".to_string(), "v".to_string(), far_future());

        let removed = cache.remove_expired();
        assert_eq!(removed, 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&"live".to_string()).is_some());
    }

    #[test]
    fn test_snapshot_includes_untouched_stale() {
        let mut cache = PassiveExpiringCache::new();

        cache.put("stale".to_string(), "v1".to_string(), past());
        cache.put("live".to_string(), "v2".to_string(), far_future());

        // Nothing has touched "stale" yet, so the raw view still has it
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 2);

        // Touching it reconciles; the next snapshot agrees
        assert_eq!(cache.get(&"stale".to_string()), None);
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.contains_key("stale"));
    }

    #[test]
    fn test_atomic_deletion_view() {
        let mut cache = PassiveExpiringCache::new();

        cache.put("key1".to_string(), "value1".to_string(), past());

        // One access expires it; every observer then agrees it is gone
        assert_eq!(cache.get(&"key1".to_string()), None);
        assert!(cache.expired(&"key1".to_string()));
        assert!(!cache.snapshot().contains_key("key1"));
    }

    #[test]
    fn test_clear() {
        let mut cache = PassiveExpiringCache::new();

        cache.put("a".to_string(), 1, far_future());
        cache.put("b".to_string(), 2, far_future());

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_stats() {
        let mut cache = PassiveExpiringCache::new();

        cache.put("key1".to_string(), "value1".to_string(), far_future());
        cache.get(&"key1".to_string()); // hit
        cache.get(&"nonexistent".to_string()); // miss

        cache.put("stale".to_string(), "v".to_string(), past());
        cache.get(&"stale".to_string()); // miss + lazy eviction

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.total_entries, 1);
    }
}

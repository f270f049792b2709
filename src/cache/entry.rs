//! Cache Entry Module
//!
//! Defines the per-key records stored by the cache variants.

use std::time::{SystemTime, UNIX_EPOCH};

// == Timed Entry ==
/// A value paired with an absolute expiry deadline.
///
/// Used by the passive and staged variants. Bundling value and deadline in
/// one record keeps them consistent: an entry can never lose its expiry
/// metadata without losing its value too.
#[derive(Debug, Clone)]
pub struct TimedEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl<V> TimedEntry<V> {
    // == Constructor ==
    /// Creates an entry expiring at the given absolute timestamp.
    pub fn new(value: V, expires_at: u64) -> Self {
        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is considered expired when the current
    /// time is greater than or equal to the expiration time. Once the
    /// deadline has fully elapsed, the entry is immediately expired.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms() >= self.expires_at
    }
}

// == Tracked Entry ==
/// A value paired with the access statistics the rule-driven variant feeds
/// to its eviction rule.
#[derive(Debug, Clone)]
pub struct TrackedEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp (Unix milliseconds), immutable after creation
    pub created_at: u64,
    /// Total number of successful reads over the entry's lifetime
    pub lifetime_hits: u64,
}

impl<V> TrackedEntry<V> {
    // == Constructor ==
    /// Creates an entry recorded as created now, with zero hits.
    pub fn new(value: V) -> Self {
        Self {
            value,
            created_at: current_timestamp_ms(),
            lifetime_hits: 0,
        }
    }

    // == Age ==
    /// Returns the entry's age in milliseconds.
    pub fn age_ms(&self) -> u64 {
        current_timestamp_ms().saturating_sub(self.created_at)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_timed_entry_not_expired() {
        let entry = TimedEntry::new("test_value", current_timestamp_ms() + 10_000);

        assert_eq!(entry.value, "test_value");
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_timed_entry_expiration() {
        let entry = TimedEntry::new("test_value", current_timestamp_ms() + 50);

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(80));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_timed_entry_already_expired() {
        let entry = TimedEntry::new("test_value", current_timestamp_ms().saturating_sub(1));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        // Expires exactly at creation time
        let entry = TimedEntry::new("test", current_timestamp_ms());

        // Entry is expired when current time >= expires_at
        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }

    #[test]
    fn test_tracked_entry_new() {
        let before = current_timestamp_ms();
        let entry = TrackedEntry::new(42);
        let after = current_timestamp_ms();

        assert_eq!(entry.value, 42);
        assert_eq!(entry.lifetime_hits, 0);
        assert!(entry.created_at >= before && entry.created_at <= after);
    }

    #[test]
    fn test_tracked_entry_age() {
        let entry = TrackedEntry::new("v");

        sleep(Duration::from_millis(30));

        let age = entry.age_ms();
        assert!(age >= 30, "age should be at least the elapsed time, got {}", age);
    }
}

//! Error types for the cache maps
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache maps.
///
/// `set` is the only fallible operation: it never creates a key, so it fails
/// when the target is missing or already expired. All other operations treat
/// an unknown key as a normal "absent" outcome.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// The key does not exist, or its entry is expired under the
    /// variant's expiry policy. The two cases are indistinguishable by
    /// design: an expired entry may already have been reclaimed.
    #[error("key expired or absent")]
    KeyExpiredOrAbsent,
}

// == Result Type Alias ==
/// Convenience Result type for the cache maps.
pub type Result<T> = std::result::Result<T, CacheError>;

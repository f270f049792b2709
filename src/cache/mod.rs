//! Cache Module
//!
//! Provides the three in-memory cache variants: passive expiry checked on
//! access, staged background sweeping, and rule-driven eviction.

pub(crate) mod entry;
mod passive;
mod rule;
mod ruled;
mod staged;
mod stats;
mod tracker;


// Re-export public types
pub use entry::current_timestamp_ms;
pub use passive::PassiveExpiringCache;
pub use rule::Rule;
pub use ruled::{RuleDrivenCache, RuleStore};
pub use staged::{StagedStore, StagedSweepingCache};
pub use stats::CacheStats;
pub use tracker::HitTracker;

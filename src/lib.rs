//! Expiremap - in-memory key/value caches with expiring entries
//!
//! Three variants share one calling convention and differ in how entries
//! leave the map:
//! - [`PassiveExpiringCache`]: deadlines checked on access, no background work
//! - [`StagedSweepingCache`]: a background sweep visits a bounded batch of keys per tick
//! - [`RuleDrivenCache`]: a caller-supplied [`Rule`] expires entries from usage data

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{
    current_timestamp_ms, CacheStats, HitTracker, PassiveExpiringCache, Rule, RuleDrivenCache,
    RuleStore, StagedStore, StagedSweepingCache,
};
pub use config::{RuleSweepConfig, SweepConfig};
pub use error::{CacheError, Result};

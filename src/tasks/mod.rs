//! Background Tasks Module
//!
//! Contains the background sweepers that run while a swept cache handle is
//! alive.
//!
//! # Tasks
//! - Staged sweeper: removes expired entries a bounded batch per tick
//! - Rule sweeper: evaluates the eviction rule over all entries per tick

mod sweeper;

pub use sweeper::{spawn_rule_sweeper, spawn_staged_sweeper};

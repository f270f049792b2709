//! Configuration Module
//!
//! Sweep configuration for the background-swept cache variants.

use std::time::Duration;

// == Defaults ==
/// Default delay between staged sweep ticks.
pub const DEFAULT_SWEEP_DELAY: Duration = Duration::from_millis(1);

/// Default number of keys a staged sweep visits per tick.
pub const DEFAULT_STAGE_SIZE: usize = 10;

/// Default delay between rule sweep ticks.
pub const DEFAULT_RULE_SWEEP_DELAY: Duration = Duration::from_millis(50);

// == Sweep Config ==
/// Configuration for a [`StagedSweepingCache`](crate::cache::StagedSweepingCache).
///
/// `delay` and `stage_size` can also be changed at runtime through
/// `configure_sweep`; changes take effect from the next sweep tick.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Delay between sweep ticks
    pub delay: Duration,
    /// Maximum number of keys visited per tick. A stage size of 0 is
    /// allowed and makes every tick a no-op.
    pub stage_size: usize,
    /// Optional whole-cache deadline (Unix milliseconds). On the first tick
    /// at or after this instant the sweeper clears all entries, marks the
    /// cache stopped, and exits.
    pub deadline: Option<u64>,
}

impl SweepConfig {
    /// Creates a config with the default delay and stage size and no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delay between sweep ticks.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the number of keys visited per sweep tick.
    pub fn with_stage_size(mut self, stage_size: usize) -> Self {
        self.stage_size = stage_size;
        self
    }

    /// Sets the whole-cache deadline (Unix milliseconds).
    pub fn with_deadline(mut self, deadline: u64) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_SWEEP_DELAY,
            stage_size: DEFAULT_STAGE_SIZE,
            deadline: None,
        }
    }
}

// == Rule Sweep Config ==
/// Configuration for a [`RuleDrivenCache`](crate::cache::RuleDrivenCache).
#[derive(Debug, Clone)]
pub struct RuleSweepConfig {
    /// Delay between sweep ticks. Each tick evaluates the rule over the
    /// whole key set (full scan, not staged).
    pub delay: Duration,
    /// When true (the default), `get` consults the rule before touching hit
    /// counters and evicts a rule-expired key instead of returning it, so a
    /// read cannot resurrect a key past its eviction point. When false,
    /// reads never consult the rule; only sweeps and `expired` do.
    pub evict_on_read: bool,
    /// Optional whole-cache deadline (Unix milliseconds), as in
    /// [`SweepConfig::deadline`].
    pub deadline: Option<u64>,
}

impl RuleSweepConfig {
    /// Creates a config with the default delay, evict-on-read enabled, and
    /// no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delay between sweep ticks.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Enables or disables rule evaluation on the read path.
    pub fn with_evict_on_read(mut self, evict_on_read: bool) -> Self {
        self.evict_on_read = evict_on_read;
        self
    }

    /// Sets the whole-cache deadline (Unix milliseconds).
    pub fn with_deadline(mut self, deadline: u64) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl Default for RuleSweepConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RULE_SWEEP_DELAY,
            evict_on_read: true,
            deadline: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_config_default() {
        let config = SweepConfig::default();
        assert_eq!(config.delay, Duration::from_millis(1));
        assert_eq!(config.stage_size, 10);
        assert!(config.deadline.is_none());
    }

    #[test]
    fn test_sweep_config_builders() {
        let config = SweepConfig::new()
            .with_delay(Duration::from_millis(25))
            .with_stage_size(100)
            .with_deadline(1_000_000);

        assert_eq!(config.delay, Duration::from_millis(25));
        assert_eq!(config.stage_size, 100);
        assert_eq!(config.deadline, Some(1_000_000));
    }

    #[test]
    fn test_rule_sweep_config_default() {
        let config = RuleSweepConfig::default();
        assert_eq!(config.delay, Duration::from_millis(50));
        assert!(config.evict_on_read);
        assert!(config.deadline.is_none());
    }

    #[test]
    fn test_rule_sweep_config_builders() {
        let config = RuleSweepConfig::new()
            .with_delay(Duration::from_millis(10))
            .with_evict_on_read(false)
            .with_deadline(42);

        assert_eq!(config.delay, Duration::from_millis(10));
        assert!(!config.evict_on_read);
        assert_eq!(config.deadline, Some(42));
    }
}

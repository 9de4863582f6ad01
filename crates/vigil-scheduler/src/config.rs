//! Scheduler tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing and policy configuration for the scheduler.
///
/// Loading these from a file or the environment is the embedding
/// application's concern; the scheduler only consumes the resolved values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Pause between sweep ticks.
    pub sweep_interval: Duration,
    /// How long a tick waits for the sweep lock before giving up.
    /// A contended tick is skipped, never queued.
    pub sweep_lock_wait: Duration,
    /// Pause before the supervisor restarts a crashed tick loop.
    pub restart_delay: Duration,
    /// Whether skipped (contended) ticks are counted in the status
    /// snapshot. Off means they stay silent.
    pub count_skipped_sweeps: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(1),
            sweep_lock_wait: Duration::from_millis(500),
            restart_delay: Duration::from_secs(2),
            count_skipped_sweeps: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_cadence() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.sweep_interval, Duration::from_secs(1));
        assert_eq!(cfg.sweep_lock_wait, Duration::from_millis(500));
        assert_eq!(cfg.restart_delay, Duration::from_secs(2));
        assert!(cfg.count_skipped_sweeps);
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = SchedulerConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SchedulerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}

use std::time::Duration;

use crate::rule::CommandRule;

/// Minimum duration of one control cycle.
pub const DEFAULT_CYCLE_PERIOD: Duration = Duration::from_millis(10);

/// Sleep between two checks for inbound bytes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the control loop.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Cycle floor; the next cycle never starts earlier than this after the last one.
    pub cycle_period: Duration,
    /// How long to sleep between polls while waiting for inbound bytes.
    pub poll_interval: Duration,
    /// Give up waiting for inbound bytes after this long. `None` waits
    /// until data arrives or shutdown is requested.
    pub poll_timeout: Option<Duration>,
    /// Sentinel rule; `None` disables it.
    pub rule: Option<CommandRule>,
    /// Stop after this many cycles. `None` runs until shutdown.
    pub max_cycles: Option<u64>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            cycle_period: DEFAULT_CYCLE_PERIOD,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: None,
            rule: Some(CommandRule::default()),
            max_cycles: None,
        }
    }
}

//! Configuration for the batch scheduler.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Worker pool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of workers spawned on start.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// How long an idle worker waits for a wake-up before re-checking state.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long stop waits for each worker before aborting it.
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// Capacity of the event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Start the worker pool when the service boots.
    #[serde(default = "default_autostart")]
    pub autostart: bool,
}

fn default_concurrency() -> usize {
    3
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_shutdown_timeout_ms() -> u64 {
    5000
}

fn default_event_capacity() -> usize {
    256
}

fn default_autostart() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            poll_interval_ms: default_poll_interval_ms(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            event_capacity: default_event_capacity(),
            autostart: default_autostart(),
        }
    }
}

impl SchedulerConfig {
    /// Sets the worker count.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the idle poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Sets the shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

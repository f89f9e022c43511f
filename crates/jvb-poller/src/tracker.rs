//! Poll scheduling with exponential backoff.

use std::time::Duration;

use tracing::{debug, warn};

/// Failures after which a target is reported as unreachable.
const UNREACHABLE_THRESHOLD: u32 = 3;

/// Tracks consecutive fetch results for a single target.
#[derive(Debug)]
pub struct PollTracker {
    /// Consecutive failure count.
    consecutive_failures: u32,
    /// Current wait before the next fetch.
    current_backoff: Duration,
    /// Configured poll interval.
    base_interval: Duration,
    /// Maximum backoff.
    max_backoff: Duration,
}

impl PollTracker {
    pub fn new(interval: Duration) -> Self {
        Self {
            consecutive_failures: 0,
            current_backoff: interval,
            base_interval: interval,
            max_backoff: Duration::from_secs(60).max(interval),
        }
    }

    pub fn record_success(&mut self) {
        if self.consecutive_failures >= UNREACHABLE_THRESHOLD {
            debug!(failures = self.consecutive_failures, "target reachable again");
        }
        self.consecutive_failures = 0;
        self.current_backoff = self.base_interval;
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures += 1;
        // Exponential backoff: double the interval up to max.
        self.current_backoff = (self.current_backoff * 2).min(self.max_backoff);

        if self.consecutive_failures == UNREACHABLE_THRESHOLD {
            warn!(
                failures = self.consecutive_failures,
                backoff_secs = self.current_backoff.as_secs(),
                "target unreachable"
            );
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Wait before the next fetch.
    pub fn next_interval(&self) -> Duration {
        self.current_backoff
    }
}

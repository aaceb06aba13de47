//! Reconnect policy for the event stream
//!
//! Capped exponential backoff. Unlike request retries, the schedule here is
//! part of the component contract: attempt `n` waits `initial * 2^n` capped
//! at `max_delay`, with no jitter, so a flapping connection backs off
//! predictably (1s, 2s, 4s, 8s, 16s, 30s, 30s, ...).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for reconnect delays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect attempt
    pub initial_delay: Duration,
    /// Ceiling for the exponential schedule
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before reconnect attempt `attempt` (0-indexed), saturating at
    /// `max_delay` for any attempt count.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let Some(factor) = 1u32.checked_shl(attempt) else {
            return self.max_delay;
        };
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

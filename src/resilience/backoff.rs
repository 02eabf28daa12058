//! Exponential backoff for failed nodes.

use rand::Rng;
use std::time::Duration;

use crate::resilience::timeouts::Deadline;

/// First backoff step.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Retry counter ceiling. The delay stops doubling here.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Backoff cap used when a call has no timeout.
pub const NO_TIMEOUT_BACKOFF_CAP: Duration = Duration::from_secs(10);

/// Parameters of the per-node exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_retries: u32,
    pub no_timeout_cap: Duration,
    /// Add up to 10% random jitter to each delay.
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_retries: DEFAULT_MAX_RETRIES,
            no_timeout_cap: NO_TIMEOUT_BACKOFF_CAP,
            jitter: false,
        }
    }
}

impl BackoffPolicy {
    /// Delay applied after a failure, given the node's retry count before
    /// this failure: `initial_delay * 2^retries`, never above `cap`.
    pub fn delay(&self, retries: u32, cap: Duration) -> Duration {
        let exponent = retries.min(self.max_retries).min(31);
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(exponent));
        let delay = if self.jitter { with_jitter(delay) } else { delay };
        delay.min(cap)
    }

    /// Backoff cap for a call: half its timeout, or `no_timeout_cap`.
    pub fn cap_for(&self, deadline: &Deadline) -> Duration {
        match deadline.timeout() {
            Some(timeout) => timeout / 2,
            None => self.no_timeout_cap,
        }
    }
}

fn with_jitter(delay: Duration) -> Duration {
    let range_ms = u64::try_from(delay.as_millis() / 10).unwrap_or(u64::MAX);
    if range_ms == 0 {
        return delay;
    }
    delay.saturating_add(Duration::from_millis(rand::thread_rng().gen_range(0..range_ms)))
}

//! Deadline tracking for a single driver call.

use std::time::Duration;
use tokio::time::Instant;

/// Time budget of one call, shared by every attempt it makes.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    timeout: Option<Duration>,
}

impl Deadline {
    /// Start the clock now. `None` means no deadline.
    pub fn start(timeout: Option<Duration>) -> Self {
        Self::starting_at(Instant::now(), timeout)
    }

    pub fn starting_at(started: Instant, timeout: Option<Duration>) -> Self {
        Self { started, timeout }
    }

    pub fn unbounded() -> Self {
        Self::start(None)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Instant the budget runs out. `None` when unbounded, including a
    /// budget too large to represent as an instant.
    pub fn not_after(&self) -> Option<Instant> {
        self.timeout.and_then(|t| self.started.checked_add(t))
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Budget left at `now`, `None` when unbounded.
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        self.not_after()
            .map(|not_after| not_after.saturating_duration_since(now))
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.remaining_at(Instant::now())
    }

    /// True once no budget is left. Never true when unbounded.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.remaining_at(now).is_some_and(|r| r.is_zero())
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Whether waiting `wait` from `now` would reach the deadline.
    pub fn would_expire(&self, now: Instant, wait: Duration) -> bool {
        self.remaining_at(now).is_some_and(|r| wait >= r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_deadline() {
        let t0 = Instant::now();
        let deadline = Deadline::starting_at(t0, Some(Duration::from_secs(2)));

        assert_eq!(deadline.not_after(), Some(t0 + Duration::from_secs(2)));
        assert_eq!(deadline.remaining_at(t0 + Duration::from_millis(500)), Some(Duration::from_millis(1500)));
        assert!(!deadline.is_expired_at(t0 + Duration::from_millis(1999)));
        assert!(deadline.is_expired_at(t0 + Duration::from_secs(3)));
        assert_eq!(deadline.remaining_at(t0 + Duration::from_secs(3)), Some(Duration::ZERO));

        assert!(deadline.would_expire(t0, Duration::from_secs(2)));
        assert!(!deadline.would_expire(t0, Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_unbounded_deadline_never_expires() {
        let t0 = Instant::now();
        let deadline = Deadline::starting_at(t0, None);
        assert_eq!(deadline.remaining_at(t0 + Duration::from_secs(86_400)), None);
        assert!(!deadline.is_expired_at(t0 + Duration::from_secs(86_400)));
        assert!(!deadline.would_expire(t0, Duration::from_secs(86_400)));
    }

    #[tokio::test]
    async fn test_huge_budget_behaves_as_unbounded() {
        let t0 = Instant::now();
        let deadline = Deadline::starting_at(t0, Some(Duration::MAX));
        assert_eq!(deadline.not_after(), None);
        assert_eq!(deadline.remaining_at(t0), None);
        assert!(!deadline.is_expired_at(t0 + Duration::from_secs(86_400)));
        assert!(!deadline.would_expire(t0, Duration::MAX));
    }
}

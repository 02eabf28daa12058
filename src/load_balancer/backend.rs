//! Per-node health record.
//!
//! # Responsibilities
//! - Pair a node connection with its backoff schedule
//! - Count consecutive failures to drive exponential backoff
//! - Reset on success

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::net::connection::Connection;

/// Backoff horizon used when `now + delay` does not fit in an instant.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Health record of one node.
#[derive(Debug)]
pub struct NodeHealth {
    connection: Arc<Connection>,
    retries: u32,
    next_available_at: Option<Instant>,
}

impl NodeHealth {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection: Arc::new(connection),
            retries: 0,
            next_available_at: None,
        }
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Consecutive failures since the last success.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn next_available_at(&self) -> Option<Instant> {
        self.next_available_at
    }

    pub fn is_available(&self, now: Instant) -> bool {
        self.next_available_at.map_or(true, |at| now >= at)
    }

    /// Time until the node leaves backoff, zero if it already has.
    pub fn wait_at(&self, now: Instant) -> Duration {
        self.next_available_at
            .map_or(Duration::ZERO, |at| at.saturating_duration_since(now))
    }

    pub fn mark_success(&mut self) {
        self.retries = 0;
        self.next_available_at = None;
    }

    /// Put the node in backoff for `delay` and bump the retry counter,
    /// saturating at `max_retries`.
    pub fn mark_failure(&mut self, now: Instant, delay: Duration, max_retries: u32) {
        let until = now
            .checked_add(delay)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        self.next_available_at = Some(until);
        self.retries = self.retries.saturating_add(1).min(max_retries);
    }

    pub fn status_at(&self, now: Instant) -> NodeStatus {
        NodeStatus {
            endpoint: self.connection.endpoint().to_string(),
            retries: self.retries,
            backoff_remaining_ms: self.wait_at(now).as_millis() as u64,
        }
    }
}

/// Point-in-time view of a node, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub endpoint: String,
    pub retries: u32,
    pub backoff_remaining_ms: u64,
}

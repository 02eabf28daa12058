//! Driver metrics.
//!
//! # Metrics
//! - `ledger_driver_requests_total` (counter): attempts by node, outcome
//! - `ledger_driver_request_duration_seconds` (histogram): attempt latency by node
//! - `ledger_driver_node_backoff_seconds` (gauge): last backoff applied to a node
//! - `ledger_driver_timeouts_total` (counter): calls that ran out of budget

use std::time::Duration;
use tokio::time::Instant;

/// Outcome label of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    HttpError,
    ConnectionError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::HttpError => "http_error",
            Outcome::ConnectionError => "connection_error",
        }
    }
}

pub fn record_request(node: &str, outcome: Outcome, start: Instant) {
    ::metrics::counter!(
        "ledger_driver_requests_total",
        "node" => node.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    ::metrics::histogram!(
        "ledger_driver_request_duration_seconds",
        "node" => node.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_backoff(node: &str, delay: Duration) {
    ::metrics::gauge!("ledger_driver_node_backoff_seconds", "node" => node.to_string())
        .set(delay.as_secs_f64());
}

pub fn record_timeout() {
    ::metrics::counter!("ledger_driver_timeouts_total").increment(1);
}

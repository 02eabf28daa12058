//! Retrying request forwarder.
//!
//! # Responsibilities
//! - Run one logical request against the pool until it succeeds
//! - Enforce the overall time budget across attempts and backoff waits
//! - Classify failures: node failures move on, HTTP answers are final,
//!   local request errors leave the pool untouched

use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

use crate::load_balancer::pool::Pool;
use crate::net::{connection::Request, node::NodeDescriptor};
use crate::observability::metrics::{self, Outcome};
use crate::resilience::{BackoffPolicy, Deadline, RetryPolicy};
use crate::transport::error::{TransportError, TransportResult};

/// Transport tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransportOptions {
    /// Overall budget per call. `None` retries until success.
    pub timeout: Option<Duration>,
    pub backoff: BackoffPolicy,
    pub retry: RetryPolicy,
}

impl TransportOptions {
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Sends requests to a pool of nodes with failover.
#[derive(Debug)]
pub struct Transport {
    nodes: Vec<NodeDescriptor>,
    pool: Pool,
    options: TransportOptions,
}

impl Transport {
    pub fn new(nodes: Vec<NodeDescriptor>, options: TransportOptions) -> TransportResult<Self> {
        let pool = Pool::from_nodes(&nodes, options.backoff)?;
        tracing::debug!(
            nodes = nodes.len(),
            timeout_ms = options.timeout.map(|t| t.as_millis() as u64),
            "transport initialized"
        );
        Ok(Self {
            nodes,
            pool,
            options,
        })
    }

    pub fn nodes(&self) -> &[NodeDescriptor] {
        &self.nodes
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.options.timeout
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Send `request` and return the response data.
    ///
    /// The request's own timeout overrides the transport timeout. Errors
    /// are the first HTTP error answer, or [`TransportError::Timeout`]
    /// carrying every node failure once the budget is spent.
    pub async fn forward_request(&self, request: &Request) -> TransportResult<Value> {
        let deadline = Deadline::start(request.timeout_budget().or(self.options.timeout));
        let cap = self.options.backoff.cap_for(&deadline);
        let mut errors = Vec::new();
        let mut attempt: u32 = 0;

        while !deadline.is_expired() {
            let conn = self.pool.get_connection(&deadline);
            if conn.exceeds_deadline() {
                tracing::debug!(
                    node = %conn.endpoint(),
                    wait_ms = conn.wait().as_millis() as u64,
                    "next node leaves backoff after the deadline"
                );
                break;
            }
            if !conn.wait().is_zero() {
                tokio::time::sleep(conn.wait()).await;
            }

            attempt += 1;
            let started = Instant::now();
            let result = conn
                .connection()
                .request(request, deadline.remaining())
                .await;

            match result {
                Ok(response) => {
                    metrics::record_request(conn.endpoint(), Outcome::Success, started);
                    self.pool.report_success(&conn);
                    return Ok(response.data);
                }
                Err(error) if self.options.retry.is_node_failure(&error) => {
                    metrics::record_request(conn.endpoint(), Outcome::ConnectionError, started);
                    let delay = self.pool.report_failure(&conn, cap);
                    tracing::warn!(
                        node = %conn.endpoint(),
                        attempt,
                        backoff_ms = delay.as_millis() as u64,
                        error = %error,
                        "node request failed, trying next node"
                    );
                    errors.push(error);
                }
                Err(error) if error.http().is_some() => {
                    metrics::record_request(conn.endpoint(), Outcome::HttpError, started);
                    self.pool.report_success(&conn);
                    return Err(error);
                }
                // Nothing reached the node; leave its health and the cursor alone.
                Err(error) => {
                    tracing::debug!(node = %conn.endpoint(), error = %error, "request rejected before sending");
                    return Err(error);
                }
            }
        }

        metrics::record_timeout();
        tracing::warn!(
            attempts = attempt,
            elapsed_ms = deadline.elapsed().as_millis() as u64,
            "request budget exhausted"
        );
        Err(TransportError::Timeout { errors })
    }
}

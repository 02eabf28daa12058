//! Which failures move a request on to the next node.

use crate::transport::error::TransportError;

/// Classifies attempt failures.
///
/// A connectivity failure always counts against the node and is retried on
/// another one. HTTP error answers prove the node is reachable and are
/// returned to the caller, except 503/504 when `retry_unavailable` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retry_unavailable: bool,
}

impl RetryPolicy {
    pub fn is_node_failure(&self, error: &TransportError) -> bool {
        match error {
            TransportError::Connection { .. } => true,
            TransportError::ServiceUnavailable(_) | TransportError::GatewayTimeout(_) => {
                self.retry_unavailable
            }
            _ => false,
        }
    }
}

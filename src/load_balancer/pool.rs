//! Node pool.
//!
//! # Responsibilities
//! - Own one connection and health record per node
//! - Hand out nodes through the picker, skipping nodes in backoff
//! - Apply success and failure reports to the node that was used

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::load_balancer::{
    backend::{NodeHealth, NodeStatus},
    round_robin::RoundRobinPicker,
    Picker,
};
use crate::net::{connection::Connection, node::NodeDescriptor};
use crate::observability::metrics;
use crate::resilience::{backoff::BackoffPolicy, timeouts::Deadline};
use crate::transport::error::{TransportError, TransportResult};

/// A node selected for one attempt.
#[derive(Debug, Clone)]
pub struct PooledConnection {
    index: usize,
    connection: Arc<Connection>,
    wait: Duration,
    exceeds_deadline: bool,
}

impl PooledConnection {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn endpoint(&self) -> &str {
        self.connection.endpoint()
    }

    /// How long the caller must wait before using this node.
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// The node only leaves backoff at or after the call's deadline.
    pub fn exceeds_deadline(&self) -> bool {
        self.exceeds_deadline
    }
}

#[derive(Debug)]
struct PoolState {
    nodes: Vec<NodeHealth>,
    picker: Box<dyn Picker>,
}

/// Thread-safe set of nodes with per-node backoff.
#[derive(Debug)]
pub struct Pool {
    state: Mutex<PoolState>,
    backoff: BackoffPolicy,
}

impl Pool {
    /// Create a round-robin pool. Fails on an empty connection list.
    pub fn new(connections: Vec<Connection>, backoff: BackoffPolicy) -> TransportResult<Self> {
        Self::with_picker(connections, backoff, Box::new(RoundRobinPicker::new()))
    }

    pub fn with_picker(
        connections: Vec<Connection>,
        backoff: BackoffPolicy,
        picker: Box<dyn Picker>,
    ) -> TransportResult<Self> {
        if connections.is_empty() {
            return Err(TransportError::NoNodes);
        }
        Ok(Self {
            state: Mutex::new(PoolState {
                nodes: connections.into_iter().map(NodeHealth::new).collect(),
                picker,
            }),
            backoff,
        })
    }

    /// Open a connection per node and pool them.
    pub fn from_nodes(nodes: &[NodeDescriptor], backoff: BackoffPolicy) -> TransportResult<Self> {
        let connections = nodes
            .iter()
            .map(Connection::new)
            .collect::<TransportResult<Vec<_>>>()?;
        Self::new(connections, backoff)
    }

    pub fn len(&self) -> usize {
        self.state().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().nodes.is_empty()
    }

    pub fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// Select the node for the next attempt of a call bounded by `deadline`.
    pub fn get_connection(&self, deadline: &Deadline) -> PooledConnection {
        self.get_connection_at(Instant::now(), deadline)
    }

    pub fn get_connection_at(&self, now: Instant, deadline: &Deadline) -> PooledConnection {
        let mut state = self.state();
        let PoolState { nodes, picker } = &mut *state;
        let pick = picker.pick(nodes, now);
        PooledConnection {
            index: pick.index,
            connection: nodes[pick.index].connection().clone(),
            wait: pick.wait,
            exceeds_deadline: deadline.would_expire(now, pick.wait),
        }
    }

    /// The node answered. Clears its backoff and moves the cursor on.
    pub fn report_success(&self, conn: &PooledConnection) {
        let mut state = self.state();
        let PoolState { nodes, picker } = &mut *state;
        if let Some(node) = nodes.get_mut(conn.index) {
            node.mark_success();
        }
        picker.advance(nodes.len());
    }

    /// The node could not be reached. Puts it in backoff, bounded by `cap`,
    /// moves the cursor on, and returns the delay applied.
    pub fn report_failure(&self, conn: &PooledConnection, cap: Duration) -> Duration {
        self.report_failure_at(Instant::now(), conn, cap)
    }

    pub fn report_failure_at(&self, now: Instant, conn: &PooledConnection, cap: Duration) -> Duration {
        let mut state = self.state();
        let PoolState { nodes, picker } = &mut *state;
        let delay = match nodes.get_mut(conn.index) {
            Some(node) => {
                let delay = self.backoff.delay(node.retries(), cap);
                node.mark_failure(now, delay, self.backoff.max_retries);
                tracing::debug!(
                    node = %conn.endpoint(),
                    retries = node.retries(),
                    backoff_ms = delay.as_millis() as u64,
                    "node placed in backoff"
                );
                delay
            }
            None => Duration::ZERO,
        };
        picker.advance(nodes.len());
        metrics::record_backoff(conn.endpoint(), delay);
        delay
    }

    /// Current health of every node.
    pub fn snapshot(&self) -> Vec<NodeStatus> {
        let now = Instant::now();
        self.state().nodes.iter().map(|n| n.status_at(now)).collect()
    }

    // Health records stay consistent even if a holder panicked.
    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

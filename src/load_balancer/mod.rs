//! Node selection subsystem.
//!
//! # Data Flow
//! ```text
//! Transport asks for a node (with the call's deadline)
//!     → pool.rs (lock node state, read the clock once)
//!     → Picker strategy:
//!         - round_robin.rs (first available node from the cursor,
//!           else the node that recovers soonest plus how long to wait)
//!     → PooledConnection handed back to the transport
//!     → report_success / report_failure update backend.rs health records
//! ```
//!
//! # Design Decisions
//! - Selection never blocks; waiting for a backed-off node is the caller's job
//! - Pool state sits behind one mutex, never held across an await
//! - Picker is a trait so the rotation strategy can be swapped

pub mod backend;
pub mod pool;
pub mod round_robin;

use std::fmt::Debug;
use std::time::Duration;
use tokio::time::Instant;

use crate::load_balancer::backend::NodeHealth;

pub use backend::NodeStatus;
pub use pool::{Pool, PooledConnection};
pub use round_robin::RoundRobinPicker;

/// Outcome of a selection: which node, and how long until it may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pick {
    pub index: usize,
    /// Zero when the node is available right away.
    pub wait: Duration,
}

/// Node selection strategy.
pub trait Picker: Send + Debug {
    /// Choose a node from a non-empty slice.
    fn pick(&mut self, nodes: &[NodeHealth], now: Instant) -> Pick;

    /// Move past the current node after its outcome was reported.
    fn advance(&mut self, len: usize);
}

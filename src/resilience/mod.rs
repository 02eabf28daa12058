//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! forward_request:
//!     → timeouts.rs (deadline for the whole call, backoff cap derived from it)
//!     → attempt on picked node
//!     → On failure: retries.rs (is this a node failure?)
//!         yes → backoff.rs (delay before the node may be picked again)
//!         no  → surface to caller
//! ```
//!
//! # Design Decisions
//! - Every call has a deadline, unbounded only when no timeout is configured
//! - Backoff is tracked per node, not per request
//! - Only connectivity failures count against a node by default

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use backoff::BackoffPolicy;
pub use retries::RetryPolicy;
pub use timeouts::Deadline;

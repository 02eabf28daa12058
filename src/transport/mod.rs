//! Request transport across a pool of nodes.
//!
//! # Data Flow
//! ```text
//! forward_request(request)
//!     → Deadline::start(request timeout or transport timeout)
//!     → loop until success, non-retryable error, or deadline:
//!         pool.get_connection(deadline)
//!             → wait out the node's backoff (or stop if past the deadline)
//!         connection.request(request, remaining budget)
//!             Ok           → report_success → return data
//!             node failure → report_failure → collect error, next node
//!             HTTP error   → report_success → return error
//!     → Timeout { errors }
//! ```

pub mod error;
pub mod forward;

pub use error::{HttpError, TransportError, TransportResult};
pub use forward::{Transport, TransportOptions};

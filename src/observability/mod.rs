//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pool, transport, ledger client produce:
//!     → tracing events (node, attempt, backoff_ms, error fields)
//!     → metrics.rs (counters, gauges, histograms via the `metrics` facade)
//!
//! Consumers:
//!     → logging.rs installs a stderr subscriber for the CLI
//!     → applications install their own subscriber / metrics recorder
//! ```
//!
//! # Design Decisions
//! - The library never installs a global subscriber or recorder on its own
//! - Without a recorder every metric call is a no-op

pub mod logging;
pub mod metrics;

pub use logging::init_logging;

//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! User node input ("localhost", "https://host/path", { endpoint, headers })
//!     → node.rs (normalize to scheme://host:port[/path], merge headers)
//!     → connection.rs (one persistent HTTP session per node)
//!     → single request → HttpResponse { status, headers, data }
//! ```
//!
//! # Design Decisions
//! - A connection never retries; retry policy belongs to the transport
//! - Connectivity failures and HTTP status answers are distinct error kinds
//! - Node headers become session defaults, per-call headers win on conflict

pub mod connection;
pub mod node;

pub use connection::{Connection, HttpResponse, Request};
pub use node::{normalize_nodes, normalize_url, Headers, NodeDescriptor, NodeError, NodeSpec};

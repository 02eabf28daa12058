//! Client driver for a federated ledger database.
//!
//! # Architecture Overview
//!
//! ```text
//!   Application code
//!        │
//!        ▼
//!   ┌──────────────┐   prepare / fulfill    ┌─────────────┐
//!   │ LedgerClient │───────────────────────▶│   ledger    │ (payloads, signing)
//!   │  endpoints   │                        └─────────────┘
//!   └──────┬───────┘
//!          │ Request
//!          ▼
//!   ┌──────────────┐  deadline, retries     ┌─────────────┐
//!   │  transport   │───────────────────────▶│ resilience  │
//!   └──────┬───────┘                        └─────────────┘
//!          │ get_connection / report_*
//!          ▼
//!   ┌──────────────┐  round robin + backoff
//!   │load_balancer │
//!   │ pool, picker │
//!   └──────┬───────┘
//!          │
//!          ▼
//!   ┌──────────────┐       HTTP/JSON        ┌─────────────┐
//!   │net/connection│───────────────────────▶│ federation  │
//!   └──────────────┘                        │    node     │
//!                                           └─────────────┘
//! ```

pub mod config;
pub mod ledger;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod transport;

pub use config::DriverConfig;
pub use ledger::{Keypair, LedgerClient, LedgerError, Operation, SendMode, Transaction};
pub use net::{NodeDescriptor, NodeSpec, Request};
pub use transport::{Transport, TransportError, TransportOptions, TransportResult};

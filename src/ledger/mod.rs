//! Ledger driver subsystem.
//!
//! # Data Flow
//! ```text
//! PrepareRequest (signers, recipients, asset, metadata, inputs)
//!     → transaction.rs (unsigned CREATE / TRANSFER payload, id)
//!     → wallet.rs (keypairs from arguments or LEDGER_PRIVATE_KEY)
//!     → transaction.rs (fulfill: sign inputs, recompute id)
//!     → client.rs / endpoints.rs (POST /transactions?mode=...)
//! ```
//!
//! # Security Constraints
//! - Private keys never leave the process and are never logged
//! - Preparation and signing are offline operations

pub mod client;
pub mod endpoints;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{LedgerClient, API_PREFIX};
pub use endpoints::{AssetsEndpoint, BlocksEndpoint, MetadataEndpoint, OutputsEndpoint, TransactionsEndpoint};
pub use transaction::{fulfill_transaction, prepare_transaction, sign_transaction, transaction_id};
pub use types::{
    Asset, Input, LedgerError, LedgerResult, Operation, Output, OutputLink, PrepareRequest, Recipient,
    SendMode, Transaction,
};
pub use wallet::Keypair;

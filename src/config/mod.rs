//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DriverConfig (validated, immutable)
//!     → LedgerClient::from_config / TransportOptions
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file is a valid config
//! - Validation separates syntactic (serde) from semantic checks
//! - Programmatic construction skips the file entirely

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{BackoffConfig, DriverConfig, ObservabilityConfig, TransportConfig};
pub use validation::{validate_config, ValidationError};

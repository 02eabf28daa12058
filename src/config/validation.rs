//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every node endpoint normalizes
//! - Validate value ranges (timeouts > 0, backoff steps > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: DriverConfig → Result<(), Vec<ValidationError>>

use reqwest::header::HeaderName;
use thiserror::Error;

use crate::config::schema::DriverConfig;
use crate::net::node::{normalize_url, NodeError, NodeSpec};

/// Upper bound for `backoff.max_retries`; 2^31 already overflows any useful delay.
pub const MAX_RETRIES_LIMIT: u32 = 31;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("nodes[{index}]: {source}")]
    InvalidNode { index: usize, source: NodeError },

    #[error("header name '{0}' is not a valid HTTP header")]
    InvalidHeaderName(String),

    #[error("transport.timeout_secs must be a positive number, got {0}")]
    InvalidTimeout(f64),

    #[error("backoff.initial_delay_ms must be greater than zero")]
    ZeroInitialDelay,

    #[error("backoff.max_retries must be at most {max}, got {0}", max = MAX_RETRIES_LIMIT)]
    MaxRetriesTooLarge(u32),

    #[error("backoff.no_timeout_cap_secs must be greater than zero")]
    ZeroBackoffCap,

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    UnknownLogLevel(String),
}

/// Check a config for semantic errors.
pub fn validate_config(config: &DriverConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (index, node) in config.nodes.iter().enumerate() {
        let (endpoint, headers) = match node {
            NodeSpec::Url(url) => (url, None),
            NodeSpec::Detailed { endpoint, headers } => (endpoint, Some(headers)),
        };
        if let Err(source) = normalize_url(endpoint) {
            errors.push(ValidationError::InvalidNode { index, source });
        }
        for name in headers.into_iter().flat_map(|h| h.keys()) {
            check_header_name(name, &mut errors);
        }
    }
    for name in config.headers.keys() {
        check_header_name(name, &mut errors);
    }

    if let Some(timeout) = config.transport.timeout_secs {
        if !(timeout.is_finite() && timeout > 0.0) {
            errors.push(ValidationError::InvalidTimeout(timeout));
        }
    }

    if config.backoff.initial_delay_ms == 0 {
        errors.push(ValidationError::ZeroInitialDelay);
    }
    if config.backoff.max_retries > MAX_RETRIES_LIMIT {
        errors.push(ValidationError::MaxRetriesTooLarge(config.backoff.max_retries));
    }
    if config.backoff.no_timeout_cap_secs == 0 {
        errors.push(ValidationError::ZeroBackoffCap);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_header_name(name: &str, errors: &mut Vec<ValidationError>) {
    if HeaderName::from_bytes(name.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(name.to_string()));
    }
}

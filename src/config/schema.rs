//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::net::node::{Headers, NodeSpec};
use crate::resilience::{BackoffPolicy, RetryPolicy};
use crate::transport::forward::TransportOptions;

/// Root configuration of the driver.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct DriverConfig {
    /// Federation nodes. Empty means the local default node.
    pub nodes: Vec<NodeSpec>,

    /// Headers sent to every node, under node-specific headers.
    pub headers: Headers,

    pub transport: TransportConfig,

    pub backoff: BackoffConfig,

    pub observability: ObservabilityConfig,
}

impl DriverConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.transport
            .timeout_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            timeout: self.timeout(),
            backoff: BackoffPolicy {
                initial_delay: Duration::from_millis(self.backoff.initial_delay_ms),
                max_retries: self.backoff.max_retries,
                no_timeout_cap: Duration::from_secs(self.backoff.no_timeout_cap_secs),
                jitter: self.backoff.jitter,
            },
            retry: RetryPolicy {
                retry_unavailable: self.transport.retry_unavailable,
            },
        }
    }
}

/// Request transport settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    /// Overall budget per call in seconds. Unset retries until success.
    pub timeout_secs: Option<f64>,

    /// Treat 503 and 504 answers as node failures and try another node.
    pub retry_unavailable: bool,
}

/// Per-node backoff settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BackoffConfig {
    /// First backoff step in milliseconds.
    pub initial_delay_ms: u64,

    /// Failures after which the delay stops doubling.
    pub max_retries: u32,

    /// Backoff cap in seconds for calls without a timeout.
    pub no_timeout_cap_secs: u64,

    /// Add up to 10% random jitter.
    pub jitter: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 500,
            max_retries: 10,
            no_timeout_cap_secs: 10,
            jitter: false,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log level when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

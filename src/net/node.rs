//! Node descriptors and endpoint normalization.
//!
//! # Responsibilities
//! - Accept nodes as bare hosts, full URLs or `{ endpoint, headers }` objects
//! - Normalize every endpoint to `scheme://host:port[/path]`
//! - Overlay driver-wide headers with per-node headers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

/// Node used when no node is configured.
pub const DEFAULT_NODE: &str = "http://localhost:9984";

/// Port assumed for `http` endpoints without an explicit port.
pub const DEFAULT_PORT: u16 = 9984;

/// Port assumed for `https` endpoints without an explicit port.
pub const DEFAULT_TLS_PORT: u16 = 443;

/// Header name → value mapping.
pub type Headers = BTreeMap<String, String>;

/// Errors raised while normalizing node input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// The endpoint could not be parsed or uses an unsupported scheme.
    #[error("invalid node URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Result type for node normalization.
pub type NodeResult<T> = Result<T, NodeError>;

/// A node as given by the user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NodeSpec {
    /// Bare hostname or URL.
    Url(String),
    /// Endpoint with node-specific headers.
    Detailed {
        endpoint: String,
        #[serde(default)]
        headers: Headers,
    },
}

impl From<&str> for NodeSpec {
    fn from(url: &str) -> Self {
        NodeSpec::Url(url.to_string())
    }
}

impl From<String> for NodeSpec {
    fn from(url: String) -> Self {
        NodeSpec::Url(url)
    }
}

/// A normalized node: canonical endpoint plus the headers sent with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDescriptor {
    pub endpoint: String,
    pub headers: Headers,
}

impl NodeDescriptor {
    /// Normalize a single endpoint with no extra headers.
    pub fn new(endpoint: &str) -> NodeResult<Self> {
        Ok(Self {
            endpoint: normalize_url(endpoint)?,
            headers: Headers::new(),
        })
    }
}

/// Normalize a user supplied endpoint.
///
/// The scheme defaults to `http`. The port defaults to 9984, or 443 for
/// `https`, unless one is given explicitly. Query and fragment are dropped.
pub fn normalize_url(input: &str) -> NodeResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_NODE.to_string());
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let invalid = |reason: String| NodeError::InvalidUrl {
        url: input.to_string(),
        reason,
    };

    let url = Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", scheme)));
    }
    let host = url
        .host_str()
        .ok_or_else(|| invalid("missing host".to_string()))?;

    // `Url::port` hides ports equal to the scheme default, so `http://host:80`
    // must be detected from the raw authority.
    let port = match url.port() {
        Some(port) => port,
        None if has_explicit_port(&with_scheme) => url.port_or_known_default().unwrap_or(DEFAULT_PORT),
        None if scheme == "https" => DEFAULT_TLS_PORT,
        None => DEFAULT_PORT,
    };

    let path = url.path().trim_end_matches('/');
    Ok(format!("{}://{}:{}{}", scheme, host, port, path))
}

/// Check the authority component of a URL for a `:port` suffix.
fn has_explicit_port(url: &str) -> bool {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = rest
        .split(|c| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);

    if host_port.starts_with('[') {
        // IPv6 literal: only a colon after the closing bracket is a port
        host_port
            .split_once(']')
            .is_some_and(|(_, tail)| tail.starts_with(':'))
    } else {
        host_port.contains(':')
    }
}

/// Normalize a list of nodes.
///
/// An empty list yields the default node. Each node carries `headers`
/// overlaid with its own headers, node headers winning on conflict.
pub fn normalize_nodes(specs: &[NodeSpec], headers: &Headers) -> NodeResult<Vec<NodeDescriptor>> {
    if specs.is_empty() {
        return Ok(vec![NodeDescriptor {
            endpoint: DEFAULT_NODE.to_string(),
            headers: headers.clone(),
        }]);
    }

    specs
        .iter()
        .map(|spec| {
            let (endpoint, node_headers) = match spec {
                NodeSpec::Url(url) => (url.as_str(), None),
                NodeSpec::Detailed { endpoint, headers } => (endpoint.as_str(), Some(headers)),
            };
            let mut merged = headers.clone();
            if let Some(node_headers) = node_headers {
                merged.extend(node_headers.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Ok(NodeDescriptor {
                endpoint: normalize_url(endpoint)?,
                headers: merged,
            })
        })
        .collect()
}

//! Ledger client entry point.
//!
//! # Responsibilities
//! - Normalize the node list and build the transport
//! - Expose the HTTP API as endpoint groups
//! - Serve root and API info documents

use serde_json::Value;
use std::time::Duration;

use crate::config::DriverConfig;
use crate::ledger::endpoints::{
    AssetsEndpoint, BlocksEndpoint, MetadataEndpoint, OutputsEndpoint, TransactionsEndpoint,
};
use crate::net::{
    connection::Request,
    node::{normalize_nodes, Headers, NodeDescriptor, NodeSpec},
};
use crate::transport::{
    error::TransportResult,
    forward::{Transport, TransportOptions},
};

/// Prefix of the versioned HTTP API.
pub const API_PREFIX: &str = "/api/v1";

/// Client for a federation of ledger nodes.
#[derive(Debug)]
pub struct LedgerClient {
    transport: Transport,
    api_prefix: String,
}

impl LedgerClient {
    /// Connect to `nodes` (the local default node if empty) with the given
    /// overall timeout and default retry behavior.
    pub fn new(nodes: &[NodeSpec], timeout: Option<Duration>) -> TransportResult<Self> {
        Self::with_options(nodes, &Headers::new(), TransportOptions::with_timeout(timeout))
    }

    /// Connect with driver-wide `headers` merged under each node's headers.
    pub fn with_options(
        nodes: &[NodeSpec],
        headers: &Headers,
        options: TransportOptions,
    ) -> TransportResult<Self> {
        let nodes = normalize_nodes(nodes, headers)?;
        Ok(Self::from_transport(Transport::new(nodes, options)?))
    }

    pub fn from_config(config: &DriverConfig) -> TransportResult<Self> {
        Self::with_options(&config.nodes, &config.headers, config.transport_options())
    }

    pub fn from_transport(transport: Transport) -> Self {
        tracing::info!(
            nodes = ?transport.nodes().iter().map(|n| n.endpoint.as_str()).collect::<Vec<_>>(),
            "ledger client initialized"
        );
        Self {
            transport,
            api_prefix: API_PREFIX.to_string(),
        }
    }

    /// Normalized nodes, in configuration order.
    pub fn nodes(&self) -> &[NodeDescriptor] {
        self.transport.nodes()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    pub fn transactions(&self) -> TransactionsEndpoint<'_> {
        TransactionsEndpoint::new(self)
    }

    pub fn outputs(&self) -> OutputsEndpoint<'_> {
        OutputsEndpoint::new(self)
    }

    pub fn blocks(&self) -> BlocksEndpoint<'_> {
        BlocksEndpoint::new(self)
    }

    pub fn assets(&self) -> AssetsEndpoint<'_> {
        AssetsEndpoint::new(self)
    }

    pub fn metadata(&self) -> MetadataEndpoint<'_> {
        MetadataEndpoint::new(self)
    }

    /// Root document of a node: server version and API links.
    pub async fn info(&self) -> TransportResult<Value> {
        self.transport.forward_request(&Request::get().path("/")).await
    }

    /// Description of the versioned API.
    pub async fn api_info(&self) -> TransportResult<Value> {
        self.transport
            .forward_request(&Request::get().path(self.api_prefix.clone()))
            .await
    }
}

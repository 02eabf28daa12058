//! HTTP API endpoint groups.
//!
//! Every group borrows the client's transport and can carry extra headers
//! that are sent with each of its requests.

use serde_json::Value;

use crate::ledger::client::LedgerClient;
use crate::ledger::transaction::{fulfill_transaction, prepare_transaction};
use crate::ledger::types::{LedgerResult, Operation, PrepareRequest, SendMode, Transaction};
use crate::net::{connection::Request, node::Headers};
use crate::transport::error::TransportResult;

#[derive(Debug, Clone)]
struct Scope<'a> {
    client: &'a LedgerClient,
    path: &'static str,
    headers: Headers,
}

impl<'a> Scope<'a> {
    fn new(client: &'a LedgerClient, path: &'static str) -> Self {
        Self {
            client,
            path,
            headers: Headers::new(),
        }
    }

    fn collection(&self) -> String {
        format!("{}{}/", self.client.api_prefix(), self.path)
    }

    fn member(&self, id: &str) -> String {
        format!("{}{}/{}", self.client.api_prefix(), self.path, id)
    }

    fn request(&self, request: Request) -> Request {
        request.headers(&self.headers)
    }

    async fn send(&self, request: Request) -> TransportResult<Value> {
        self.client.transport().forward_request(&self.request(request)).await
    }
}

macro_rules! with_headers {
    ($endpoint:ident) => {
        impl<'a> $endpoint<'a> {
            /// Send `headers` with every request of this group.
            pub fn with_headers(mut self, headers: Headers) -> Self {
                self.scope.headers.extend(headers);
                self
            }
        }
    };
}

/// `/transactions` and `/statuses`.
#[derive(Debug, Clone)]
pub struct TransactionsEndpoint<'a> {
    scope: Scope<'a>,
}

with_headers!(TransactionsEndpoint);

impl<'a> TransactionsEndpoint<'a> {
    pub(crate) fn new(client: &'a LedgerClient) -> Self {
        Self {
            scope: Scope::new(client, "/transactions"),
        }
    }

    /// Build an unsigned transaction. No network access.
    pub fn prepare(request: PrepareRequest) -> LedgerResult<Transaction> {
        prepare_transaction(request)
    }

    /// Sign a prepared transaction. No network access.
    pub fn fulfill<K: AsRef<str>>(transaction: &Transaction, private_keys: &[K]) -> LedgerResult<Transaction> {
        fulfill_transaction(transaction, private_keys)
    }

    /// Transactions touching an asset, optionally filtered by operation.
    pub async fn get(&self, asset_id: &str, operation: Option<Operation>) -> TransportResult<Value> {
        let request = Request::get()
            .path(self.scope.collection())
            .param("asset_id", asset_id)
            .param_opt("operation", operation.map(|op| op.as_str()));
        self.scope.send(request).await
    }

    /// Submit a signed transaction.
    pub async fn send(&self, transaction: &Transaction, mode: SendMode) -> TransportResult<Value> {
        let request = Request::post()
            .path(self.scope.collection())
            .param("mode", mode.as_query())
            .json(serde_json::to_value(transaction)?);
        self.scope.send(request).await
    }

    pub async fn send_async(&self, transaction: &Transaction) -> TransportResult<Value> {
        self.send(transaction, SendMode::Async).await
    }

    pub async fn send_sync(&self, transaction: &Transaction) -> TransportResult<Value> {
        self.send(transaction, SendMode::Sync).await
    }

    pub async fn send_commit(&self, transaction: &Transaction) -> TransportResult<Value> {
        self.send(transaction, SendMode::Commit).await
    }

    pub async fn retrieve(&self, txid: &str) -> TransportResult<Value> {
        self.scope.send(Request::get().path(self.scope.member(txid))).await
    }

    /// Processing status of a submitted transaction.
    pub async fn status(&self, txid: &str) -> TransportResult<Value> {
        let request = Request::get()
            .path(format!("{}/statuses", self.scope.client.api_prefix()))
            .param("tx_id", txid);
        self.scope.send(request).await
    }
}

/// `/outputs`.
#[derive(Debug, Clone)]
pub struct OutputsEndpoint<'a> {
    scope: Scope<'a>,
}

with_headers!(OutputsEndpoint);

impl<'a> OutputsEndpoint<'a> {
    pub(crate) fn new(client: &'a LedgerClient) -> Self {
        Self {
            scope: Scope::new(client, "/outputs"),
        }
    }

    /// Outputs owned by `public_key`. `spent` filters by spend state.
    pub async fn get(&self, public_key: &str, spent: Option<bool>) -> TransportResult<Value> {
        let request = Request::get()
            .path(self.scope.collection())
            .param("public_key", public_key)
            .param_opt("spent", spent);
        self.scope.send(request).await
    }
}

/// `/blocks`.
#[derive(Debug, Clone)]
pub struct BlocksEndpoint<'a> {
    scope: Scope<'a>,
}

with_headers!(BlocksEndpoint);

impl<'a> BlocksEndpoint<'a> {
    pub(crate) fn new(client: &'a LedgerClient) -> Self {
        Self {
            scope: Scope::new(client, "/blocks"),
        }
    }

    /// Heights of blocks containing `txid`.
    pub async fn get(&self, txid: &str) -> TransportResult<Value> {
        let request = Request::get()
            .path(self.scope.collection())
            .param("transaction_id", txid);
        self.scope.send(request).await
    }

    pub async fn retrieve(&self, height: u64) -> TransportResult<Value> {
        self.scope
            .send(Request::get().path(self.scope.member(&height.to_string())))
            .await
    }
}

/// `/assets`.
#[derive(Debug, Clone)]
pub struct AssetsEndpoint<'a> {
    scope: Scope<'a>,
}

with_headers!(AssetsEndpoint);

impl<'a> AssetsEndpoint<'a> {
    pub(crate) fn new(client: &'a LedgerClient) -> Self {
        Self {
            scope: Scope::new(client, "/assets"),
        }
    }

    /// Text search over asset data.
    pub async fn get(&self, search: &str, limit: Option<u32>) -> TransportResult<Value> {
        let request = Request::get()
            .path(self.scope.collection())
            .param("search", search)
            .param_opt("limit", limit);
        self.scope.send(request).await
    }
}

/// `/metadata`.
#[derive(Debug, Clone)]
pub struct MetadataEndpoint<'a> {
    scope: Scope<'a>,
}

with_headers!(MetadataEndpoint);

impl<'a> MetadataEndpoint<'a> {
    pub(crate) fn new(client: &'a LedgerClient) -> Self {
        Self {
            scope: Scope::new(client, "/metadata"),
        }
    }

    /// Text search over transaction metadata.
    pub async fn get(&self, search: &str, limit: Option<u32>) -> TransportResult<Value> {
        let request = Request::get()
            .path(self.scope.collection())
            .param("search", search)
            .param_opt("limit", limit);
        self.scope.send(request).await
    }
}

//! Ledger data model and error definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Transaction format version produced by this driver.
pub const TX_VERSION: &str = "2.0";

/// Errors raised while building or signing transactions.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// CREATE without any signer.
    #[error("at least one signer is required")]
    MissingSigners,

    /// TRANSFER without inputs to spend.
    #[error("TRANSFER requires at least one input")]
    MissingInputs,

    /// TRANSFER without recipients.
    #[error("TRANSFER requires at least one recipient")]
    MissingRecipients,

    /// Input that does not point at a previous output.
    #[error("input {0} does not reference a previous output")]
    InvalidInput(usize),

    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    #[error("recipient {0} has a zero amount")]
    InvalidAmount(usize),

    #[error("unknown operation '{0}', expected CREATE or TRANSFER")]
    UnknownOperation(String),

    #[error("unknown send mode '{0}', expected async, sync or commit")]
    UnknownMode(String),

    /// None of the supplied keys belongs to an owner of an input.
    #[error("no private key supplied for owner {0}")]
    MissingSigningKey(String),

    /// No key material available at all.
    #[error("keypair not found: {0}")]
    KeypairNotFound(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Transaction operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    #[default]
    Create,
    Transfer,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CREATE" => Ok(Operation::Create),
            "TRANSFER" => Ok(Operation::Transfer),
            _ => Err(LedgerError::UnknownOperation(s.to_string())),
        }
    }
}

/// How long a node waits before answering a submitted transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SendMode {
    /// Return once the transaction was accepted for processing.
    Async,
    /// Return once the transaction was checked.
    Sync,
    /// Return once the transaction was committed.
    #[default]
    Commit,
}

impl SendMode {
    /// Value of the `mode` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            SendMode::Async => "async",
            SendMode::Sync => "sync",
            SendMode::Commit => "commit",
        }
    }
}

impl FromStr for SendMode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "async" => Ok(SendMode::Async),
            "sync" => Ok(SendMode::Sync),
            "commit" => Ok(SendMode::Commit),
            _ => Err(LedgerError::UnknownMode(s.to_string())),
        }
    }
}

/// Asset of a transaction: inline data for CREATE, a link for TRANSFER.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Asset {
    Link { id: String },
    Data { data: Option<Value> },
}

impl Asset {
    pub fn data(data: Value) -> Self {
        Asset::Data { data: Some(data) }
    }

    pub fn link(id: impl Into<String>) -> Self {
        Asset::Link { id: id.into() }
    }
}

/// Reference to an output of a previous transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLink {
    pub transaction_id: String,
    pub output_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub owners_before: Vec<String>,
    pub fulfills: Option<OutputLink>,
    pub fulfillment: Option<String>,
}

impl Input {
    /// Input spending `output_index` of `transaction_id`.
    pub fn spend(transaction_id: impl Into<String>, output_index: u32, owners_before: Vec<String>) -> Self {
        Self {
            owners_before,
            fulfills: Some(OutputLink {
                transaction_id: transaction_id.into(),
                output_index,
            }),
            fulfillment: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionDetails {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subconditions: Vec<ConditionDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub details: ConditionDetails,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub public_keys: Vec<String>,
    /// Amounts travel as decimal strings.
    pub amount: String,
    pub condition: Condition,
}

/// A ledger transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<String>,
    pub version: String,
    pub operation: Operation,
    pub asset: Asset,
    pub metadata: Option<Value>,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

impl Transaction {
    /// Input spending output `index` of this transaction, owned by that
    /// output's public keys.
    pub fn spend_output(&self, index: u32) -> LedgerResult<Input> {
        let id = self
            .id
            .as_ref()
            .ok_or(LedgerError::InvalidInput(index as usize))?;
        let output = self
            .outputs
            .get(index as usize)
            .ok_or(LedgerError::InvalidInput(index as usize))?;
        Ok(Input::spend(id.clone(), index, output.public_keys.clone()))
    }
}

/// Who receives an output, and how much.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub public_keys: Vec<String>,
    pub amount: u64,
}

impl Recipient {
    pub fn new(public_keys: Vec<String>, amount: u64) -> Self {
        Self { public_keys, amount }
    }

    /// One owner, amount 1.
    pub fn single(public_key: impl Into<String>) -> Self {
        Self::new(vec![public_key.into()], 1)
    }
}

/// Arguments of transaction preparation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrepareRequest {
    pub operation: Operation,
    /// Owners issuing a CREATE. Ignored for TRANSFER.
    pub signers: Vec<String>,
    /// Defaults to the signers with amount 1 for CREATE.
    pub recipients: Vec<Recipient>,
    pub asset: Option<Asset>,
    pub metadata: Option<Value>,
    /// Outputs spent by a TRANSFER. Ignored for CREATE.
    pub inputs: Vec<Input>,
}

impl PrepareRequest {
    pub fn create(signers: Vec<String>) -> Self {
        Self {
            operation: Operation::Create,
            signers,
            ..Self::default()
        }
    }

    pub fn transfer(inputs: Vec<Input>, asset_id: impl Into<String>, recipients: Vec<Recipient>) -> Self {
        Self {
            operation: Operation::Transfer,
            inputs,
            recipients,
            asset: Some(Asset::link(asset_id)),
            ..Self::default()
        }
    }

    pub fn with_asset_data(mut self, data: Value) -> Self {
        self.asset = Some(Asset::data(data));
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_recipients(mut self, recipients: Vec<Recipient>) -> Self {
        self.recipients = recipients;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_parse_and_display() {
        assert_eq!("create".parse::<Operation>().unwrap(), Operation::Create);
        assert_eq!("TRANSFER".parse::<Operation>().unwrap(), Operation::Transfer);
        assert!("BURN".parse::<Operation>().is_err());
        assert_eq!(Operation::Transfer.to_string(), "TRANSFER");
        assert_eq!(serde_json::to_value(Operation::Create).unwrap(), json!("CREATE"));
    }

    #[test]
    fn test_send_mode() {
        assert_eq!(SendMode::default(), SendMode::Commit);
        assert_eq!("Sync".parse::<SendMode>().unwrap().as_query(), "sync");
        assert!(matches!("later".parse::<SendMode>(), Err(LedgerError::UnknownMode(_))));
    }

    #[test]
    fn test_asset_shapes() {
        assert_eq!(serde_json::to_value(Asset::link("abc")).unwrap(), json!({"id": "abc"}));
        assert_eq!(
            serde_json::to_value(Asset::Data { data: None }).unwrap(),
            json!({"data": null})
        );

        let link: Asset = serde_json::from_value(json!({"id": "abc"})).unwrap();
        assert_eq!(link, Asset::link("abc"));
        let data: Asset = serde_json::from_value(json!({"data": {"k": 1}})).unwrap();
        assert_eq!(data, Asset::data(json!({"k": 1})));
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::MissingSigningKey("0xabc".into());
        assert_eq!(err.to_string(), "no private key supplied for owner 0xabc");
    }
}

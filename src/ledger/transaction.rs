//! Transaction preparation and fulfillment.
//!
//! # Responsibilities
//! - Build unsigned CREATE and TRANSFER payloads from a `PrepareRequest`
//! - Derive output conditions from recipient public keys
//! - Sign every input with the owners' keys and compute the transaction id
//!
//! Ids and signatures are computed over a canonical JSON form: object keys
//! sorted, no whitespace, `id` null. Signatures additionally cover the
//! output an input spends.

use alloy::primitives::{hex, keccak256};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::ledger::types::{
    Asset, Condition, ConditionDetails, Input, LedgerError, LedgerResult, Operation, Output,
    PrepareRequest, Recipient, Transaction, TX_VERSION,
};
use crate::ledger::wallet::Keypair;

const SINGLE_KEY_CONDITION: &str = "ecdsa-secp256k1";
const THRESHOLD_CONDITION: &str = "threshold-sha-256";

/// Build an unsigned transaction.
pub fn prepare_transaction(request: PrepareRequest) -> LedgerResult<Transaction> {
    match request.operation {
        Operation::Create => prepare_create(request),
        Operation::Transfer => prepare_transfer(request),
    }
}

fn prepare_create(request: PrepareRequest) -> LedgerResult<Transaction> {
    if request.signers.is_empty() {
        return Err(LedgerError::MissingSigners);
    }

    let asset = match request.asset {
        None => Asset::Data { data: None },
        Some(asset @ Asset::Data { .. }) => asset,
        Some(Asset::Link { .. }) => {
            return Err(LedgerError::InvalidAsset(
                "CREATE takes asset data, not an asset id".to_string(),
            ))
        }
    };

    let recipients = if request.recipients.is_empty() {
        vec![Recipient::new(request.signers.clone(), 1)]
    } else {
        request.recipients
    };

    let mut tx = Transaction {
        id: None,
        version: TX_VERSION.to_string(),
        operation: Operation::Create,
        asset,
        metadata: request.metadata,
        inputs: vec![Input {
            owners_before: request.signers,
            fulfills: None,
            fulfillment: None,
        }],
        outputs: build_outputs(&recipients)?,
    };
    tx.id = Some(transaction_id(&tx)?);
    Ok(tx)
}

fn prepare_transfer(request: PrepareRequest) -> LedgerResult<Transaction> {
    if request.inputs.is_empty() {
        return Err(LedgerError::MissingInputs);
    }
    if request.recipients.is_empty() {
        return Err(LedgerError::MissingRecipients);
    }

    let asset = match request.asset {
        Some(asset @ Asset::Link { .. }) => asset,
        _ => {
            return Err(LedgerError::InvalidAsset(
                "TRANSFER requires the id of the asset being transferred".to_string(),
            ))
        }
    };

    let mut inputs = Vec::with_capacity(request.inputs.len());
    for (index, input) in request.inputs.into_iter().enumerate() {
        if input.fulfills.is_none() || input.owners_before.is_empty() {
            return Err(LedgerError::InvalidInput(index));
        }
        inputs.push(Input {
            fulfillment: None,
            ..input
        });
    }

    let mut tx = Transaction {
        id: None,
        version: TX_VERSION.to_string(),
        operation: Operation::Transfer,
        asset,
        metadata: request.metadata,
        inputs,
        outputs: build_outputs(&request.recipients)?,
    };
    tx.id = Some(transaction_id(&tx)?);
    Ok(tx)
}

fn build_outputs(recipients: &[Recipient]) -> LedgerResult<Vec<Output>> {
    recipients
        .iter()
        .enumerate()
        .map(|(index, recipient)| {
            if recipient.amount == 0 {
                return Err(LedgerError::InvalidAmount(index));
            }
            if recipient.public_keys.is_empty() {
                return Err(LedgerError::MissingRecipients);
            }
            Ok(Output {
                public_keys: recipient.public_keys.clone(),
                amount: recipient.amount.to_string(),
                condition: condition_for(&recipient.public_keys)?,
            })
        })
        .collect()
}

/// Single key: a plain signature condition. Several keys: all must sign.
fn condition_for(public_keys: &[String]) -> LedgerResult<Condition> {
    let single = |key: &String| ConditionDetails {
        kind: SINGLE_KEY_CONDITION.to_string(),
        public_key: Some(key.clone()),
        threshold: None,
        subconditions: Vec::new(),
    };

    let details = match public_keys {
        [key] => single(key),
        keys => ConditionDetails {
            kind: THRESHOLD_CONDITION.to_string(),
            public_key: None,
            threshold: Some(keys.len() as u32),
            subconditions: keys.iter().map(single).collect(),
        },
    };

    let digest = keccak256(canonical_json(&serde_json::to_value(&details)?)?.as_bytes());
    let uri = format!("ni:///keccak-256;{}?fpt={}", hex::encode(digest), details.kind);
    Ok(Condition { details, uri })
}

/// Sign `tx` with hex private keys.
pub fn fulfill_transaction<K: AsRef<str>>(tx: &Transaction, private_keys: &[K]) -> LedgerResult<Transaction> {
    let keypairs = private_keys
        .iter()
        .map(|key| Keypair::from_private_key(key.as_ref()))
        .collect::<LedgerResult<Vec<_>>>()?;
    sign_transaction(tx, &keypairs)
}

/// Sign every input of `tx`.
///
/// Each input gets one signature per `owners_before` entry, in owner order,
/// concatenated. The id is recomputed over the signed payload.
pub fn sign_transaction(tx: &Transaction, keypairs: &[Keypair]) -> LedgerResult<Transaction> {
    if keypairs.is_empty() {
        return Err(LedgerError::KeypairNotFound("no private keys supplied".to_string()));
    }

    let message = unsigned_message(tx)?;
    let mut signed = tx.clone();

    for input in &mut signed.inputs {
        let mut payload = message.clone();
        if let Some(link) = &input.fulfills {
            payload.push_str(&link.transaction_id);
            payload.push_str(&link.output_index.to_string());
        }

        let mut fulfillment = String::new();
        for owner in &input.owners_before {
            let keypair = keypairs
                .iter()
                .find(|k| k.owns(owner))
                .ok_or_else(|| LedgerError::MissingSigningKey(owner.clone()))?;
            fulfillment.push_str(&keypair.sign(payload.as_bytes())?);
        }
        input.fulfillment = Some(fulfillment);
    }

    signed.id = None;
    signed.id = Some(hash_transaction(&signed)?);
    tracing::debug!(inputs = signed.inputs.len(), "transaction fulfilled");
    Ok(signed)
}

/// Id of an unsigned transaction.
pub fn transaction_id(tx: &Transaction) -> LedgerResult<String> {
    let mut unsigned = tx.clone();
    unsigned.id = None;
    for input in &mut unsigned.inputs {
        input.fulfillment = None;
    }
    hash_transaction(&unsigned)
}

fn unsigned_message(tx: &Transaction) -> LedgerResult<String> {
    let mut unsigned = tx.clone();
    unsigned.id = None;
    for input in &mut unsigned.inputs {
        input.fulfillment = None;
    }
    canonical_json(&serde_json::to_value(&unsigned)?)
}

fn hash_transaction(tx: &Transaction) -> LedgerResult<String> {
    let body = canonical_json(&serde_json::to_value(tx)?)?;
    Ok(hex::encode(keccak256(body.as_bytes())))
}

/// Serialize with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> LedgerResult<String> {
    Ok(serde_json::to_string(&sorted(value))?)
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered: BTreeMap<&String, Value> = map.iter().map(|(k, v)| (k, sorted(v))).collect();
            let mut out = Map::with_capacity(ordered.len());
            for (k, v) in ordered {
                out.insert(k.clone(), v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALICE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const BOB_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn alice() -> Keypair {
        Keypair::from_private_key(ALICE_KEY).unwrap()
    }

    fn bob() -> Keypair {
        Keypair::from_private_key(BOB_KEY).unwrap()
    }

    #[test]
    fn test_prepare_create_defaults() {
        let alice = alice();
        let tx = prepare_transaction(PrepareRequest::create(vec![alice.public_key()])).unwrap();

        assert_eq!(tx.operation, Operation::Create);
        assert_eq!(tx.version, TX_VERSION);
        assert_eq!(tx.asset, Asset::Data { data: None });
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.inputs[0].owners_before, vec![alice.public_key()]);
        assert!(tx.inputs[0].fulfills.is_none());
        assert!(tx.inputs[0].fulfillment.is_none());
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].public_keys, vec![alice.public_key()]);
        assert_eq!(tx.outputs[0].amount, "1");
        assert_eq!(tx.outputs[0].condition.details.kind, SINGLE_KEY_CONDITION);
        assert_eq!(tx.id.as_deref().map(str::len), Some(64));
    }

    #[test]
    fn test_prepare_create_ignores_inputs() {
        let mut request = PrepareRequest::create(vec![alice().public_key()])
            .with_asset_data(json!({"serial": 1}));
        request.inputs = vec![Input::spend("abc", 0, vec![bob().public_key()])];

        let tx = prepare_transaction(request).unwrap();
        assert!(tx.inputs[0].fulfills.is_none());
        assert_eq!(tx.inputs[0].owners_before, vec![alice().public_key()]);
    }

    #[test]
    fn test_prepare_create_validation() {
        assert!(matches!(
            prepare_transaction(PrepareRequest::create(Vec::new())),
            Err(LedgerError::MissingSigners)
        ));

        let mut request = PrepareRequest::create(vec![alice().public_key()]);
        request.asset = Some(Asset::link("abc"));
        assert!(matches!(prepare_transaction(request), Err(LedgerError::InvalidAsset(_))));

        let request = PrepareRequest::create(vec![alice().public_key()])
            .with_recipients(vec![Recipient::new(vec![bob().public_key()], 0)]);
        assert!(matches!(prepare_transaction(request), Err(LedgerError::InvalidAmount(0))));
    }

    #[test]
    fn test_multiple_owners_get_threshold_condition() {
        let keys = vec![alice().public_key(), bob().public_key()];
        let request = PrepareRequest::create(vec![alice().public_key()])
            .with_recipients(vec![Recipient::new(keys, 10)]);
        let tx = prepare_transaction(request).unwrap();

        let details = &tx.outputs[0].condition.details;
        assert_eq!(details.kind, THRESHOLD_CONDITION);
        assert_eq!(details.threshold, Some(2));
        assert_eq!(details.subconditions.len(), 2);
        assert_eq!(tx.outputs[0].amount, "10");
    }

    #[test]
    fn test_prepare_transfer_validation() {
        let bob_pk = bob().public_key();
        let input = Input::spend("c0ffee", 0, vec![alice().public_key()]);

        let missing_inputs = PrepareRequest::transfer(Vec::new(), "c0ffee", vec![Recipient::single(bob_pk.clone())]);
        assert!(matches!(prepare_transaction(missing_inputs), Err(LedgerError::MissingInputs)));

        let missing_recipients = PrepareRequest::transfer(vec![input.clone()], "c0ffee", Vec::new());
        assert!(matches!(prepare_transaction(missing_recipients), Err(LedgerError::MissingRecipients)));

        let mut missing_asset = PrepareRequest::transfer(vec![input.clone()], "c0ffee", vec![Recipient::single(bob_pk.clone())]);
        missing_asset.asset = None;
        assert!(matches!(prepare_transaction(missing_asset), Err(LedgerError::InvalidAsset(_))));

        let dangling = Input {
            fulfills: None,
            ..input
        };
        let request = PrepareRequest::transfer(vec![dangling], "c0ffee", vec![Recipient::single(bob_pk)]);
        assert!(matches!(prepare_transaction(request), Err(LedgerError::InvalidInput(0))));
    }

    #[test]
    fn test_create_then_transfer() {
        let alice = alice();
        let bob = bob();

        let create = prepare_transaction(
            PrepareRequest::create(vec![alice.public_key()]).with_asset_data(json!({"bicycle": "abc"})),
        )
        .unwrap();
        let signed_create = fulfill_transaction(&create, &[ALICE_KEY]).unwrap();
        let create_id = signed_create.id.clone().unwrap();

        let transfer = prepare_transaction(PrepareRequest::transfer(
            vec![signed_create.spend_output(0).unwrap()],
            create_id.clone(),
            vec![Recipient::single(bob.public_key())],
        ))
        .unwrap();
        assert_eq!(transfer.asset, Asset::link(create_id));

        let signed = sign_transaction(&transfer, &[alice]).unwrap();
        assert_eq!(signed.inputs[0].fulfillment.as_ref().map(String::len), Some(130));
        assert_ne!(signed.id, transfer.id);
    }

    #[test]
    fn test_spend_output() {
        let tx = prepare_transaction(PrepareRequest::create(vec![alice().public_key()])).unwrap();
        let input = tx.spend_output(0).unwrap();
        assert_eq!(input.owners_before, vec![alice().public_key()]);
        assert_eq!(input.fulfills.unwrap().transaction_id, tx.id.clone().unwrap());

        assert!(matches!(tx.spend_output(1), Err(LedgerError::InvalidInput(1))));
        let anonymous = Transaction { id: None, ..tx };
        assert!(matches!(anonymous.spend_output(0), Err(LedgerError::InvalidInput(0))));
    }

    #[test]
    fn test_fulfill_requires_owner_keys() {
        let tx = prepare_transaction(PrepareRequest::create(vec![alice().public_key()])).unwrap();

        let err = fulfill_transaction(&tx, &[BOB_KEY]).unwrap_err();
        assert!(matches!(err, LedgerError::MissingSigningKey(owner) if owner == alice().public_key()));

        let err = fulfill_transaction::<&str>(&tx, &[]).unwrap_err();
        assert!(matches!(err, LedgerError::KeypairNotFound(_)));
    }

    #[test]
    fn test_multi_owner_fulfillment_concatenates_signatures() {
        let owners = vec![alice().public_key(), bob().public_key()];
        let tx = prepare_transaction(PrepareRequest::create(owners)).unwrap();
        let signed = fulfill_transaction(&tx, &[BOB_KEY, ALICE_KEY]).unwrap();
        assert_eq!(signed.inputs[0].fulfillment.as_ref().map(String::len), Some(260));
    }

    #[test]
    fn test_id_is_stable_and_ignores_fulfillments() {
        let tx = prepare_transaction(PrepareRequest::create(vec![alice().public_key()])).unwrap();
        assert_eq!(transaction_id(&tx).unwrap(), tx.id.clone().unwrap());

        let signed = sign_transaction(&tx, &[alice()]).unwrap();
        assert_eq!(transaction_id(&signed).unwrap(), tx.id.unwrap());
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let value = json!({"b": 1, "a": {"d": [{"z": 1, "y": 2}], "c": null}});
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"a":{"c":null,"d":[{"y":2,"z":1}]},"b":1}"#
        );
    }
}

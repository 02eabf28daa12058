//! Keypairs and signing.
//!
//! # Security
//! - Private keys are loaded from arguments or environment variables only
//! - Keys are never logged; `Debug` shows the public key alone

use alloy::primitives::{hex, keccak256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use std::fmt;

use crate::ledger::types::{LedgerError, LedgerResult};

/// Environment variable holding the signing key.
pub const PRIVATE_KEY_ENV_VAR: &str = "LEDGER_PRIVATE_KEY";

/// A signing keypair. The public key is the checksummed address.
#[derive(Clone)]
pub struct Keypair {
    signer: PrivateKeySigner,
}

impl Keypair {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    /// Parse a hex-encoded private key, with or without `0x`.
    pub fn from_private_key(private_key_hex: &str) -> LedgerResult<Self> {
        let key_hex = private_key_hex
            .trim()
            .strip_prefix("0x")
            .unwrap_or(private_key_hex.trim());

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| LedgerError::InvalidPrivateKey(format!("{}", e)))?;

        Ok(Self { signer })
    }

    /// Load the keypair from `LEDGER_PRIVATE_KEY`.
    pub fn from_env() -> LedgerResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            LedgerError::KeypairNotFound(format!("environment variable {} not set", PRIVATE_KEY_ENV_VAR))
        })?;
        Self::from_private_key(&private_key)
    }

    pub fn public_key(&self) -> String {
        self.signer.address().to_checksum(None)
    }

    /// Hex-encoded private key, without prefix.
    pub fn private_key(&self) -> String {
        hex::encode(self.signer.to_bytes())
    }

    /// Whether `public_key` names this keypair. Case-insensitive.
    pub fn owns(&self, public_key: &str) -> bool {
        self.public_key().eq_ignore_ascii_case(public_key.trim())
    }

    /// Sign keccak256(`message`). Returns the 65-byte signature as hex.
    pub fn sign(&self, message: &[u8]) -> LedgerResult<String> {
        let hash = keccak256(message);
        let signature = self
            .signer
            .sign_hash_sync(&hash)
            .map_err(|e| LedgerError::Signing(e.to_string()))?;
        Ok(hex::encode(signature.as_bytes()))
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_PUBLIC_KEY: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_keypair_from_private_key() {
        let keypair = Keypair::from_private_key(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(keypair.public_key().to_lowercase(), TEST_PUBLIC_KEY);
        assert!(keypair.owns(TEST_PUBLIC_KEY));
        assert_eq!(keypair.private_key(), TEST_PRIVATE_KEY);
    }

    #[test]
    fn test_keypair_with_0x_prefix() {
        let keypair = Keypair::from_private_key(&format!("0x{}", TEST_PRIVATE_KEY)).unwrap();
        assert_eq!(keypair.public_key().to_lowercase(), TEST_PUBLIC_KEY);
    }

    #[test]
    fn test_invalid_private_key() {
        let result = Keypair::from_private_key("invalid_key");
        assert!(matches!(result, Err(LedgerError::InvalidPrivateKey(_))));
    }

    #[test]
    fn test_generated_keypair_roundtrips() {
        let keypair = Keypair::generate();
        let restored = Keypair::from_private_key(&keypair.private_key()).unwrap();
        assert_eq!(restored.public_key(), keypair.public_key());
    }

    #[test]
    fn test_signature_is_deterministic() {
        let keypair = Keypair::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let first = keypair.sign(b"payload").unwrap();
        assert_eq!(first.len(), 130);
        assert_eq!(first, keypair.sign(b"payload").unwrap());
        assert_ne!(first, keypair.sign(b"other").unwrap());
    }

    #[test]
    fn test_debug_hides_private_key() {
        let keypair = Keypair::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let debug = format!("{:?}", keypair);
        assert!(!debug.contains(TEST_PRIVATE_KEY));
        assert!(debug.to_lowercase().contains(TEST_PUBLIC_KEY));
    }
}

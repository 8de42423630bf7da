//! Local private key signer.
//!
//! Keys are held in memory per account and per authority level. Signing is
//! ECDSA over secp256k1 on the SHA-256 digest of the canonical JSON
//! transaction; the signed transaction is handed to the ledger client.

use crate::SignerInterface;
use async_trait::async_trait;
use broadcast_types::{
	AccountName, AttemptOutcome, AuthorityLevel, LedgerClient, OperationDescriptor,
	ProviderMethod, SignedTransaction, SignerError, Transaction,
};
use k256::ecdsa::{signature::hazmat::PrehashSigner, Signature, SigningKey};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Default lifetime of a locally signed transaction.
const DEFAULT_EXPIRATION: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum KeyError {
	#[error("Invalid key: {0}")]
	InvalidKey(String),
}

#[derive(Default)]
struct AccountKeys {
	posting: Option<SigningKey>,
	active: Option<SigningKey>,
}

/// Signs with keys held by the client and submits synchronously.
pub struct LocalKeySigner {
	keys: HashMap<AccountName, AccountKeys>,
	ledger: Arc<dyn LedgerClient>,
	expiration: Duration,
}

impl LocalKeySigner {
	pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
		Self {
			keys: HashMap::new(),
			ledger,
			expiration: DEFAULT_EXPIRATION,
		}
	}

	pub fn with_expiration(mut self, expiration: Duration) -> Self {
		self.expiration = expiration;
		self
	}

	/// Imports a hex-encoded secp256k1 private key (with or without 0x prefix).
	pub fn with_key(
		mut self,
		account: AccountName,
		level: AuthorityLevel,
		private_key_hex: &str,
	) -> Result<Self, KeyError> {
		let key_without_prefix = private_key_hex
			.strip_prefix("0x")
			.unwrap_or(private_key_hex);
		let bytes = hex::decode(key_without_prefix)
			.map_err(|e| KeyError::InvalidKey(format!("Invalid hex: {}", e)))?;
		if bytes.len() != 32 {
			return Err(KeyError::InvalidKey(
				"Private key must be 32 bytes".to_string(),
			));
		}
		let key = SigningKey::from_slice(&bytes)
			.map_err(|e| KeyError::InvalidKey(format!("Invalid private key: {}", e)))?;

		let entry = self.keys.entry(account).or_default();
		match level {
			AuthorityLevel::Posting => entry.posting = Some(key),
			AuthorityLevel::Active => entry.active = Some(key),
		}
		Ok(self)
	}

	/// The weakest held key that still satisfies `required`.
	fn key_for(&self, account: &AccountName, required: AuthorityLevel) -> Option<&SigningKey> {
		let keys = self.keys.get(account)?;
		match required {
			AuthorityLevel::Posting => keys.posting.as_ref().or(keys.active.as_ref()),
			AuthorityLevel::Active => keys.active.as_ref(),
		}
	}

	fn sign(&self, key: &SigningKey, transaction: Transaction) -> Result<SignedTransaction, SignerError> {
		let canonical = serde_json::to_vec(&transaction)
			.map_err(|e| SignerError::Internal(format!("Failed to encode transaction: {}", e)))?;
		let digest = Sha256::digest(&canonical);

		let signature: Signature = key
			.sign_prehash(&digest)
			.map_err(|e| SignerError::Internal(format!("Failed to sign transaction: {}", e)))?;

		debug!("Signed transaction digest {}", hex::encode(digest));
		Ok(SignedTransaction {
			transaction,
			signatures: vec![hex::encode(signature.to_bytes())],
		})
	}
}

#[async_trait]
impl SignerInterface for LocalKeySigner {
	fn method(&self) -> ProviderMethod {
		ProviderMethod::LocalKey
	}

	async fn is_available(&self) -> bool {
		!self.keys.is_empty()
	}

	async fn attempt(
		&self,
		operations: &[OperationDescriptor],
		authority: AuthorityLevel,
		account: &AccountName,
	) -> AttemptOutcome {
		let Some(key) = self.key_for(account, authority) else {
			return AttemptOutcome::Declined(format!(
				"No local {} key for {}",
				authority, account
			));
		};

		let expiration = match chrono::Duration::from_std(self.expiration) {
			Ok(expiration) => chrono::Utc::now() + expiration,
			Err(e) => return AttemptOutcome::Failed(SignerError::Internal(e.to_string())),
		};
		let transaction = Transaction {
			operations: operations.to_vec(),
			expiration,
		};

		let signed = match self.sign(key, transaction) {
			Ok(signed) => signed,
			Err(e) => return AttemptOutcome::Failed(e),
		};

		match self.ledger.submit(signed).await {
			Ok(receipt) => {
				info!(
					"Local key broadcast for {} included in block {}",
					account, receipt.block_num
				);
				AttemptOutcome::Success(receipt)
			}
			Err(e) => AttemptOutcome::Failed(SignerError::LedgerRejected(e)),
		}
	}
}

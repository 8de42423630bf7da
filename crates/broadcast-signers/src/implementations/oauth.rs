//! OAuth broadcast service signer.
//!
//! The hosted service holds the user's keys and broadcasts on their behalf
//! when presented with an access token. Tokens carry a scope; a token scoped
//! to posting can never broadcast active-authority operations.

use crate::SignerInterface;
use async_trait::async_trait;
use broadcast_types::{
	AccountName, AttemptOutcome, AuthorityLevel, LedgerError, OperationDescriptor, ProviderMethod,
	SignerError, TransactionReceipt,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// An access token granted by the broadcast service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
	pub account: AccountName,
	pub token: String,
	/// Highest authority the token may broadcast with.
	pub scope: AuthorityLevel,
	pub expires_at: DateTime<Utc>,
}

impl AccessToken {
	pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
		self.expires_at <= now
	}
}

/// Errors returned by the broadcast service API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
	#[error("Unauthorized: {0}")]
	Unauthorized(String),
	#[error("Service unavailable: {0}")]
	Unavailable(String),
	#[error("Ledger error: {0}")]
	Ledger(#[from] LedgerError),
	#[error("Service error: {0}")]
	Other(String),
}

impl From<ServiceError> for SignerError {
	fn from(error: ServiceError) -> Self {
		match error {
			// A revoked token rules out this provider, not the transaction.
			ServiceError::Unauthorized(reason) => {
				SignerError::Unavailable(format!("Access token rejected: {}", reason))
			}
			ServiceError::Unavailable(reason) => SignerError::Unavailable(reason),
			ServiceError::Ledger(error) => SignerError::LedgerRejected(error),
			ServiceError::Other(reason) => SignerError::Internal(reason),
		}
	}
}

/// Client for the hosted broadcast endpoint.
#[async_trait]
pub trait BroadcastServiceClient: Send + Sync {
	async fn broadcast(
		&self,
		access_token: &str,
		operations: &[OperationDescriptor],
	) -> Result<TransactionReceipt, ServiceError>;
}

/// Broadcasts through the hosted service with a per-account access token.
pub struct OAuthSigner {
	client: Arc<dyn BroadcastServiceClient>,
	tokens: HashMap<AccountName, AccessToken>,
}

impl OAuthSigner {
	pub fn new(client: Arc<dyn BroadcastServiceClient>) -> Self {
		Self {
			client,
			tokens: HashMap::new(),
		}
	}

	pub fn with_token(mut self, token: AccessToken) -> Self {
		self.tokens.insert(token.account.clone(), token);
		self
	}
}

#[async_trait]
impl SignerInterface for OAuthSigner {
	fn method(&self) -> ProviderMethod {
		ProviderMethod::OAuthBroadcastService
	}

	async fn is_available(&self) -> bool {
		!self.tokens.is_empty()
	}

	async fn attempt(
		&self,
		operations: &[OperationDescriptor],
		authority: AuthorityLevel,
		account: &AccountName,
	) -> AttemptOutcome {
		let Some(token) = self.tokens.get(account) else {
			return AttemptOutcome::Declined(format!("No access token for {}", account));
		};
		if token.is_expired(Utc::now()) {
			return AttemptOutcome::Declined(format!("Access token for {} expired", account));
		}
		if !token.scope.satisfies(authority) {
			warn!(
				"Access token for {} is scoped to {}, {} required",
				account, token.scope, authority
			);
			return AttemptOutcome::Failed(SignerError::AuthorityMismatch {
				required: authority,
				granted: token.scope,
			});
		}

		debug!("Broadcasting {} operation(s) through OAuth service", operations.len());
		match self.client.broadcast(&token.token, operations).await {
			Ok(receipt) => AttemptOutcome::Success(receipt),
			Err(e) => AttemptOutcome::Failed(e.into()),
		}
	}
}

//! Error taxonomy for the broadcast subsystem.
//!
//! `LedgerError` is what a node reports about the transaction itself.
//! `SignerError` is what a provider attempt can fail with; the coordinator
//! classifies it as retryable or terminal. `BroadcastError` is what the
//! caller finally sees.

use crate::account::Asset;
use crate::authority::AuthorityLevel;
use crate::operation::Action;
use crate::provider::{Confirmation, ProviderMethod};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A rejection reported by a ledger node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
	#[error("Insufficient funds: {0}")]
	InsufficientFunds(String),
	#[error("Missing required authority: {0}")]
	MissingAuthority(String),
	#[error("Duplicate transaction: {0}")]
	Duplicate(String),
	#[error("Transaction expired: {0}")]
	Expired(String),
	#[error("Invalid operation: {0}")]
	InvalidOperation(String),
	#[error("Rejected by node: {0}")]
	Other(String),
}

impl LedgerError {
	/// Categorises a raw node error message.
	pub fn from_node_message(message: &str) -> Self {
		let lower = message.to_lowercase();
		let message = message.to_string();

		if lower.contains("insufficient") || lower.contains("does not have sufficient") {
			LedgerError::InsufficientFunds(message)
		} else if lower.contains("missing required") || lower.contains("missing authority") {
			LedgerError::MissingAuthority(message)
		} else if lower.contains("duplicate") {
			LedgerError::Duplicate(message)
		} else if lower.contains("expiration") || lower.contains("expired") {
			LedgerError::Expired(message)
		} else if lower.contains("assert exception") || lower.contains("invalid") {
			LedgerError::InvalidOperation(message)
		} else {
			LedgerError::Other(message)
		}
	}
}

/// Why a single provider attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
	/// The signer application or extension is not installed.
	#[error("Signer not installed: {0}")]
	NotInstalled(String),
	/// The signing backend could not be reached.
	#[error("Signer unavailable: {0}")]
	Unavailable(String),
	/// No answer from the user before the provider's timeout.
	#[error("Timed out after {0:?} waiting for approval")]
	Timeout(Duration),
	/// The user declined at this provider.
	#[error("Cancelled by user: {0}")]
	Cancelled(String),
	/// A newer request replaced this one while it was pending.
	#[error("Superseded by a newer signing request")]
	Superseded,
	/// The credential available to the provider is below the required level.
	#[error("Authority mismatch: {required} authority required, credential grants {granted}")]
	AuthorityMismatch {
		required: AuthorityLevel,
		granted: AuthorityLevel,
	},
	/// The ledger rejected the transaction.
	#[error("Ledger rejected transaction: {0}")]
	LedgerRejected(#[from] LedgerError),
	/// Any other failure unrelated to signer availability.
	#[error("Internal signer error: {0}")]
	Internal(String),
}

/// Why a method in the chain did not produce a confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
	Declined(String),
	Failed(SignerError),
}

impl fmt::Display for FailureReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FailureReason::Declined(reason) => write!(f, "declined ({})", reason),
			FailureReason::Failed(error) => write!(f, "failed ({})", error),
		}
	}
}

/// One entry of the per-method failure map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
	pub method: ProviderMethod,
	pub reason: FailureReason,
}

impl fmt::Display for AttemptFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.method, self.reason)
	}
}

/// The failure half of a broadcast result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BroadcastError {
	/// The (asset, action) pair has no operation mapping.
	#[error("Unsupported combination: {action} on {asset}")]
	UnsupportedCombination { asset: Asset, action: Action },
	/// The payload is missing a field or carries a malformed value.
	#[error("Invalid payload: {0}")]
	InvalidPayload(String),
	/// The broadcast request itself is malformed.
	#[error("Invalid broadcast request: {0}")]
	InvalidRequest(String),
	/// A terminal failure stopped the chain.
	#[error("Broadcast aborted at {method}: {error}")]
	Aborted {
		method: ProviderMethod,
		error: SignerError,
	},
	/// Every method declined or failed with a retryable error.
	#[error("All providers exhausted: {}", format_failures(.0))]
	AllProvidersExhausted(Vec<AttemptFailure>),
}

impl BroadcastError {
	/// True for errors that stem from the request, not from any provider.
	pub fn is_client_error(&self) -> bool {
		matches!(
			self,
			BroadcastError::UnsupportedCombination { .. }
				| BroadcastError::InvalidPayload(_)
				| BroadcastError::InvalidRequest(_)
		)
	}
}

/// Outcome of a broadcast: the ledger confirmation or why there is none.
pub type BroadcastResult = Result<Confirmation, BroadcastError>;

fn format_failures(failures: &[AttemptFailure]) -> String {
	if failures.is_empty() {
		return "no method attempted".to_string();
	}
	failures
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join("; ")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_node_message_categories() {
		assert!(matches!(
			LedgerError::from_node_message("Account alice does not have sufficient funds for balance adjustment."),
			LedgerError::InsufficientFunds(_)
		));
		assert!(matches!(
			LedgerError::from_node_message("Missing Required Active Authority alice"),
			LedgerError::MissingAuthority(_)
		));
		assert!(matches!(
			LedgerError::from_node_message("Duplicate transaction check failed"),
			LedgerError::Duplicate(_)
		));
		assert!(matches!(
			LedgerError::from_node_message("transaction expiration exception"),
			LedgerError::Expired(_)
		));
		assert!(matches!(
			LedgerError::from_node_message("Assert Exception: amount.amount > 0"),
			LedgerError::InvalidOperation(_)
		));
		assert!(matches!(
			LedgerError::from_node_message("something odd"),
			LedgerError::Other(_)
		));
	}

	#[test]
	fn test_exhausted_message_lists_methods() {
		let error = BroadcastError::AllProvidersExhausted(vec![
			AttemptFailure {
				method: ProviderMethod::LocalKey,
				reason: FailureReason::Declined("no key".into()),
			},
			AttemptFailure {
				method: ProviderMethod::BrowserExtension,
				reason: FailureReason::Failed(SignerError::NotInstalled("keychain".into())),
			},
		]);
		let message = error.to_string();
		assert!(message.contains("local_key: declined (no key)"));
		assert!(message.contains("browser_extension: failed"));
	}
}

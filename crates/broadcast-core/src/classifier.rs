//! Failure classification.
//!
//! Decides whether a failed attempt rules out only the current provider or
//! the transaction itself. Retryable failures move the chain on to the next
//! provider; terminal failures stop it.

use broadcast_types::SignerError;

/// Classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
	/// The signing path is unavailable; another provider may succeed.
	Retryable,
	/// The transaction cannot succeed through any provider.
	Terminal,
}

pub fn classify(error: &SignerError) -> ErrorClass {
	match error {
		SignerError::NotInstalled(_)
		| SignerError::Unavailable(_)
		| SignerError::Timeout(_)
		| SignerError::Cancelled(_)
		| SignerError::Superseded => ErrorClass::Retryable,
		SignerError::AuthorityMismatch { .. }
		| SignerError::LedgerRejected(_)
		| SignerError::Internal(_) => ErrorClass::Terminal,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use broadcast_types::{AuthorityLevel, LedgerError};
	use std::time::Duration;

	#[test]
	fn test_availability_failures_are_retryable() {
		let retryable = [
			SignerError::NotInstalled("keychain".into()),
			SignerError::Unavailable("service down".into()),
			SignerError::Timeout(Duration::from_secs(60)),
			SignerError::Cancelled("user closed prompt".into()),
			SignerError::Superseded,
		];
		for error in retryable {
			assert_eq!(classify(&error), ErrorClass::Retryable, "{}", error);
		}
	}

	#[test]
	fn test_transaction_failures_are_terminal() {
		let terminal = [
			SignerError::AuthorityMismatch {
				required: AuthorityLevel::Active,
				granted: AuthorityLevel::Posting,
			},
			SignerError::LedgerRejected(LedgerError::InsufficientFunds("alice".into())),
			SignerError::LedgerRejected(LedgerError::Duplicate("tx".into())),
			SignerError::LedgerRejected(LedgerError::MissingAuthority("active".into())),
			SignerError::Internal("serialization".into()),
		];
		for error in terminal {
			assert_eq!(classify(&error), ErrorClass::Terminal, "{}", error);
		}
	}
}

//! Signing provider adapters.
//!
//! Each adapter wraps one mechanism for getting a set of operations signed
//! and submitted: a locally held key, a companion app round trip, a hosted
//! OAuth broadcast service, or a bridged signer such as a browser extension.
//! They all expose the same `SignerInterface` so the coordinator can walk
//! them in any order without knowing which is which.

use async_trait::async_trait;
use broadcast_types::{
	AccountName, AttemptOutcome, AuthorityLevel, OperationDescriptor, ProviderMethod,
};

/// Re-export implementations
pub mod implementations {
	pub mod bridge;
	pub mod local_key;
	pub mod oauth;
	pub mod remote;
}

pub use implementations::bridge::{BridgedSigner, SignerBridge};
pub use implementations::local_key::{KeyError, LocalKeySigner};
pub use implementations::oauth::{AccessToken, BroadcastServiceClient, OAuthSigner, ServiceError};
pub use implementations::remote::{
	ApprovalDecision, CompanionChannel, RemoteSigner, SigningRequest,
};

/// Contract shared by every signing backend.
///
/// `attempt` never returns an error type: a provider that cannot help says
/// so with `AttemptOutcome::Declined`, and anything that went wrong during an
/// actual signing attempt is reported as `AttemptOutcome::Failed` for the
/// coordinator to classify.
#[async_trait]
pub trait SignerInterface: Send + Sync {
	/// The method this adapter implements.
	fn method(&self) -> ProviderMethod;

	/// Cheap capability check.
	///
	/// Returning false lets the coordinator skip the adapter without any
	/// user-visible prompt.
	async fn is_available(&self) -> bool {
		true
	}

	/// Signs and submits `operations` for `account` with at least `authority`.
	async fn attempt(
		&self,
		operations: &[OperationDescriptor],
		authority: AuthorityLevel,
		account: &AccountName,
	) -> AttemptOutcome;
}

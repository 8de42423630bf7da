//! Bridged signers: browser extensions and application-supplied adapters.
//!
//! Either kind may be missing from a given environment entirely. A missing
//! or uninstalled bridge always declines; it never fails.

use crate::SignerInterface;
use async_trait::async_trait;
use broadcast_types::{
	AccountName, AttemptOutcome, AuthorityLevel, OperationDescriptor, ProviderMethod, SignerError,
	TransactionReceipt,
};
use std::sync::Arc;
use tracing::debug;

/// Host-provided bridge to an external signer.
#[async_trait]
pub trait SignerBridge: Send + Sync {
	/// Whether the signer is installed and reachable right now.
	async fn is_installed(&self) -> bool;

	/// Asks the signer to sign and broadcast. The signer may prompt the user.
	async fn request_broadcast(
		&self,
		account: &AccountName,
		operations: &[OperationDescriptor],
		authority: AuthorityLevel,
	) -> Result<TransactionReceipt, SignerError>;
}

/// Adapter over an optional `SignerBridge`.
pub struct BridgedSigner {
	method: ProviderMethod,
	bridge: Option<Arc<dyn SignerBridge>>,
}

impl BridgedSigner {
	pub fn browser_extension(bridge: Option<Arc<dyn SignerBridge>>) -> Self {
		Self {
			method: ProviderMethod::BrowserExtension,
			bridge,
		}
	}

	pub fn custom(bridge: Option<Arc<dyn SignerBridge>>) -> Self {
		Self {
			method: ProviderMethod::CustomAdapter,
			bridge,
		}
	}
}

#[async_trait]
impl SignerInterface for BridgedSigner {
	fn method(&self) -> ProviderMethod {
		self.method
	}

	async fn is_available(&self) -> bool {
		match &self.bridge {
			Some(bridge) => bridge.is_installed().await,
			None => false,
		}
	}

	async fn attempt(
		&self,
		operations: &[OperationDescriptor],
		authority: AuthorityLevel,
		account: &AccountName,
	) -> AttemptOutcome {
		let Some(bridge) = &self.bridge else {
			return AttemptOutcome::Declined(format!("{} not present", self.method));
		};
		if !bridge.is_installed().await {
			return AttemptOutcome::Declined(format!("{} not installed", self.method));
		}

		debug!("Requesting broadcast from {}", self.method);
		match bridge.request_broadcast(account, operations, authority).await {
			Ok(receipt) => AttemptOutcome::Success(receipt),
			Err(e) => AttemptOutcome::Failed(e),
		}
	}
}

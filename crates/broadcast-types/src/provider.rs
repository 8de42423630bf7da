//! Signing provider vocabulary shared by the adapters and the coordinator.

use crate::account::AccountName;
use crate::errors::SignerError;
use crate::ledger::TransactionReceipt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A mechanism capable of signing and submitting a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderMethod {
	/// A private key held by the client.
	LocalKey,
	/// A companion mobile application that approves each request.
	RemoteSignerRoundTrip,
	/// A hosted broadcast service authorised with an OAuth access token.
	#[serde(rename = "oauth_broadcast_service")]
	OAuthBroadcastService,
	/// A signer exposed by a browser extension.
	BrowserExtension,
	/// An application-supplied signer.
	CustomAdapter,
}

impl ProviderMethod {
	/// Default fallback order: most convenient first, slowest last.
	pub const DEFAULT_CHAIN: [ProviderMethod; 5] = [
		ProviderMethod::LocalKey,
		ProviderMethod::BrowserExtension,
		ProviderMethod::OAuthBroadcastService,
		ProviderMethod::RemoteSignerRoundTrip,
		ProviderMethod::CustomAdapter,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			ProviderMethod::LocalKey => "local_key",
			ProviderMethod::RemoteSignerRoundTrip => "remote_signer_round_trip",
			ProviderMethod::OAuthBroadcastService => "oauth_broadcast_service",
			ProviderMethod::BrowserExtension => "browser_extension",
			ProviderMethod::CustomAdapter => "custom_adapter",
		}
	}
}

impl fmt::Display for ProviderMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Capabilities of the caller for one broadcast.
///
/// Built fresh for each call and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
	/// The account signing the operations.
	pub account: AccountName,
	/// Methods this caller can use at all.
	pub available: BTreeSet<ProviderMethod>,
	/// Order in which methods are tried.
	pub chain: Vec<ProviderMethod>,
	/// When false, exactly one method is tried and its outcome is final.
	pub enable_fallback: bool,
	/// The single method used when fallback is disabled. Defaults to the chain head.
	pub preferred: Option<ProviderMethod>,
}

impl AuthContext {
	/// A context with every method available and the default chain.
	pub fn new(account: AccountName) -> Self {
		Self {
			account,
			available: ProviderMethod::DEFAULT_CHAIN.into_iter().collect(),
			chain: ProviderMethod::DEFAULT_CHAIN.to_vec(),
			enable_fallback: true,
			preferred: None,
		}
	}

	pub fn with_available(mut self, methods: impl IntoIterator<Item = ProviderMethod>) -> Self {
		self.available = methods.into_iter().collect();
		self
	}

	pub fn with_chain(mut self, chain: Vec<ProviderMethod>) -> Self {
		self.chain = chain;
		self
	}

	/// Disables fallback and pins the broadcast to `method`.
	pub fn only(mut self, method: ProviderMethod) -> Self {
		self.enable_fallback = false;
		self.preferred = Some(method);
		self
	}

	pub fn is_available(&self, method: ProviderMethod) -> bool {
		self.available.contains(&method)
	}

	/// The methods a broadcast will walk, in order, each at most once.
	pub fn methods_to_try(&self) -> Vec<ProviderMethod> {
		if !self.enable_fallback {
			return self
				.preferred
				.or_else(|| self.chain.first().copied())
				.into_iter()
				.collect();
		}

		let mut seen = BTreeSet::new();
		self.chain
			.iter()
			.copied()
			.filter(|method| seen.insert(*method))
			.collect()
	}
}

/// Ledger confirmation of a broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
	pub transaction_id: String,
	pub block_num: u64,
	/// The provider that signed and submitted the transaction.
	pub method: ProviderMethod,
}

impl Confirmation {
	pub fn new(receipt: TransactionReceipt, method: ProviderMethod) -> Self {
		Self {
			transaction_id: receipt.transaction_id,
			block_num: receipt.block_num,
			method,
		}
	}
}

/// What a single provider attempt produced.
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
	/// The transaction was signed and accepted by the ledger.
	Success(TransactionReceipt),
	/// The provider had nothing to offer. Not an error; the chain continues.
	Declined(String),
	/// The provider tried and failed. The error is classified by the coordinator.
	Failed(SignerError),
}

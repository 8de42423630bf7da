//! Configuration types for the broadcast subsystem.

use broadcast_types::ProviderMethod;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete broadcast configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BroadcastConfig {
	/// Provider chain defaults
	#[serde(default)]
	pub broadcast: ChainSettings,
	/// Companion app round trip settings
	#[serde(default)]
	pub remote_signer: RemoteSignerSettings,
	/// Post-broadcast side effects
	#[serde(default)]
	pub effects: EffectsSettings,
	/// Local key signing settings
	#[serde(default)]
	pub local_key: LocalKeySettings,
}

/// Default fallback chain for callers that do not supply their own
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainSettings {
	/// Methods in the order they are tried
	#[serde(default = "default_chain")]
	pub chain: Vec<ProviderMethod>,
	/// Try the next method when one declines or is unavailable
	#[serde(default = "default_true")]
	pub enable_fallback: bool,
}

impl Default for ChainSettings {
	fn default() -> Self {
		Self {
			chain: default_chain(),
			enable_fallback: true,
		}
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteSignerSettings {
	/// How long the user has to answer on the companion app
	#[serde(default = "default_approval_timeout_secs")]
	pub approval_timeout_secs: u64,
}

impl RemoteSignerSettings {
	pub fn approval_timeout(&self) -> Duration {
		Duration::from_secs(self.approval_timeout_secs)
	}
}

impl Default for RemoteSignerSettings {
	fn default() -> Self {
		Self {
			approval_timeout_secs: default_approval_timeout_secs(),
		}
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EffectsSettings {
	/// Delay before cached balances are invalidated, in milliseconds
	#[serde(default = "default_invalidation_grace_ms")]
	pub invalidation_grace_ms: u64,
}

impl EffectsSettings {
	pub fn invalidation_grace(&self) -> Duration {
		Duration::from_millis(self.invalidation_grace_ms)
	}
}

impl Default for EffectsSettings {
	fn default() -> Self {
		Self {
			invalidation_grace_ms: default_invalidation_grace_ms(),
		}
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalKeySettings {
	/// Lifetime of a locally signed transaction
	#[serde(default = "default_transaction_expiration_secs")]
	pub transaction_expiration_secs: u64,
}

impl LocalKeySettings {
	pub fn transaction_expiration(&self) -> Duration {
		Duration::from_secs(self.transaction_expiration_secs)
	}
}

impl Default for LocalKeySettings {
	fn default() -> Self {
		Self {
			transaction_expiration_secs: default_transaction_expiration_secs(),
		}
	}
}

fn default_chain() -> Vec<ProviderMethod> {
	ProviderMethod::DEFAULT_CHAIN.to_vec()
}

fn default_true() -> bool {
	true
}

fn default_approval_timeout_secs() -> u64 {
	60
}

fn default_invalidation_grace_ms() -> u64 {
	5_000
}

fn default_transaction_expiration_secs() -> u64 {
	60
}

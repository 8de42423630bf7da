//! Broadcast engine.
//!
//! Ties the pieces together: an action on an asset is built into ledger
//! operations, the required authority is resolved, the coordinator walks the
//! caller's provider chain, and on success the post-broadcast side effects are
//! scheduled on detached tasks. The result is returned as soon as the ledger
//! confirms; side effects never delay it or change it.

use broadcast_config::{BroadcastConfig, ConfigLoader};
use broadcast_effects::{
	ActivityRecorder, CacheInvalidator, EffectScheduler, NoopScheduler, PostBroadcast,
	SideEffectScheduler,
};
use broadcast_operations::{resolve, OperationBuilder};
use broadcast_signers::{CompanionChannel, LocalKeySigner, RemoteSigner, SignerInterface};
use broadcast_types::{
	AccountName, Action, Asset, AuthContext, AuthorityLevel, BroadcastError, BroadcastResult,
	LedgerClient, OperationDescriptor, Payload, ProviderMethod,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub mod classifier;
pub mod coordinator;
pub mod error;

pub use classifier::{classify, ErrorClass};
pub use coordinator::BroadcastCoordinator;
pub use error::CoreError;

/// One wallet action to broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastRequest {
	pub asset: Asset,
	pub action: Action,
	pub payload: Payload,
}

impl BroadcastRequest {
	pub fn new(asset: Asset, action: Action, payload: Payload) -> Self {
		Self {
			asset,
			action,
			payload,
		}
	}
}

pub struct BroadcastEngine {
	config: BroadcastConfig,
	coordinator: BroadcastCoordinator,
	scheduler: Arc<dyn EffectScheduler>,
	remote_signer: Option<Arc<RemoteSigner>>,
}

impl BroadcastEngine {
	pub fn builder() -> BroadcastEngineBuilder {
		BroadcastEngineBuilder::new()
	}

	pub fn config(&self) -> &BroadcastConfig {
		&self.config
	}

	pub fn coordinator(&self) -> &BroadcastCoordinator {
		&self.coordinator
	}

	/// The remote signer built from `with_remote_channel`, for delivering
	/// the companion app's decisions.
	pub fn remote_signer(&self) -> Option<Arc<RemoteSigner>> {
		self.remote_signer.clone()
	}

	/// A context for `account` using the configured chain and fallback setting.
	///
	/// Every method in the chain is marked available; callers narrow it with
	/// `AuthContext::with_available` when they know better.
	pub fn auth_context(&self, account: AccountName) -> AuthContext {
		let chain = self.config.broadcast.chain.clone();
		let mut ctx = AuthContext::new(account)
			.with_available(chain.iter().copied())
			.with_chain(chain);
		ctx.enable_fallback = self.config.broadcast.enable_fallback;
		ctx
	}

	/// Builds, signs and submits `request` on behalf of `ctx.account`.
	#[instrument(skip_all, fields(account = %ctx.account, action = %request.action, asset = %request.asset))]
	pub async fn execute(&self, request: &BroadcastRequest, ctx: &AuthContext) -> BroadcastResult {
		let builder = OperationBuilder::for_account(ctx.account.clone());
		let operations = builder
			.build(&request.asset, request.action, &request.payload)
			.map_err(BroadcastError::from)?;
		let authority = resolve(request.action);
		debug!(
			"Built {} operation(s) requiring {} authority",
			operations.len(),
			authority
		);

		let confirmation = self
			.coordinator
			.broadcast(&operations, authority, ctx)
			.await?;

		let effects = PostBroadcast {
			action: request.action,
			account: ctx.account.clone(),
			affected: affected_accounts(&ctx.account, &operations, &request.payload),
			confirmation: confirmation.clone(),
		};
		// Detached; the handles are dropped without cancelling the tasks.
		let _ = self.scheduler.schedule(effects);

		info!(
			"{} on {} broadcast as {}",
			request.action, request.asset, confirmation.transaction_id
		);
		Ok(confirmation)
	}
}

/// Accounts whose cached balances may change, signer first, without repeats.
fn affected_accounts(
	signer: &AccountName,
	operations: &[OperationDescriptor],
	payload: &Payload,
) -> Vec<AccountName> {
	let mut seen = HashSet::new();
	let mut affected = Vec::new();

	// Token contract calls carry the counterparty inside their JSON body.
	let counterparty = payload
		.to
		.as_deref()
		.and_then(|to| AccountName::new(to).ok());

	let candidates = std::iter::once(signer)
		.chain(operations.iter().flat_map(|op| op.accounts()))
		.chain(counterparty.as_ref());
	for account in candidates {
		if seen.insert(account.clone()) {
			affected.push(account.clone());
		}
	}
	affected
}

/// A hex private key to import into the local key signer.
struct KeyImport {
	account: AccountName,
	level: AuthorityLevel,
	private_key_hex: String,
}

pub struct BroadcastEngineBuilder {
	config: Option<BroadcastConfig>,
	config_path: Option<String>,
	signers: Vec<Arc<dyn SignerInterface>>,
	scheduler: Option<Arc<dyn EffectScheduler>>,
	effect_backends: Option<(Arc<dyn ActivityRecorder>, Arc<dyn CacheInvalidator>)>,
	remote_channel: Option<Arc<dyn CompanionChannel>>,
	ledger: Option<Arc<dyn LedgerClient>>,
	local_keys: Vec<KeyImport>,
}

impl Default for BroadcastEngineBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl BroadcastEngineBuilder {
	pub fn new() -> Self {
		Self {
			config: None,
			config_path: None,
			signers: Vec::new(),
			scheduler: None,
			effect_backends: None,
			remote_channel: None,
			ledger: None,
			local_keys: Vec::new(),
		}
	}

	pub fn with_config(mut self, config: BroadcastConfig) -> Self {
		self.config = Some(config);
		self
	}

	pub fn with_config_file(mut self, path: impl Into<String>) -> Self {
		self.config_path = Some(path.into());
		self
	}

	pub fn with_signer(mut self, signer: Arc<dyn SignerInterface>) -> Self {
		self.signers.push(signer);
		self
	}

	pub fn with_scheduler(mut self, scheduler: Arc<dyn EffectScheduler>) -> Self {
		self.scheduler = Some(scheduler);
		self
	}

	/// Schedules side effects on these backends, delayed by the configured
	/// invalidation grace. An explicit `with_scheduler` takes precedence.
	pub fn with_effect_backends(
		mut self,
		recorder: Arc<dyn ActivityRecorder>,
		cache: Arc<dyn CacheInvalidator>,
	) -> Self {
		self.effect_backends = Some((recorder, cache));
		self
	}

	/// Registers a remote signer over `channel` using the configured
	/// approval timeout.
	pub fn with_remote_channel(mut self, channel: Arc<dyn CompanionChannel>) -> Self {
		self.remote_channel = Some(channel);
		self
	}

	/// Ledger used by the local key signer.
	pub fn with_ledger(mut self, ledger: Arc<dyn LedgerClient>) -> Self {
		self.ledger = Some(ledger);
		self
	}

	/// Adds a key to the local key signer, which is built with the
	/// configured transaction expiration. Requires `with_ledger`.
	pub fn with_local_key(
		mut self,
		account: AccountName,
		level: AuthorityLevel,
		private_key_hex: impl Into<String>,
	) -> Self {
		self.local_keys.push(KeyImport {
			account,
			level,
			private_key_hex: private_key_hex.into(),
		});
		self
	}

	pub async fn build(self) -> Result<BroadcastEngine, CoreError> {
		// Load configuration either from provided config or from file
		let config = if let Some(config) = self.config {
			broadcast_config::validate_config(&config)?;
			config
		} else if let Some(config_path) = self.config_path {
			ConfigLoader::new().with_file(&config_path).load().await?
		} else {
			BroadcastConfig::default()
		};

		let mut signers = self.signers;

		let remote_signer = self.remote_channel.map(|channel| {
			Arc::new(
				RemoteSigner::new(channel).with_timeout(config.remote_signer.approval_timeout()),
			)
		});
		if let Some(remote) = &remote_signer {
			signers.push(remote.clone());
		}

		match (self.ledger, self.local_keys.is_empty()) {
			(Some(ledger), false) => {
				let mut local = LocalKeySigner::new(ledger)
					.with_expiration(config.local_key.transaction_expiration());
				for import in self.local_keys {
					local = local
						.with_key(import.account, import.level, &import.private_key_hex)
						.map_err(|e| CoreError::Configuration(e.to_string()))?;
				}
				signers.push(Arc::new(local));
			}
			(None, false) => {
				return Err(CoreError::Configuration(
					"Local keys were supplied without a ledger client".to_string(),
				));
			}
			(_, true) => {}
		}

		let mut coordinator = BroadcastCoordinator::new();
		for signer in signers {
			let method = signer.method();
			if coordinator.register(signer).is_some() {
				return Err(CoreError::Configuration(format!(
					"More than one adapter registered for {}",
					method
				)));
			}
		}

		let missing: Vec<ProviderMethod> = config
			.broadcast
			.chain
			.iter()
			.copied()
			.filter(|method| coordinator.signer(*method).is_none())
			.collect();
		if !missing.is_empty() {
			debug!("No adapter registered for {:?}; they will decline", missing);
		}

		let scheduler: Arc<dyn EffectScheduler> = match (self.scheduler, self.effect_backends) {
			(Some(scheduler), _) => scheduler,
			(None, Some((recorder, cache))) => Arc::new(
				SideEffectScheduler::new(recorder, cache)
					.with_grace(config.effects.invalidation_grace()),
			),
			(None, None) => Arc::new(NoopScheduler),
		};

		Ok(BroadcastEngine {
			config,
			coordinator,
			scheduler,
			remote_signer,
		})
	}
}

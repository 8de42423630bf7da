//! Post-broadcast side effects.
//!
//! After a successful broadcast two best-effort effects run: an activity
//! event is recorded, and cached balances and history for the affected
//! accounts are invalidated after a grace period that gives the ledger time
//! to reflect the new state. Both run on detached tasks. Their failures are
//! logged and dropped; they never reach the broadcast result.

use async_trait::async_trait;
use broadcast_types::{AccountName, Action, Confirmation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Default delay before cached entries are invalidated.
pub const DEFAULT_INVALIDATION_GRACE: Duration = Duration::from_secs(5);

/// Errors reported by side-effect backends.
#[derive(Debug, Error)]
pub enum EffectError {
	#[error("Backend error: {0}")]
	Backend(String),
}

/// An opaque key in the client-side cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(pub String);

impl CacheKey {
	pub fn balances(account: &AccountName) -> Self {
		Self(format!("wallet:balances:{}", account))
	}

	pub fn history(account: &AccountName) -> Self {
		Self(format!("wallet:history:{}", account))
	}
}

impl fmt::Display for CacheKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A recorded wallet activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
	/// Action tag, e.g. `transfer`.
	pub action: String,
	pub account: AccountName,
	pub block_num: Option<u64>,
	pub transaction_id: Option<String>,
	pub recorded_at: DateTime<Utc>,
}

/// Cache invalidation interface.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
	async fn invalidate(&self, keys: &[CacheKey]) -> Result<(), EffectError>;
}

/// Activity recording interface.
#[async_trait]
pub trait ActivityRecorder: Send + Sync {
	async fn record(&self, event: ActivityEvent) -> Result<(), EffectError>;
}

/// Everything the side effects need to know about a successful broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostBroadcast {
	pub action: Action,
	pub account: AccountName,
	/// Accounts whose balances changed, signer first.
	pub affected: Vec<AccountName>,
	pub confirmation: Confirmation,
}

impl PostBroadcast {
	pub fn cache_keys(&self) -> Vec<CacheKey> {
		self.affected
			.iter()
			.flat_map(|account| [CacheKey::balances(account), CacheKey::history(account)])
			.collect()
	}

	pub fn activity(&self) -> ActivityEvent {
		ActivityEvent {
			action: self.action.tag().to_string(),
			account: self.account.clone(),
			block_num: Some(self.confirmation.block_num),
			transaction_id: Some(self.confirmation.transaction_id.clone()),
			recorded_at: Utc::now(),
		}
	}
}

/// Handles to detached side-effect tasks.
///
/// Dropping this does not cancel the tasks.
#[derive(Debug, Default)]
pub struct ScheduledEffects {
	handles: Vec<JoinHandle<()>>,
}

impl ScheduledEffects {
	pub fn is_empty(&self) -> bool {
		self.handles.is_empty()
	}

	/// Waits for every scheduled effect to finish.
	pub async fn join(self) {
		for handle in self.handles {
			if let Err(e) = handle.await {
				warn!("Side-effect task ended abnormally: {}", e);
			}
		}
	}
}

/// Schedules post-broadcast work.
pub trait EffectScheduler: Send + Sync {
	fn schedule(&self, effects: PostBroadcast) -> ScheduledEffects;
}

/// Scheduler that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScheduler;

impl EffectScheduler for NoopScheduler {
	fn schedule(&self, _effects: PostBroadcast) -> ScheduledEffects {
		ScheduledEffects::default()
	}
}

/// Records activity immediately and invalidates cache entries after a grace delay.
pub struct SideEffectScheduler {
	recorder: Arc<dyn ActivityRecorder>,
	cache: Arc<dyn CacheInvalidator>,
	grace: Duration,
}

impl SideEffectScheduler {
	pub fn new(recorder: Arc<dyn ActivityRecorder>, cache: Arc<dyn CacheInvalidator>) -> Self {
		Self {
			recorder,
			cache,
			grace: DEFAULT_INVALIDATION_GRACE,
		}
	}

	pub fn with_grace(mut self, grace: Duration) -> Self {
		self.grace = grace;
		self
	}

	pub fn grace(&self) -> Duration {
		self.grace
	}
}

impl EffectScheduler for SideEffectScheduler {
	fn schedule(&self, effects: PostBroadcast) -> ScheduledEffects {
		let runtime = match tokio::runtime::Handle::try_current() {
			Ok(runtime) => runtime,
			Err(e) => {
				error!("Dropping side effects for {}: no runtime ({})", effects.action, e);
				return ScheduledEffects::default();
			}
		};

		let recorder = self.recorder.clone();
		let event = effects.activity();
		let activity = runtime.spawn(async move {
			let action = event.action.clone();
			if let Err(e) = recorder.record(event).await {
				warn!("Failed to record {} activity: {}", action, e);
			}
		});

		let cache = self.cache.clone();
		let keys = effects.cache_keys();
		let grace = self.grace;
		let invalidation = runtime.spawn(async move {
			tokio::time::sleep(grace).await;
			debug!("Invalidating {} cache key(s)", keys.len());
			if let Err(e) = cache.invalidate(&keys).await {
				warn!("Failed to invalidate cache keys: {}", e);
			}
		});

		ScheduledEffects {
			handles: vec![activity, invalidation],
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::memory::{MemoryActivityLog, MemoryCache};
	use broadcast_types::ProviderMethod;

	struct FailingBackend;

	#[async_trait]
	impl CacheInvalidator for FailingBackend {
		async fn invalidate(&self, _keys: &[CacheKey]) -> Result<(), EffectError> {
			Err(EffectError::Backend("cache offline".into()))
		}
	}

	#[async_trait]
	impl ActivityRecorder for FailingBackend {
		async fn record(&self, _event: ActivityEvent) -> Result<(), EffectError> {
			Err(EffectError::Backend("analytics offline".into()))
		}
	}

	fn account(name: &str) -> AccountName {
		AccountName::new(name).unwrap()
	}

	fn post_broadcast() -> PostBroadcast {
		PostBroadcast {
			action: Action::Transfer,
			account: account("alice"),
			affected: vec![account("alice"), account("bob")],
			confirmation: Confirmation {
				transaction_id: "abc".to_string(),
				block_num: 10,
				method: ProviderMethod::LocalKey,
			},
		}
	}

	#[test]
	fn test_cache_keys_cover_every_affected_account() {
		let keys: Vec<String> = post_broadcast()
			.cache_keys()
			.into_iter()
			.map(|k| k.0)
			.collect();
		assert_eq!(
			keys,
			vec![
				"wallet:balances:alice",
				"wallet:history:alice",
				"wallet:balances:bob",
				"wallet:history:bob",
			]
		);
	}

	#[tokio::test(start_paused = true)]
	async fn test_invalidation_waits_for_grace() {
		let log = Arc::new(MemoryActivityLog::new());
		let cache = Arc::new(MemoryCache::new());
		let scheduler = SideEffectScheduler::new(log.clone(), cache.clone())
			.with_grace(Duration::from_secs(5));

		let scheduled = scheduler.schedule(post_broadcast());

		tokio::time::sleep(Duration::from_secs(4)).await;
		assert_eq!(log.events().await.len(), 1);
		assert!(cache.invalidated().await.is_empty());

		tokio::time::sleep(Duration::from_secs(2)).await;
		scheduled.join().await;
		assert_eq!(cache.invalidated().await.len(), 4);

		let event = &log.events().await[0];
		assert_eq!(event.action, "transfer");
		assert_eq!(event.block_num, Some(10));
	}

	#[tokio::test(start_paused = true)]
	async fn test_backend_failures_are_swallowed() {
		let backend = Arc::new(FailingBackend);
		let scheduler = SideEffectScheduler::new(backend.clone(), backend);
		scheduler.schedule(post_broadcast()).join().await;
	}

	#[tokio::test]
	async fn test_noop_scheduler_schedules_nothing() {
		assert!(NoopScheduler.schedule(post_broadcast()).is_empty());
	}

	#[test]
	fn test_schedule_outside_runtime_is_dropped() {
		let log = Arc::new(MemoryActivityLog::new());
		let scheduler = SideEffectScheduler::new(log, Arc::new(MemoryCache::new()));
		assert!(scheduler.schedule(post_broadcast()).is_empty());
	}
}

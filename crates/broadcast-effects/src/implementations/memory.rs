//! In-memory side-effect backends.
//!
//! Useful for tests and for hosts that keep their wallet cache in process.
//! The invalidation log is bounded; hosts that consume it should drain it
//! with `MemoryCache::take_invalidated`.

use crate::{ActivityEvent, ActivityRecorder, CacheInvalidator, CacheKey, EffectError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Most invalidated keys kept for inspection; older ones are dropped first.
const INVALIDATION_LOG_CAPACITY: usize = 1024;

/// Key-value cache that remembers which keys were invalidated.
#[derive(Default)]
pub struct MemoryCache {
	entries: RwLock<HashMap<CacheKey, Vec<u8>>>,
	invalidated: RwLock<Vec<CacheKey>>,
}

impl MemoryCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn put(&self, key: CacheKey, value: Vec<u8>) {
		self.entries.write().await.insert(key, value);
	}

	pub async fn get(&self, key: &CacheKey) -> Option<Vec<u8>> {
		self.entries.read().await.get(key).cloned()
	}

	/// Recently invalidated keys, oldest first.
	pub async fn invalidated(&self) -> Vec<CacheKey> {
		self.invalidated.read().await.clone()
	}

	/// Returns the invalidation log and empties it.
	pub async fn take_invalidated(&self) -> Vec<CacheKey> {
		std::mem::take(&mut *self.invalidated.write().await)
	}
}

#[async_trait]
impl CacheInvalidator for MemoryCache {
	async fn invalidate(&self, keys: &[CacheKey]) -> Result<(), EffectError> {
		let mut entries = self.entries.write().await;
		for key in keys {
			entries.remove(key);
		}
		let mut invalidated = self.invalidated.write().await;
		invalidated.extend_from_slice(keys);
		let overflow = invalidated.len().saturating_sub(INVALIDATION_LOG_CAPACITY);
		invalidated.drain(..overflow);
		Ok(())
	}
}

/// Activity recorder that keeps events in memory.
#[derive(Default)]
pub struct MemoryActivityLog {
	events: RwLock<Vec<ActivityEvent>>,
}

impl MemoryActivityLog {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn events(&self) -> Vec<ActivityEvent> {
		self.events.read().await.clone()
	}
}

#[async_trait]
impl ActivityRecorder for MemoryActivityLog {
	async fn record(&self, event: ActivityEvent) -> Result<(), EffectError> {
		self.events.write().await.push(event);
		Ok(())
	}
}

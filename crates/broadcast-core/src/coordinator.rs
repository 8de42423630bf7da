//! Fallback chain coordinator.
//!
//! Walks the caller's provider chain in order. Each method is either skipped
//! (unavailable to the caller, not registered, or its capability check fails),
//! or attempted exactly once. The walk stops at the first success or the
//! first terminal failure; declines and retryable failures are recorded and
//! the next method is tried. Nothing is retried against the same provider.

use crate::classifier::{classify, ErrorClass};
use broadcast_signers::SignerInterface;
use broadcast_types::{
	AttemptFailure, AttemptOutcome, AuthContext, AuthorityLevel, BroadcastError, BroadcastResult,
	Confirmation, FailureReason, OperationDescriptor, ProviderMethod,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

#[derive(Default)]
pub struct BroadcastCoordinator {
	signers: HashMap<ProviderMethod, Arc<dyn SignerInterface>>,
}

impl BroadcastCoordinator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers an adapter under its own method, returning any adapter it replaced.
	pub fn register(
		&mut self,
		signer: Arc<dyn SignerInterface>,
	) -> Option<Arc<dyn SignerInterface>> {
		self.signers.insert(signer.method(), signer)
	}

	pub fn signer(&self, method: ProviderMethod) -> Option<&Arc<dyn SignerInterface>> {
		self.signers.get(&method)
	}

	pub fn registered_methods(&self) -> Vec<ProviderMethod> {
		let mut methods: Vec<_> = self.signers.keys().copied().collect();
		methods.sort();
		methods
	}

	#[instrument(skip_all, fields(account = %ctx.account, authority = %authority))]
	pub async fn broadcast(
		&self,
		operations: &[OperationDescriptor],
		authority: AuthorityLevel,
		ctx: &AuthContext,
	) -> BroadcastResult {
		if operations.is_empty() {
			return Err(BroadcastError::InvalidRequest(
				"No operations to broadcast".to_string(),
			));
		}

		let methods = ctx.methods_to_try();
		if methods.is_empty() {
			return Err(BroadcastError::InvalidRequest(
				"No signing method configured".to_string(),
			));
		}

		let mut failures = Vec::with_capacity(methods.len());
		for method in methods {
			match self.attempt(method, operations, authority, ctx).await {
				AttemptOutcome::Success(receipt) => {
					let confirmation = Confirmation::new(receipt, method);
					info!(
						"Broadcast {} confirmed in block {} via {}",
						confirmation.transaction_id, confirmation.block_num, method
					);
					return Ok(confirmation);
				}
				AttemptOutcome::Declined(reason) => {
					debug!("{} declined: {}", method, reason);
					failures.push(AttemptFailure {
						method,
						reason: FailureReason::Declined(reason),
					});
				}
				AttemptOutcome::Failed(error) => match classify(&error) {
					ErrorClass::Retryable => {
						warn!("{} failed, trying next provider: {}", method, error);
						failures.push(AttemptFailure {
							method,
							reason: FailureReason::Failed(error),
						});
					}
					ErrorClass::Terminal => {
						error!("{} failed, aborting broadcast: {}", method, error);
						return Err(BroadcastError::Aborted { method, error });
					}
				},
			}
		}

		warn!("All {} provider(s) exhausted", failures.len());
		Err(BroadcastError::AllProvidersExhausted(failures))
	}

	async fn attempt(
		&self,
		method: ProviderMethod,
		operations: &[OperationDescriptor],
		authority: AuthorityLevel,
		ctx: &AuthContext,
	) -> AttemptOutcome {
		if !ctx.is_available(method) {
			return AttemptOutcome::Declined("Not available to this caller".to_string());
		}
		let Some(signer) = self.signers.get(&method) else {
			return AttemptOutcome::Declined("No adapter registered".to_string());
		};
		if !signer.is_available().await {
			return AttemptOutcome::Declined("Capability check failed".to_string());
		}

		debug!("Attempting broadcast via {}", method);
		signer.attempt(operations, authority, &ctx.account).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use broadcast_types::{AccountName, Amount, LedgerError, SignerError, TransactionReceipt};
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	struct ScriptedSigner {
		method: ProviderMethod,
		available: bool,
		outcome: AttemptOutcome,
		calls: AtomicUsize,
	}

	impl ScriptedSigner {
		fn new(method: ProviderMethod, outcome: AttemptOutcome) -> Arc<Self> {
			Arc::new(Self {
				method,
				available: true,
				outcome,
				calls: AtomicUsize::new(0),
			})
		}

		fn unavailable(method: ProviderMethod) -> Arc<Self> {
			Arc::new(Self {
				method,
				available: false,
				outcome: AttemptOutcome::Success(receipt()),
				calls: AtomicUsize::new(0),
			})
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl SignerInterface for ScriptedSigner {
		fn method(&self) -> ProviderMethod {
			self.method
		}

		async fn is_available(&self) -> bool {
			self.available
		}

		async fn attempt(
			&self,
			_operations: &[OperationDescriptor],
			_authority: AuthorityLevel,
			_account: &AccountName,
		) -> AttemptOutcome {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.outcome.clone()
		}
	}

	fn receipt() -> TransactionReceipt {
		TransactionReceipt {
			transaction_id: "a1b2c3".to_string(),
			block_num: 42,
		}
	}

	fn confirmed_by(method: ProviderMethod) -> Confirmation {
		Confirmation::new(receipt(), method)
	}

	fn alice() -> AccountName {
		AccountName::new("alice").unwrap()
	}

	fn transfer() -> Vec<OperationDescriptor> {
		vec![OperationDescriptor::Transfer {
			from: alice(),
			to: AccountName::new("bob").unwrap(),
			amount: "1.000 HIVE".parse::<Amount>().unwrap(),
			memo: String::new(),
		}]
	}

	fn coordinator(signers: &[Arc<ScriptedSigner>]) -> BroadcastCoordinator {
		let mut coordinator = BroadcastCoordinator::new();
		for signer in signers {
			coordinator.register(signer.clone());
		}
		coordinator
	}

	fn chain(methods: &[ProviderMethod]) -> AuthContext {
		AuthContext::new(alice()).with_chain(methods.to_vec())
	}

	#[tokio::test]
	async fn test_decline_then_success_stops_chain() {
		let local = ScriptedSigner::new(
			ProviderMethod::LocalKey,
			AttemptOutcome::Declined("no key".into()),
		);
		let oauth = ScriptedSigner::new(
			ProviderMethod::OAuthBroadcastService,
			AttemptOutcome::Success(receipt()),
		);
		let remote = ScriptedSigner::new(
			ProviderMethod::RemoteSignerRoundTrip,
			AttemptOutcome::Success(receipt()),
		);
		let coordinator = coordinator(&[local.clone(), oauth.clone(), remote.clone()]);
		let ctx = chain(&[
			ProviderMethod::LocalKey,
			ProviderMethod::OAuthBroadcastService,
			ProviderMethod::RemoteSignerRoundTrip,
		]);

		let result = coordinator
			.broadcast(&transfer(), AuthorityLevel::Active, &ctx)
			.await;

		let confirmation = result.unwrap();
		assert_eq!(confirmation.method, ProviderMethod::OAuthBroadcastService);
		assert_eq!(confirmation, confirmed_by(ProviderMethod::OAuthBroadcastService));
		assert_eq!(local.calls(), 1);
		assert_eq!(oauth.calls(), 1);
		assert_eq!(remote.calls(), 0);
	}

	#[tokio::test]
	async fn test_retryable_failures_fall_through() {
		let extension = ScriptedSigner::new(
			ProviderMethod::BrowserExtension,
			AttemptOutcome::Failed(SignerError::Cancelled("popup closed".into())),
		);
		let remote = ScriptedSigner::new(
			ProviderMethod::RemoteSignerRoundTrip,
			AttemptOutcome::Failed(SignerError::Timeout(Duration::from_secs(60))),
		);
		let custom = ScriptedSigner::new(
			ProviderMethod::CustomAdapter,
			AttemptOutcome::Success(receipt()),
		);
		let coordinator = coordinator(&[extension.clone(), remote.clone(), custom.clone()]);
		let ctx = chain(&[
			ProviderMethod::BrowserExtension,
			ProviderMethod::RemoteSignerRoundTrip,
			ProviderMethod::CustomAdapter,
		]);

		let result = coordinator
			.broadcast(&transfer(), AuthorityLevel::Active, &ctx)
			.await;

		assert_eq!(result, Ok(confirmed_by(ProviderMethod::CustomAdapter)));
		assert_eq!(custom.calls(), 1);
	}

	#[tokio::test]
	async fn test_terminal_failure_aborts_chain() {
		let local = ScriptedSigner::new(
			ProviderMethod::LocalKey,
			AttemptOutcome::Failed(SignerError::LedgerRejected(LedgerError::InsufficientFunds(
				"alice has 0.500 HIVE".into(),
			))),
		);
		let oauth = ScriptedSigner::new(
			ProviderMethod::OAuthBroadcastService,
			AttemptOutcome::Success(receipt()),
		);
		let coordinator = coordinator(&[local.clone(), oauth.clone()]);
		let ctx = chain(&[ProviderMethod::LocalKey, ProviderMethod::OAuthBroadcastService]);

		let result = coordinator
			.broadcast(&transfer(), AuthorityLevel::Active, &ctx)
			.await;

		match result {
			Err(BroadcastError::Aborted { method, error }) => {
				assert_eq!(method, ProviderMethod::LocalKey);
				assert!(matches!(
					error,
					SignerError::LedgerRejected(LedgerError::InsufficientFunds(_))
				));
			}
			other => panic!("expected abort, got {:?}", other),
		}
		assert_eq!(oauth.calls(), 0);
	}

	#[tokio::test]
	async fn test_authority_mismatch_aborts_chain() {
		let oauth = ScriptedSigner::new(
			ProviderMethod::OAuthBroadcastService,
			AttemptOutcome::Failed(SignerError::AuthorityMismatch {
				required: AuthorityLevel::Active,
				granted: AuthorityLevel::Posting,
			}),
		);
		let remote = ScriptedSigner::new(
			ProviderMethod::RemoteSignerRoundTrip,
			AttemptOutcome::Success(receipt()),
		);
		let coordinator = coordinator(&[oauth.clone(), remote.clone()]);
		let ctx = chain(&[
			ProviderMethod::OAuthBroadcastService,
			ProviderMethod::RemoteSignerRoundTrip,
		]);

		let result = coordinator
			.broadcast(&transfer(), AuthorityLevel::Active, &ctx)
			.await;

		assert!(matches!(result, Err(BroadcastError::Aborted { .. })));
		assert_eq!(remote.calls(), 0);
	}

	#[tokio::test]
	async fn test_exhaustion_reports_failures_in_order() {
		let local = ScriptedSigner::new(
			ProviderMethod::LocalKey,
			AttemptOutcome::Declined("no key".into()),
		);
		let remote = ScriptedSigner::new(
			ProviderMethod::RemoteSignerRoundTrip,
			AttemptOutcome::Failed(SignerError::Superseded),
		);
		let coordinator = coordinator(&[local, remote]);
		let ctx = chain(&[
			ProviderMethod::LocalKey,
			ProviderMethod::RemoteSignerRoundTrip,
			ProviderMethod::CustomAdapter,
		]);

		let result = coordinator
			.broadcast(&transfer(), AuthorityLevel::Active, &ctx)
			.await;

		let Err(BroadcastError::AllProvidersExhausted(failures)) = result else {
			panic!("expected exhaustion, got {:?}", result);
		};
		let methods: Vec<_> = failures.iter().map(|f| f.method).collect();
		assert_eq!(
			methods,
			vec![
				ProviderMethod::LocalKey,
				ProviderMethod::RemoteSignerRoundTrip,
				ProviderMethod::CustomAdapter,
			]
		);
		assert!(matches!(failures[0].reason, FailureReason::Declined(_)));
		assert_eq!(
			failures[1].reason,
			FailureReason::Failed(SignerError::Superseded)
		);
		assert!(matches!(failures[2].reason, FailureReason::Declined(_)));
	}

	#[tokio::test]
	async fn test_fallback_disabled_tries_exactly_one() {
		let local = ScriptedSigner::new(
			ProviderMethod::LocalKey,
			AttemptOutcome::Declined("no key".into()),
		);
		let oauth = ScriptedSigner::new(
			ProviderMethod::OAuthBroadcastService,
			AttemptOutcome::Success(receipt()),
		);
		let coordinator = coordinator(&[local.clone(), oauth.clone()]);
		let ctx = chain(&[ProviderMethod::LocalKey, ProviderMethod::OAuthBroadcastService])
			.only(ProviderMethod::LocalKey);

		let result = coordinator
			.broadcast(&transfer(), AuthorityLevel::Active, &ctx)
			.await;

		let Err(BroadcastError::AllProvidersExhausted(failures)) = result else {
			panic!("expected exhaustion, got {:?}", result);
		};
		assert_eq!(failures.len(), 1);
		assert_eq!(local.calls(), 1);
		assert_eq!(oauth.calls(), 0);
	}

	#[tokio::test]
	async fn test_unavailable_methods_are_skipped_without_attempt() {
		let local = ScriptedSigner::new(
			ProviderMethod::LocalKey,
			AttemptOutcome::Success(receipt()),
		);
		let extension = ScriptedSigner::unavailable(ProviderMethod::BrowserExtension);
		let oauth = ScriptedSigner::new(
			ProviderMethod::OAuthBroadcastService,
			AttemptOutcome::Success(receipt()),
		);
		let coordinator = coordinator(&[local.clone(), extension.clone(), oauth.clone()]);
		let ctx = chain(&[
			ProviderMethod::LocalKey,
			ProviderMethod::BrowserExtension,
			ProviderMethod::OAuthBroadcastService,
		])
		.with_available([
			ProviderMethod::BrowserExtension,
			ProviderMethod::OAuthBroadcastService,
		]);

		let result = coordinator
			.broadcast(&transfer(), AuthorityLevel::Active, &ctx)
			.await;

		assert_eq!(result, Ok(confirmed_by(ProviderMethod::OAuthBroadcastService)));
		assert_eq!(local.calls(), 0);
		assert_eq!(extension.calls(), 0);
		assert_eq!(oauth.calls(), 1);
	}

	#[tokio::test]
	async fn test_unregistered_method_declines() {
		let coordinator = BroadcastCoordinator::new();
		let ctx = chain(&[ProviderMethod::CustomAdapter]);

		let result = coordinator
			.broadcast(&transfer(), AuthorityLevel::Posting, &ctx)
			.await;

		let Err(BroadcastError::AllProvidersExhausted(failures)) = result else {
			panic!("expected exhaustion, got {:?}", result);
		};
		assert_eq!(failures.len(), 1);
		assert_eq!(failures[0].method, ProviderMethod::CustomAdapter);
	}

	#[tokio::test]
	async fn test_duplicate_methods_attempted_once() {
		let remote = ScriptedSigner::new(
			ProviderMethod::RemoteSignerRoundTrip,
			AttemptOutcome::Failed(SignerError::Unavailable("offline".into())),
		);
		let coordinator = coordinator(&[remote.clone()]);
		let ctx = chain(&[
			ProviderMethod::RemoteSignerRoundTrip,
			ProviderMethod::RemoteSignerRoundTrip,
		]);

		let _ = coordinator
			.broadcast(&transfer(), AuthorityLevel::Active, &ctx)
			.await;

		assert_eq!(remote.calls(), 1);
	}

	#[tokio::test]
	async fn test_invalid_requests() {
		let local = ScriptedSigner::new(
			ProviderMethod::LocalKey,
			AttemptOutcome::Success(receipt()),
		);
		let coordinator = coordinator(&[local.clone()]);

		let result = coordinator
			.broadcast(&[], AuthorityLevel::Active, &chain(&[ProviderMethod::LocalKey]))
			.await;
		assert!(matches!(result, Err(BroadcastError::InvalidRequest(_))));

		let result = coordinator
			.broadcast(&transfer(), AuthorityLevel::Active, &chain(&[]))
			.await;
		assert!(matches!(result, Err(BroadcastError::InvalidRequest(_))));

		assert_eq!(local.calls(), 0);
	}

	#[test]
	fn test_register_replaces_by_method() {
		let mut coordinator = BroadcastCoordinator::new();
		let first = ScriptedSigner::new(
			ProviderMethod::LocalKey,
			AttemptOutcome::Declined("first".into()),
		);
		let second = ScriptedSigner::new(
			ProviderMethod::LocalKey,
			AttemptOutcome::Declined("second".into()),
		);
		assert!(coordinator.register(first).is_none());
		assert!(coordinator.register(second).is_some());
		assert_eq!(coordinator.registered_methods(), vec![ProviderMethod::LocalKey]);
	}
}

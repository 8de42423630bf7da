//! Companion app round trip signer.
//!
//! A signing request is pushed to a companion application over a
//! `CompanionChannel`; the user approves or rejects it there and the answer
//! comes back through `RemoteSigner::resolve`. The adapter owns a single
//! pending-approval slot: starting a new request resolves any previous one as
//! superseded, so a waiting broadcast is never left dangling.

use crate::SignerInterface;
use async_trait::async_trait;
use broadcast_types::{
	AccountName, AttemptOutcome, AuthorityLevel, LedgerError, OperationDescriptor, ProviderMethod,
	SignerError, TransactionReceipt,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default time the user has to answer on the companion app.
const DEFAULT_APPROVAL_TIMEOUT: Duration = Duration::from_secs(60);

/// A request shown to the user on the companion app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningRequest {
	pub id: Uuid,
	pub account: AccountName,
	pub authority: AuthorityLevel,
	pub operations: Vec<OperationDescriptor>,
	pub expires_at: DateTime<Utc>,
}

/// The companion app's answer to a signing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
	/// The user approved; the app signed and broadcast the transaction.
	Approved(TransactionReceipt),
	/// The user rejected the request.
	Rejected(String),
	/// The app broadcast the transaction and the ledger rejected it.
	LedgerRejected(LedgerError),
}

/// Transport to the companion application.
#[async_trait]
pub trait CompanionChannel: Send + Sync {
	/// Whether a companion session is currently paired.
	async fn is_connected(&self) -> bool;

	/// Delivers a request to the companion app. Returns once it is sent,
	/// not once it is answered.
	async fn send_request(&self, request: SigningRequest) -> Result<(), SignerError>;
}

enum Resolution {
	Decided(ApprovalDecision),
	Superseded,
}

struct PendingApproval {
	id: Uuid,
	responder: oneshot::Sender<Resolution>,
}

/// Clears the pending slot when a waiting attempt is dropped before it
/// finishes, so an abandoned request is not reported as pending.
struct PendingGuard<'a> {
	pending: &'a Mutex<Option<PendingApproval>>,
	id: Uuid,
}

impl Drop for PendingGuard<'_> {
	fn drop(&mut self) {
		// A held lock means resolve, cancel or a newer attempt is already
		// replacing the slot.
		if let Ok(mut pending) = self.pending.try_lock() {
			if pending.as_ref().map(|approval| approval.id) == Some(self.id) {
				debug!("Dropping abandoned signing request {}", self.id);
				*pending = None;
			}
		}
	}
}

/// Signs by round trip through a paired companion application.
pub struct RemoteSigner {
	channel: Arc<dyn CompanionChannel>,
	timeout: Duration,
	pending: Mutex<Option<PendingApproval>>,
}

impl RemoteSigner {
	pub fn new(channel: Arc<dyn CompanionChannel>) -> Self {
		Self {
			channel,
			timeout: DEFAULT_APPROVAL_TIMEOUT,
			pending: Mutex::new(None),
		}
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	/// Delivers the companion app's decision for request `id`.
	///
	/// Returns false if `id` is not the pending request, e.g. because it
	/// already timed out or was superseded.
	pub async fn resolve(&self, id: Uuid, decision: ApprovalDecision) -> bool {
		let mut pending = self.pending.lock().await;
		match pending.take() {
			Some(approval) if approval.id == id => {
				let _ = approval.responder.send(Resolution::Decided(decision));
				true
			}
			other => {
				*pending = other;
				debug!("Ignoring decision for unknown request {}", id);
				false
			}
		}
	}

	/// Cancels the pending request, if any.
	pub async fn cancel_pending(&self) {
		if let Some(approval) = self.pending.lock().await.take() {
			info!("Cancelling pending signing request {}", approval.id);
			let _ = approval.responder.send(Resolution::Superseded);
		}
	}

	/// The id of the request currently awaiting approval.
	pub async fn pending_request(&self) -> Option<Uuid> {
		self.pending.lock().await.as_ref().map(|approval| approval.id)
	}

	async fn clear_if_pending(&self, id: Uuid) {
		let mut pending = self.pending.lock().await;
		if pending.as_ref().map(|approval| approval.id) == Some(id) {
			*pending = None;
		}
	}
}

#[async_trait]
impl SignerInterface for RemoteSigner {
	fn method(&self) -> ProviderMethod {
		ProviderMethod::RemoteSignerRoundTrip
	}

	async fn is_available(&self) -> bool {
		self.channel.is_connected().await
	}

	async fn attempt(
		&self,
		operations: &[OperationDescriptor],
		authority: AuthorityLevel,
		account: &AccountName,
	) -> AttemptOutcome {
		if !self.channel.is_connected().await {
			return AttemptOutcome::Declined("No companion app paired".to_string());
		}

		let expires_at = match chrono::Duration::from_std(self.timeout) {
			Ok(timeout) => Utc::now() + timeout,
			Err(e) => return AttemptOutcome::Failed(SignerError::Internal(e.to_string())),
		};
		let request = SigningRequest {
			id: Uuid::new_v4(),
			account: account.clone(),
			authority,
			operations: operations.to_vec(),
			expires_at,
		};
		let id = request.id;

		let (responder, response) = oneshot::channel();
		{
			let mut pending = self.pending.lock().await;
			if let Some(previous) = pending.replace(PendingApproval { id, responder }) {
				warn!(
					"Signing request {} superseded by {}",
					previous.id, id
				);
				let _ = previous.responder.send(Resolution::Superseded);
			}
		}
		let _guard = PendingGuard {
			pending: &self.pending,
			id,
		};

		if let Err(e) = self.channel.send_request(request).await {
			self.clear_if_pending(id).await;
			return AttemptOutcome::Failed(e);
		}
		info!("Waiting for companion approval of request {}", id);

		match tokio::time::timeout(self.timeout, response).await {
			Ok(Ok(Resolution::Decided(ApprovalDecision::Approved(receipt)))) => {
				AttemptOutcome::Success(receipt)
			}
			Ok(Ok(Resolution::Decided(ApprovalDecision::Rejected(reason)))) => {
				AttemptOutcome::Failed(SignerError::Cancelled(reason))
			}
			Ok(Ok(Resolution::Decided(ApprovalDecision::LedgerRejected(error)))) => {
				AttemptOutcome::Failed(SignerError::LedgerRejected(error))
			}
			Ok(Ok(Resolution::Superseded)) => AttemptOutcome::Failed(SignerError::Superseded),
			Ok(Err(_)) => AttemptOutcome::Failed(SignerError::Cancelled(
				"Approval channel closed".to_string(),
			)),
			Err(_) => {
				self.clear_if_pending(id).await;
				warn!("Signing request {} timed out after {:?}", id, self.timeout);
				AttemptOutcome::Failed(SignerError::Timeout(self.timeout))
			}
		}
	}
}

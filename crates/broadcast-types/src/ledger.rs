//! Ledger submission interface.
//!
//! The RPC client that serializes and submits a signed transaction lives
//! outside this workspace; adapters that sign locally talk to it through
//! `LedgerClient`.

use crate::errors::LedgerError;
use crate::operation::OperationDescriptor;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An unsigned transaction: the operations to apply atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
	pub operations: Vec<OperationDescriptor>,
	pub expiration: DateTime<Utc>,
}

/// A transaction together with its signatures, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
	pub transaction: Transaction,
	pub signatures: Vec<String>,
}

/// Proof of inclusion returned by whatever submitted the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	pub transaction_id: String,
	pub block_num: u64,
}

/// Submits fully signed transactions to the ledger.
#[async_trait]
pub trait LedgerClient: Send + Sync {
	/// Submits the transaction and waits for inclusion.
	///
	/// Node-level rejections are returned as `LedgerError`, typically built
	/// with `LedgerError::from_node_message`.
	async fn submit(&self, transaction: SignedTransaction) -> Result<TransactionReceipt, LedgerError>;
}

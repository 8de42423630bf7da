//! Wallet actions, their payloads, and the operation descriptors built from them.

use crate::account::{AccountName, Amount};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A user-level wallet action.
///
/// The action alone determines the authority a broadcast needs; see
/// `broadcast_operations::resolve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
	Transfer,
	TransferToSavings,
	WithdrawSavings,
	PowerUp,
	PowerDown,
	CancelPowerDown,
	Delegate,
	Undelegate,
	Stake,
	Unstake,
	Convert,
	ClaimRewards,
	ClaimInterest,
}

impl Action {
	pub const ALL: [Action; 13] = [
		Action::Transfer,
		Action::TransferToSavings,
		Action::WithdrawSavings,
		Action::PowerUp,
		Action::PowerDown,
		Action::CancelPowerDown,
		Action::Delegate,
		Action::Undelegate,
		Action::Stake,
		Action::Unstake,
		Action::Convert,
		Action::ClaimRewards,
		Action::ClaimInterest,
	];

	/// Stable tag used when recording activity for this action.
	pub fn tag(self) -> &'static str {
		match self {
			Action::Transfer => "transfer",
			Action::TransferToSavings => "transfer_to_savings",
			Action::WithdrawSavings => "withdraw_savings",
			Action::PowerUp => "power_up",
			Action::PowerDown => "power_down",
			Action::CancelPowerDown => "cancel_power_down",
			Action::Delegate => "delegate",
			Action::Undelegate => "undelegate",
			Action::Stake => "stake",
			Action::Unstake => "unstake",
			Action::Convert => "convert",
			Action::ClaimRewards => "claim_rewards",
			Action::ClaimInterest => "claim_interest",
		}
	}

	pub fn is_claim(self) -> bool {
		matches!(self, Action::ClaimRewards | Action::ClaimInterest)
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.tag())
	}
}

/// Parameters collected by a wallet form.
///
/// Every field is optional here; the operation builder decides which ones a
/// given (asset, action) pair requires. Amounts stay as strings until the
/// builder parses them so that a malformed value is reported as a payload
/// error rather than a deserialization failure at the UI boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payload {
	pub to: Option<String>,
	pub amount: Option<String>,
	pub memo: Option<String>,
	pub request_id: Option<u32>,
	/// Conversion rate used when an HP amount has to be expressed in VESTS.
	pub vests_per_hp: Option<String>,
	pub reward_hive: Option<String>,
	pub reward_hbd: Option<String>,
	pub reward_vests: Option<String>,
}

impl Payload {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_to(mut self, to: impl Into<String>) -> Self {
		self.to = Some(to.into());
		self
	}

	pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
		self.amount = Some(amount.into());
		self
	}

	pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
		self.memo = Some(memo.into());
		self
	}

	pub fn with_request_id(mut self, request_id: u32) -> Self {
		self.request_id = Some(request_id);
		self
	}

	pub fn with_vests_per_hp(mut self, rate: impl Into<String>) -> Self {
		self.vests_per_hp = Some(rate.into());
		self
	}
}

/// A single ledger operation, ready to be signed.
///
/// Descriptors are immutable once built and carry only the fields their
/// operation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationDescriptor {
	Transfer {
		from: AccountName,
		to: AccountName,
		amount: Amount,
		memo: String,
	},
	TransferToSavings {
		from: AccountName,
		to: AccountName,
		amount: Amount,
		memo: String,
	},
	TransferFromSavings {
		from: AccountName,
		to: AccountName,
		amount: Amount,
		memo: String,
		request_id: u32,
	},
	CancelTransferFromSavings {
		from: AccountName,
		request_id: u32,
	},
	TransferToVesting {
		from: AccountName,
		to: AccountName,
		amount: Amount,
	},
	WithdrawVesting {
		account: AccountName,
		vesting_shares: Amount,
	},
	DelegateVestingShares {
		delegator: AccountName,
		delegatee: AccountName,
		vesting_shares: Amount,
	},
	ClaimRewardBalance {
		account: AccountName,
		reward_hive: Amount,
		reward_hbd: Amount,
		reward_vests: Amount,
	},
	Convert {
		owner: AccountName,
		request_id: u32,
		amount: Amount,
	},
	CollateralizedConvert {
		owner: AccountName,
		request_id: u32,
		amount: Amount,
	},
	CustomJson {
		id: String,
		required_auths: Vec<AccountName>,
		required_posting_auths: Vec<AccountName>,
		json: serde_json::Value,
	},
}

impl OperationDescriptor {
	/// The ledger operation name.
	pub fn name(&self) -> &'static str {
		match self {
			OperationDescriptor::Transfer { .. } => "transfer",
			OperationDescriptor::TransferToSavings { .. } => "transfer_to_savings",
			OperationDescriptor::TransferFromSavings { .. } => "transfer_from_savings",
			OperationDescriptor::CancelTransferFromSavings { .. } => {
				"cancel_transfer_from_savings"
			}
			OperationDescriptor::TransferToVesting { .. } => "transfer_to_vesting",
			OperationDescriptor::WithdrawVesting { .. } => "withdraw_vesting",
			OperationDescriptor::DelegateVestingShares { .. } => "delegate_vesting_shares",
			OperationDescriptor::ClaimRewardBalance { .. } => "claim_reward_balance",
			OperationDescriptor::Convert { .. } => "convert",
			OperationDescriptor::CollateralizedConvert { .. } => "collateralized_convert",
			OperationDescriptor::CustomJson { .. } => "custom_json",
		}
	}

	/// Accounts whose balances this operation touches, signer first.
	pub fn accounts(&self) -> Vec<&AccountName> {
		match self {
			OperationDescriptor::Transfer { from, to, .. }
			| OperationDescriptor::TransferToSavings { from, to, .. }
			| OperationDescriptor::TransferFromSavings { from, to, .. }
			| OperationDescriptor::TransferToVesting { from, to, .. } => vec![from, to],
			OperationDescriptor::CancelTransferFromSavings { from, .. } => vec![from],
			OperationDescriptor::WithdrawVesting { account, .. }
			| OperationDescriptor::ClaimRewardBalance { account, .. } => vec![account],
			OperationDescriptor::DelegateVestingShares {
				delegator,
				delegatee,
				..
			} => vec![delegator, delegatee],
			OperationDescriptor::Convert { owner, .. }
			| OperationDescriptor::CollateralizedConvert { owner, .. } => vec![owner],
			OperationDescriptor::CustomJson {
				required_auths,
				required_posting_auths,
				..
			} => required_auths
				.iter()
				.chain(required_posting_auths.iter())
				.collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn account(name: &str) -> AccountName {
		AccountName::new(name).unwrap()
	}

	#[test]
	fn test_claim_actions() {
		let claims: Vec<Action> = Action::ALL.into_iter().filter(|a| a.is_claim()).collect();
		assert_eq!(claims, vec![Action::ClaimRewards, Action::ClaimInterest]);
	}

	#[test]
	fn test_descriptor_serializes_with_type_tag() {
		let op = OperationDescriptor::Transfer {
			from: account("alice"),
			to: account("bob"),
			amount: "10.000 HIVE".parse().unwrap(),
			memo: String::new(),
		};

		let json = serde_json::to_value(&op).unwrap();
		assert_eq!(json["type"], "transfer");
		assert_eq!(json["amount"], "10.000 HIVE");
		assert_eq!(json["to"], "bob");
	}

	#[test]
	fn test_accounts_lists_counterparties() {
		let op = OperationDescriptor::DelegateVestingShares {
			delegator: account("alice"),
			delegatee: account("carol"),
			vesting_shares: Amount::zero("VESTS"),
		};
		let names: Vec<&str> = op.accounts().into_iter().map(|a| a.as_str()).collect();
		assert_eq!(names, vec!["alice", "carol"]);
	}

	#[test]
	fn test_payload_deserializes_partial_json() {
		let payload: Payload =
			serde_json::from_str(r#"{"to":"bob","amount":"10.000 HIVE"}"#).unwrap();
		assert_eq!(payload.to.as_deref(), Some("bob"));
		assert_eq!(payload.amount.as_deref(), Some("10.000 HIVE"));
		assert!(payload.memo.is_none());
	}
}

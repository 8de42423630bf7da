//! Operation building and authority resolution.
//!
//! This crate turns a wallet action on an asset into the ordered list of
//! ledger operations that implement it, and decides which signing authority
//! the action needs. Both are pure: no I/O, no clocks, no randomness.

use broadcast_types::{
	AccountName, Action, Asset, AuthorityLevel, BroadcastError, OperationDescriptor, Payload,
};
use thiserror::Error;
use tracing::debug;

mod payload;

/// Re-export implementations
pub mod implementations {
	pub mod engine;
	pub mod hive;
	pub mod points;
}

use implementations::{engine, hive, points};

/// Errors raised while building operations.
///
/// These are client programming errors. They are reported before any signer
/// is contacted and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
	/// The asset has no mapping for this action.
	#[error("Unsupported combination: {action} on {asset}")]
	UnsupportedCombination { asset: Asset, action: Action },
	/// A field the action needs is absent from the payload.
	#[error("Missing payload field: {0}")]
	MissingField(&'static str),
	/// A payload field is present but malformed.
	#[error("Invalid value for {field}: {reason}")]
	InvalidValue { field: &'static str, reason: String },
}

impl From<BuildError> for BroadcastError {
	fn from(error: BuildError) -> Self {
		match error {
			BuildError::UnsupportedCombination { asset, action } => {
				BroadcastError::UnsupportedCombination { asset, action }
			}
			other => BroadcastError::InvalidPayload(other.to_string()),
		}
	}
}

/// Returns the minimum authority `action` must be signed with.
///
/// Claim actions cannot move funds out of the account, so they stay on the
/// posting key and can be automated. Everything else needs the active key.
pub fn resolve(action: Action) -> AuthorityLevel {
	match action {
		Action::ClaimRewards | Action::ClaimInterest => AuthorityLevel::Posting,
		Action::Transfer
		| Action::TransferToSavings
		| Action::WithdrawSavings
		| Action::PowerUp
		| Action::PowerDown
		| Action::CancelPowerDown
		| Action::Delegate
		| Action::Undelegate
		| Action::Stake
		| Action::Unstake
		| Action::Convert => AuthorityLevel::Active,
	}
}

/// Builds operation descriptors on behalf of one account.
#[derive(Debug, Clone)]
pub struct OperationBuilder {
	account: AccountName,
}

impl OperationBuilder {
	pub fn for_account(account: AccountName) -> Self {
		Self { account }
	}

	pub fn account(&self) -> &AccountName {
		&self.account
	}

	/// Maps `(asset, action, payload)` to the operations that must be
	/// broadcast together, in order, in a single transaction.
	pub fn build(
		&self,
		asset: &Asset,
		action: Action,
		payload: &Payload,
	) -> Result<Vec<OperationDescriptor>, BuildError> {
		let authority = resolve(action);
		let account = &self.account;
		let unsupported = || BuildError::UnsupportedCombination {
			asset: asset.clone(),
			action,
		};

		let operations = match action {
			Action::Transfer => match asset {
				Asset::Hive | Asset::Hbd => vec![hive::transfer(account, asset, payload)?],
				Asset::Points => vec![points::transfer(account, authority, payload)?],
				Asset::Engine(symbol) => vec![engine::transfer(account, symbol, authority, payload)?],
				Asset::HivePower => return Err(unsupported()),
			},
			Action::TransferToSavings => match asset {
				Asset::Hive | Asset::Hbd => vec![hive::transfer_to_savings(account, asset, payload)?],
				_ => return Err(unsupported()),
			},
			Action::WithdrawSavings => match asset {
				Asset::Hive | Asset::Hbd => {
					vec![hive::transfer_from_savings(account, asset, payload)?]
				}
				_ => return Err(unsupported()),
			},
			Action::PowerUp => match asset {
				Asset::Hive | Asset::HivePower => vec![hive::power_up(account, payload)?],
				_ => return Err(unsupported()),
			},
			Action::PowerDown => match asset {
				Asset::HivePower => vec![hive::power_down(account, payload)?],
				_ => return Err(unsupported()),
			},
			Action::CancelPowerDown => match asset {
				Asset::HivePower => vec![hive::cancel_power_down(account)],
				_ => return Err(unsupported()),
			},
			Action::Delegate => match asset {
				Asset::HivePower => vec![hive::delegate(account, payload)?],
				Asset::Engine(symbol) => vec![engine::delegate(account, symbol, authority, payload)?],
				_ => return Err(unsupported()),
			},
			Action::Undelegate => match asset {
				Asset::HivePower => vec![hive::undelegate(account, payload)?],
				Asset::Engine(symbol) => {
					vec![engine::undelegate(account, symbol, authority, payload)?]
				}
				_ => return Err(unsupported()),
			},
			Action::Stake => match asset {
				Asset::Engine(symbol) => vec![engine::stake(account, symbol, authority, payload)?],
				_ => return Err(unsupported()),
			},
			Action::Unstake => match asset {
				Asset::Engine(symbol) => vec![engine::unstake(account, symbol, authority, payload)?],
				_ => return Err(unsupported()),
			},
			Action::Convert => match asset {
				Asset::Hive | Asset::Hbd => vec![hive::convert(account, asset, payload)?],
				_ => return Err(unsupported()),
			},
			Action::ClaimRewards => match asset {
				Asset::Hive | Asset::Hbd | Asset::HivePower => {
					vec![hive::claim_reward_balance(account, payload)?]
				}
				Asset::Points => vec![points::claim(account, authority)],
				Asset::Engine(symbol) => vec![engine::claim(account, symbol, authority)],
			},
			Action::ClaimInterest => match asset {
				Asset::Hbd => hive::claim_interest(account, payload)?,
				_ => return Err(unsupported()),
			},
		};

		debug!(
			"Built {} operation(s) for {} on {} by {}",
			operations.len(),
			action,
			asset,
			account
		);
		Ok(operations)
	}
}

/// Custom JSON operation signed by `account` with the given authority.
///
/// The account is listed under the auths matching `authority`, so the
/// descriptor always agrees with the resolver.
pub(crate) fn custom_json(
	id: &str,
	account: &AccountName,
	authority: AuthorityLevel,
	json: serde_json::Value,
) -> OperationDescriptor {
	let (required_auths, required_posting_auths) = match authority {
		AuthorityLevel::Active => (vec![account.clone()], Vec::new()),
		AuthorityLevel::Posting => (Vec::new(), vec![account.clone()]),
	};

	OperationDescriptor::CustomJson {
		id: id.to_string(),
		required_auths,
		required_posting_auths,
		json,
	}
}

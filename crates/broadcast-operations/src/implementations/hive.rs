//! Native ledger operations for HIVE, HBD and Hive Power.

use crate::payload::{
	amount, memo, optional_amount, recipient, recipient_or, request_id, vesting_shares,
};
use crate::BuildError;
use broadcast_types::{AccountName, Amount, Asset, OperationDescriptor, Payload};
use rust_decimal::Decimal;

/// Amount withdrawn from savings to trigger an interest payout.
const INTEREST_TRIGGER_MILLI_HBD: i64 = 1;

pub fn transfer(
	from: &AccountName,
	asset: &Asset,
	payload: &Payload,
) -> Result<OperationDescriptor, BuildError> {
	Ok(OperationDescriptor::Transfer {
		from: from.clone(),
		to: recipient(payload)?,
		amount: amount(payload, &[asset.symbol()])?,
		memo: memo(payload)?,
	})
}

pub fn transfer_to_savings(
	from: &AccountName,
	asset: &Asset,
	payload: &Payload,
) -> Result<OperationDescriptor, BuildError> {
	Ok(OperationDescriptor::TransferToSavings {
		from: from.clone(),
		to: recipient_or(payload, from)?,
		amount: amount(payload, &[asset.symbol()])?,
		memo: memo(payload)?,
	})
}

pub fn transfer_from_savings(
	from: &AccountName,
	asset: &Asset,
	payload: &Payload,
) -> Result<OperationDescriptor, BuildError> {
	Ok(OperationDescriptor::TransferFromSavings {
		from: from.clone(),
		to: recipient_or(payload, from)?,
		amount: amount(payload, &[asset.symbol()])?,
		memo: memo(payload)?,
		request_id: request_id(payload)?,
	})
}

/// Stakes HIVE, to the signer unless the payload names another account.
pub fn power_up(from: &AccountName, payload: &Payload) -> Result<OperationDescriptor, BuildError> {
	Ok(OperationDescriptor::TransferToVesting {
		from: from.clone(),
		to: recipient_or(payload, from)?,
		amount: amount(payload, &["HIVE"])?,
	})
}

pub fn power_down(
	account: &AccountName,
	payload: &Payload,
) -> Result<OperationDescriptor, BuildError> {
	Ok(OperationDescriptor::WithdrawVesting {
		account: account.clone(),
		vesting_shares: vesting_shares(payload)?,
	})
}

/// A zero withdrawal stops an active power-down.
pub fn cancel_power_down(account: &AccountName) -> OperationDescriptor {
	OperationDescriptor::WithdrawVesting {
		account: account.clone(),
		vesting_shares: Amount::zero("VESTS"),
	}
}

pub fn delegate(
	delegator: &AccountName,
	payload: &Payload,
) -> Result<OperationDescriptor, BuildError> {
	Ok(OperationDescriptor::DelegateVestingShares {
		delegator: delegator.clone(),
		delegatee: recipient(payload)?,
		vesting_shares: vesting_shares(payload)?,
	})
}

/// Delegating zero shares removes an existing delegation.
pub fn undelegate(
	delegator: &AccountName,
	payload: &Payload,
) -> Result<OperationDescriptor, BuildError> {
	Ok(OperationDescriptor::DelegateVestingShares {
		delegator: delegator.clone(),
		delegatee: recipient(payload)?,
		vesting_shares: Amount::zero("VESTS"),
	})
}

/// HBD converts to HIVE directly; HIVE to HBD needs the collateralized path.
pub fn convert(
	owner: &AccountName,
	asset: &Asset,
	payload: &Payload,
) -> Result<OperationDescriptor, BuildError> {
	let owner = owner.clone();
	let request_id = request_id(payload)?;
	let amount = amount(payload, &[asset.symbol()])?;

	Ok(match asset {
		Asset::Hive => OperationDescriptor::CollateralizedConvert {
			owner,
			request_id,
			amount,
		},
		_ => OperationDescriptor::Convert {
			owner,
			request_id,
			amount,
		},
	})
}

pub fn claim_reward_balance(
	account: &AccountName,
	payload: &Payload,
) -> Result<OperationDescriptor, BuildError> {
	Ok(OperationDescriptor::ClaimRewardBalance {
		account: account.clone(),
		reward_hive: optional_amount("reward_hive", payload.reward_hive.as_deref(), "HIVE")?,
		reward_hbd: optional_amount("reward_hbd", payload.reward_hbd.as_deref(), "HBD")?,
		reward_vests: optional_amount("reward_vests", payload.reward_vests.as_deref(), "VESTS")?,
	})
}

/// Savings interest is paid whenever the savings balance changes, so a
/// minimal withdrawal is started and cancelled in the same transaction.
pub fn claim_interest(
	account: &AccountName,
	payload: &Payload,
) -> Result<Vec<OperationDescriptor>, BuildError> {
	let request_id = request_id(payload)?;

	Ok(vec![
		OperationDescriptor::TransferFromSavings {
			from: account.clone(),
			to: account.clone(),
			amount: Amount::new(Decimal::new(INTEREST_TRIGGER_MILLI_HBD, 3), "HBD"),
			memo: String::new(),
			request_id,
		},
		OperationDescriptor::CancelTransferFromSavings {
			from: account.clone(),
			request_id,
		},
	])
}

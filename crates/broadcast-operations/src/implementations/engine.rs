//! Layer-2 engine tokens, driven through the token contract with custom JSON.

use crate::payload::{amount, memo, recipient, recipient_or};
use crate::{custom_json, BuildError};
use broadcast_types::{AccountName, AuthorityLevel, OperationDescriptor, Payload};
use serde_json::{json, Value};

const CONTRACT_ID: &str = "ssc-mainnet-hive";
const CLAIM_ID: &str = "scot_claim_token";

fn contract_call(
	account: &AccountName,
	authority: AuthorityLevel,
	action: &str,
	payload: Value,
) -> OperationDescriptor {
	custom_json(
		CONTRACT_ID,
		account,
		authority,
		json!({
			"contractName": "tokens",
			"contractAction": action,
			"contractPayload": payload,
		}),
	)
}

fn quantity(symbol: &str, payload: &Payload) -> Result<String, BuildError> {
	Ok(amount(payload, &[symbol])?.quantity_string())
}

pub fn transfer(
	from: &AccountName,
	symbol: &str,
	authority: AuthorityLevel,
	payload: &Payload,
) -> Result<OperationDescriptor, BuildError> {
	Ok(contract_call(
		from,
		authority,
		"transfer",
		json!({
			"symbol": symbol,
			"to": recipient(payload)?,
			"quantity": quantity(symbol, payload)?,
			"memo": memo(payload)?,
		}),
	))
}

pub fn stake(
	from: &AccountName,
	symbol: &str,
	authority: AuthorityLevel,
	payload: &Payload,
) -> Result<OperationDescriptor, BuildError> {
	Ok(contract_call(
		from,
		authority,
		"stake",
		json!({
			"symbol": symbol,
			"to": recipient_or(payload, from)?,
			"quantity": quantity(symbol, payload)?,
		}),
	))
}

pub fn unstake(
	from: &AccountName,
	symbol: &str,
	authority: AuthorityLevel,
	payload: &Payload,
) -> Result<OperationDescriptor, BuildError> {
	Ok(contract_call(
		from,
		authority,
		"unstake",
		json!({
			"symbol": symbol,
			"quantity": quantity(symbol, payload)?,
		}),
	))
}

pub fn delegate(
	from: &AccountName,
	symbol: &str,
	authority: AuthorityLevel,
	payload: &Payload,
) -> Result<OperationDescriptor, BuildError> {
	Ok(contract_call(
		from,
		authority,
		"delegate",
		json!({
			"symbol": symbol,
			"to": recipient(payload)?,
			"quantity": quantity(symbol, payload)?,
		}),
	))
}

pub fn undelegate(
	from: &AccountName,
	symbol: &str,
	authority: AuthorityLevel,
	payload: &Payload,
) -> Result<OperationDescriptor, BuildError> {
	Ok(contract_call(
		from,
		authority,
		"undelegate",
		json!({
			"symbol": symbol,
			"from": recipient(payload)?,
			"quantity": quantity(symbol, payload)?,
		}),
	))
}

pub fn claim(account: &AccountName, symbol: &str, authority: AuthorityLevel) -> OperationDescriptor {
	custom_json(CLAIM_ID, account, authority, json!([{ "symbol": symbol }]))
}

//! Ecency points, moved with custom JSON operations.

use crate::payload::{amount, memo, recipient};
use crate::{custom_json, BuildError};
use broadcast_types::{AccountName, AuthorityLevel, OperationDescriptor, Payload};
use serde_json::json;

const TRANSFER_ID: &str = "ecency_point_transfer";
const CLAIM_ID: &str = "ecency_point_claim";

/// Points are quoted as `POINTS` in the wallet and as `POINT` on chain.
const POINT_SYMBOL: &str = "POINT";

pub fn transfer(
	from: &AccountName,
	authority: AuthorityLevel,
	payload: &Payload,
) -> Result<OperationDescriptor, BuildError> {
	let to = recipient(payload)?;
	let amount = amount(payload, &["POINTS", POINT_SYMBOL])?;

	Ok(custom_json(
		TRANSFER_ID,
		from,
		authority,
		json!({
			"sender": from,
			"receiver": to,
			"amount": format!("{} {}", amount.quantity_string(), POINT_SYMBOL),
			"memo": memo(payload)?,
		}),
	))
}

pub fn claim(account: &AccountName, authority: AuthorityLevel) -> OperationDescriptor {
	custom_json(CLAIM_ID, account, authority, json!({}))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_transfer_body() {
		let alice = AccountName::new("alice").unwrap();
		let payload = Payload::new()
			.with_to("bob")
			.with_amount("12.5 POINTS")
			.with_memo("thanks");
		let op = transfer(&alice, AuthorityLevel::Active, &payload).unwrap();

		match op {
			OperationDescriptor::CustomJson {
				id,
				required_auths,
				json,
				..
			} => {
				assert_eq!(id, TRANSFER_ID);
				assert_eq!(required_auths, vec![alice]);
				assert_eq!(json["receiver"], "bob");
				assert_eq!(json["amount"], "12.500 POINT");
				assert_eq!(json["memo"], "thanks");
			}
			other => panic!("unexpected descriptor {:?}", other),
		}
	}
}

//! Payload field extraction.

use crate::BuildError;
use broadcast_types::{AccountName, Amount, Payload};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Longest memo the ledger accepts, in bytes.
const MAX_MEMO_BYTES: usize = 2048;

pub(crate) fn recipient(payload: &Payload) -> Result<AccountName, BuildError> {
	let to = payload.to.as_deref().ok_or(BuildError::MissingField("to"))?;
	AccountName::new(to).map_err(|e| BuildError::InvalidValue {
		field: "to",
		reason: e.to_string(),
	})
}

/// The recipient, or `default` when the payload names none.
pub(crate) fn recipient_or(
	payload: &Payload,
	default: &AccountName,
) -> Result<AccountName, BuildError> {
	match payload.to {
		Some(_) => recipient(payload),
		None => Ok(default.clone()),
	}
}

pub(crate) fn memo(payload: &Payload) -> Result<String, BuildError> {
	let memo = payload.memo.clone().unwrap_or_default();
	if memo.len() > MAX_MEMO_BYTES {
		return Err(BuildError::InvalidValue {
			field: "memo",
			reason: format!("longer than {} bytes", MAX_MEMO_BYTES),
		});
	}
	Ok(memo)
}

pub(crate) fn request_id(payload: &Payload) -> Result<u32, BuildError> {
	payload
		.request_id
		.ok_or(BuildError::MissingField("request_id"))
}

/// The payload amount, which must be positive and in one of `symbols`.
pub(crate) fn amount(payload: &Payload, symbols: &[&str]) -> Result<Amount, BuildError> {
	let raw = payload
		.amount
		.as_deref()
		.ok_or(BuildError::MissingField("amount"))?;
	let amount = parse_amount("amount", raw)?;

	if !symbols.contains(&amount.symbol.as_str()) {
		return Err(BuildError::InvalidValue {
			field: "amount",
			reason: format!("expected {}, got {}", symbols.join(" or "), amount.symbol),
		});
	}
	check_precision("amount", &amount)?;
	if !amount.is_positive() {
		return Err(BuildError::InvalidValue {
			field: "amount",
			reason: "must be greater than zero".to_string(),
		});
	}
	Ok(amount)
}

/// An optional amount field in a fixed symbol, zero when absent.
pub(crate) fn optional_amount(
	field: &'static str,
	raw: Option<&str>,
	symbol: &str,
) -> Result<Amount, BuildError> {
	let Some(raw) = raw else {
		return Ok(Amount::zero(symbol));
	};
	let amount = parse_amount(field, raw)?;
	if amount.symbol != symbol {
		return Err(BuildError::InvalidValue {
			field,
			reason: format!("expected {}, got {}", symbol, amount.symbol),
		});
	}
	check_precision(field, &amount)?;
	Ok(amount)
}

/// Vesting shares for power-down and delegation.
///
/// VESTS amounts pass through. HP amounts are converted with the payload's
/// `vests_per_hp` rate, which the caller reads from chain properties.
pub(crate) fn vesting_shares(payload: &Payload) -> Result<Amount, BuildError> {
	let amount = amount(payload, &["VESTS", "HP"])?;
	if amount.symbol == "VESTS" {
		return Ok(amount);
	}

	let raw_rate = payload
		.vests_per_hp
		.as_deref()
		.ok_or(BuildError::MissingField("vests_per_hp"))?;
	let rate = Decimal::from_str(raw_rate).map_err(|e| BuildError::InvalidValue {
		field: "vests_per_hp",
		reason: e.to_string(),
	})?;
	if rate <= Decimal::ZERO {
		return Err(BuildError::InvalidValue {
			field: "vests_per_hp",
			reason: "must be greater than zero".to_string(),
		});
	}

	let vests = amount
		.quantity
		.checked_mul(rate)
		.ok_or(BuildError::InvalidValue {
			field: "amount",
			reason: "overflow converting HP to VESTS".to_string(),
		})?;
	Ok(Amount::new(vests.round_dp(6), "VESTS"))
}

/// Rejects quantities with more decimals than the symbol carries on chain,
/// which would otherwise be rounded when the operation is serialized.
fn check_precision(field: &'static str, amount: &Amount) -> Result<(), BuildError> {
	let precision = amount.precision();
	if amount.quantity.normalize().scale() > precision {
		return Err(BuildError::InvalidValue {
			field,
			reason: format!(
				"{} allows at most {} decimal places",
				amount.symbol, precision
			),
		});
	}
	Ok(())
}

fn parse_amount(field: &'static str, raw: &str) -> Result<Amount, BuildError> {
	raw.parse::<Amount>().map_err(|e| BuildError::InvalidValue {
		field,
		reason: e.to_string(),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_hp_converts_to_vests() {
		let payload = Payload::new()
			.with_amount("2.000 HP")
			.with_vests_per_hp("1800.123456");
		let shares = vesting_shares(&payload).unwrap();
		assert_eq!(shares.to_string(), "3600.246912 VESTS");
	}

	#[test]
	fn test_hp_without_rate_is_missing_field() {
		let payload = Payload::new().with_amount("2.000 HP");
		assert_eq!(
			vesting_shares(&payload).unwrap_err(),
			BuildError::MissingField("vests_per_hp")
		);
	}

	#[test]
	fn test_zero_amount_rejected() {
		let payload = Payload::new().with_amount("0.000 HIVE");
		assert!(matches!(
			amount(&payload, &["HIVE"]),
			Err(BuildError::InvalidValue { field: "amount", .. })
		));
	}

	#[test]
	fn test_excess_precision_rejected() {
		for raw in ["10.0005 HIVE", "0.0004 HIVE"] {
			let payload = Payload::new().with_amount(raw);
			assert!(
				matches!(
					amount(&payload, &["HIVE"]),
					Err(BuildError::InvalidValue { field: "amount", .. })
				),
				"{} accepted",
				raw
			);
		}

		let payload = Payload::new().with_amount("1.23456 HBD");
		assert!(amount(&payload, &["HBD"]).is_err());
		assert!(optional_amount("reward_hbd", Some("1.23456 HBD"), "HBD").is_err());
	}

	#[test]
	fn test_trailing_zeros_are_not_excess_precision() {
		let payload = Payload::new().with_amount("10.000000 HIVE");
		assert_eq!(amount(&payload, &["HIVE"]).unwrap().to_string(), "10.000 HIVE");

		let payload = Payload::new().with_amount("1.234567 VESTS");
		assert!(amount(&payload, &["VESTS"]).is_ok());
	}

	#[test]
	fn test_long_memo_rejected() {
		let payload = Payload::new().with_memo("x".repeat(MAX_MEMO_BYTES + 1));
		assert!(memo(&payload).is_err());
	}
}

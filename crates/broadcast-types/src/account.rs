//! Account, asset and amount types.
//!
//! These are the value types that flow from the UI payload into operation
//! descriptors. All of them validate on construction so that a descriptor,
//! once built, never carries a malformed account name or quantity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing account names, assets or amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
	#[error("Invalid account name: {0}")]
	InvalidAccount(String),
	#[error("Invalid asset symbol: {0}")]
	InvalidAsset(String),
	#[error("Invalid amount: {0}")]
	InvalidAmount(String),
}

/// A ledger account name.
///
/// Names are 3 to 16 characters of lowercase letters, digits, `-` and `.`,
/// and must start with a letter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(String);

impl AccountName {
	pub fn new(name: impl Into<String>) -> Result<Self, ValueError> {
		let name = name.into();
		let valid_len = (3..=16).contains(&name.len());
		let starts_with_letter = name
			.chars()
			.next()
			.map(|c| c.is_ascii_lowercase())
			.unwrap_or(false);
		let valid_chars = name
			.chars()
			.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');

		if !(valid_len && starts_with_letter && valid_chars) {
			return Err(ValueError::InvalidAccount(name));
		}
		Ok(Self(name))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for AccountName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl FromStr for AccountName {
	type Err = ValueError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

impl TryFrom<String> for AccountName {
	type Error = ValueError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}

impl From<AccountName> for String {
	fn from(name: AccountName) -> Self {
		name.0
	}
}

/// The asset an action is performed on.
///
/// `HivePower` is the staked form of HIVE (held on-chain as VESTS). `Engine`
/// covers layer-2 tokens that are moved with custom JSON operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Asset {
	Hive,
	Hbd,
	HivePower,
	Points,
	Engine(String),
}

impl Asset {
	pub fn symbol(&self) -> &str {
		match self {
			Asset::Hive => "HIVE",
			Asset::Hbd => "HBD",
			Asset::HivePower => "HP",
			Asset::Points => "POINTS",
			Asset::Engine(symbol) => symbol,
		}
	}
}

impl fmt::Display for Asset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.symbol())
	}
}

impl FromStr for Asset {
	type Err = ValueError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"HIVE" => Ok(Asset::Hive),
			"HBD" => Ok(Asset::Hbd),
			"HP" => Ok(Asset::HivePower),
			"POINTS" | "POINT" => Ok(Asset::Points),
			other if is_token_symbol(other) => Ok(Asset::Engine(other.to_string())),
			other => Err(ValueError::InvalidAsset(other.to_string())),
		}
	}
}

impl TryFrom<String> for Asset {
	type Error = ValueError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<Asset> for String {
	fn from(asset: Asset) -> Self {
		asset.symbol().to_string()
	}
}

fn is_token_symbol(s: &str) -> bool {
	(1..=10).contains(&s.len())
		&& s
			.chars()
			.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.')
}

/// A quantity of some symbol, e.g. `10.000 HIVE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount {
	pub quantity: Decimal,
	pub symbol: String,
}

impl Amount {
	pub fn new(quantity: Decimal, symbol: impl Into<String>) -> Self {
		Self {
			quantity,
			symbol: symbol.into(),
		}
	}

	pub fn zero(symbol: impl Into<String>) -> Self {
		Self::new(Decimal::ZERO, symbol)
	}

	/// Decimal places the ledger expects for this symbol.
	pub fn precision(&self) -> u32 {
		match self.symbol.as_str() {
			"HIVE" | "HBD" | "HP" | "POINT" | "POINTS" => 3,
			"VESTS" => 6,
			_ => self.quantity.scale(),
		}
	}

	pub fn is_positive(&self) -> bool {
		self.quantity > Decimal::ZERO
	}

	/// The quantity rendered with the symbol's precision, without the symbol.
	pub fn quantity_string(&self) -> String {
		let precision = self.precision();
		let mut quantity = self.quantity.round_dp(precision);
		quantity.rescale(precision);
		quantity.to_string()
	}
}

impl fmt::Display for Amount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.quantity_string(), self.symbol)
	}
}

impl FromStr for Amount {
	type Err = ValueError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let mut parts = s.split_whitespace();
		let (Some(quantity), Some(symbol), None) = (parts.next(), parts.next(), parts.next())
		else {
			return Err(ValueError::InvalidAmount(s.to_string()));
		};

		let quantity =
			Decimal::from_str(quantity).map_err(|_| ValueError::InvalidAmount(s.to_string()))?;
		if quantity.is_sign_negative() || !is_token_symbol(symbol) {
			return Err(ValueError::InvalidAmount(s.to_string()));
		}

		Ok(Self::new(quantity, symbol))
	}
}

impl TryFrom<String> for Amount {
	type Error = ValueError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<Amount> for String {
	fn from(amount: Amount) -> Self {
		amount.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_account_name_validation() {
		assert!(AccountName::new("alice").is_ok());
		assert!(AccountName::new("good-karma.2").is_ok());
		assert!(AccountName::new("ab").is_err());
		assert!(AccountName::new("Alice").is_err());
		assert!(AccountName::new("1alice").is_err());
		assert!(AccountName::new("a-name-that-is-way-too-long").is_err());
	}

	#[test]
	fn test_asset_parsing() {
		assert_eq!("HIVE".parse::<Asset>().unwrap(), Asset::Hive);
		assert_eq!("HP".parse::<Asset>().unwrap(), Asset::HivePower);
		assert_eq!(
			"LEO".parse::<Asset>().unwrap(),
			Asset::Engine("LEO".to_string())
		);
		assert!("leo".parse::<Asset>().is_err());
	}

	#[test]
	fn test_amount_parse_and_format() {
		let amount: Amount = "10 HIVE".parse().unwrap();
		assert_eq!(amount.to_string(), "10.000 HIVE");

		let vests: Amount = "1.5 VESTS".parse().unwrap();
		assert_eq!(vests.to_string(), "1.500000 VESTS");

		let token: Amount = "2.12345 LEO".parse().unwrap();
		assert_eq!(token.quantity_string(), "2.12345");
	}

	#[test]
	fn test_amount_rejects_malformed() {
		assert!("HIVE".parse::<Amount>().is_err());
		assert!("ten HIVE".parse::<Amount>().is_err());
		assert!("-1.000 HIVE".parse::<Amount>().is_err());
		assert!("1.000 HIVE extra".parse::<Amount>().is_err());
	}
}

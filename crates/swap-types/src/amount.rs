//! Decimal-string to smallest-unit conversion for token amounts.
//!
//! Amounts cross the aggregator API as integer strings in the token's
//! smallest unit. Conversion is done on U256 so no precision is lost to
//! floating point; formatting truncates rather than rounds.

use alloy_primitives::U256;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
	#[error("invalid amount: {0}")]
	Invalid(String),
	#[error("amount overflows 256 bits")]
	Overflow,
}

fn pow10(decimals: u8) -> U256 {
	U256::from(10).pow(U256::from(decimals))
}

/// Parses a human decimal string (e.g. "1.234567") into the token's
/// smallest integer unit. Fractional digits beyond `decimals` are truncated.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, AmountError> {
	let s = amount.trim();
	if s.is_empty() {
		return Err(AmountError::Invalid("empty amount".into()));
	}

	let (int_part, frac_part) = match s.split_once('.') {
		Some((i, f)) => (i, f),
		None => (s, ""),
	};

	if int_part.is_empty() && frac_part.is_empty() {
		return Err(AmountError::Invalid(s.into()));
	}
	if !int_part.chars().all(|c| c.is_ascii_digit())
		|| !frac_part.chars().all(|c| c.is_ascii_digit())
	{
		return Err(AmountError::Invalid(s.into()));
	}

	let mut frac = frac_part.to_string();
	frac.truncate(decimals as usize);
	while frac.len() < decimals as usize {
		frac.push('0');
	}

	let int_val = if int_part.is_empty() {
		U256::ZERO
	} else {
		U256::from_str_radix(int_part, 10).map_err(|_| AmountError::Overflow)?
	};
	let frac_val = if frac.is_empty() {
		U256::ZERO
	} else {
		U256::from_str_radix(&frac, 10).map_err(|_| AmountError::Overflow)?
	};

	int_val
		.checked_mul(pow10(decimals))
		.and_then(|v| v.checked_add(frac_val))
		.ok_or(AmountError::Overflow)
}

/// Formats a smallest-unit amount back into a human decimal string with at
/// most `precision` fractional digits. Truncates, never rounds.
pub fn format_units(value: U256, decimals: u8, precision: usize) -> String {
	let scale = pow10(decimals);
	let int = value / scale;
	let rem = value % scale;

	if precision == 0 || decimals == 0 {
		return int.to_string();
	}

	let rem_str = rem.to_string();
	let mut frac = "0".repeat((decimals as usize).saturating_sub(rem_str.len()));
	frac.push_str(&rem_str);
	frac.truncate(precision);
	format!("{}.{}", int, frac)
}

/// Serde helper for U256 fields the aggregator sends as decimal strings.
pub mod u256_decimal {
	use alloy_primitives::U256;
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&value.to_string())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
		let s = String::deserialize(deserializer)?;
		U256::from_str_radix(&s, 10).map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_whole_number() {
		assert_eq!(parse_units("10", 6).unwrap(), U256::from(10_000_000u64));
	}

	#[test]
	fn parse_and_format_round_trip() {
		// 6 fractional digits at 18 decimals must survive unchanged.
		let units = parse_units("1.234567", 18).unwrap();
		assert_eq!(format_units(units, 18, 6), "1.234567");
	}

	#[test]
	fn parse_truncates_excess_fraction() {
		// 7th fractional digit is dropped, not rounded up.
		let units = parse_units("0.1234569", 6).unwrap();
		assert_eq!(units, U256::from(123456u64));
	}

	#[test]
	fn format_truncates() {
		// 0.999999 at 4 digits is 0.9999, not 1.0000.
		let units = parse_units("0.999999", 6).unwrap();
		assert_eq!(format_units(units, 6, 4), "0.9999");
	}

	#[test]
	fn format_pads_leading_zeros() {
		let units = U256::from(1u64); // 0.000001 at 6 decimals
		assert_eq!(format_units(units, 6, 6), "0.000001");
	}

	#[test]
	fn rejects_garbage() {
		assert!(parse_units("", 6).is_err());
		assert!(parse_units("abc", 6).is_err());
		assert!(parse_units("1.2.3", 6).is_err());
		assert!(parse_units("-1", 6).is_err());
	}

	#[test]
	fn leading_dot_is_accepted() {
		assert_eq!(parse_units(".5", 2).unwrap(), U256::from(50u64));
	}
}

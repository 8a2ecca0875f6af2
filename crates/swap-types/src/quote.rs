//! Quote types returned by the aggregator's quoter endpoint.
//!
//! The build endpoint expects the quote to be echoed back verbatim, so the
//! parsed view keeps the raw JSON document alongside the validated fields.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::u256_decimal;
use crate::ChainId;

/// Named execution speed/cost tradeoff offered by a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
	Fast,
	Medium,
	Slow,
}

impl fmt::Display for Preset {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Preset::Fast => write!(f, "fast"),
			Preset::Medium => write!(f, "medium"),
			Preset::Slow => write!(f, "slow"),
		}
	}
}

impl std::str::FromStr for Preset {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"fast" => Ok(Preset::Fast),
			"medium" => Ok(Preset::Medium),
			"slow" => Ok(Preset::Slow),
			other => Err(format!("unknown preset: {}", other)),
		}
	}
}

/// Per-preset terms declared by the quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetTerms {
	/// How many secrets (partial fills) an order built from this preset needs.
	pub secrets_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotePresets {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fast: Option<PresetTerms>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub medium: Option<PresetTerms>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub slow: Option<PresetTerms>,
}

impl QuotePresets {
	pub fn get(&self, preset: Preset) -> Option<&PresetTerms> {
		match preset {
			Preset::Fast => self.fast.as_ref(),
			Preset::Medium => self.medium.as_ref(),
			Preset::Slow => self.slow.as_ref(),
		}
	}
}

/// Validated fields of a quote plus the untouched server document.
#[derive(Debug, Clone)]
pub struct Quote {
	pub quote_id: String,
	/// Estimated destination amount in the destination token's smallest unit.
	pub dst_token_amount: U256,
	pub presets: QuotePresets,
	pub recommended_preset: Option<Preset>,
	raw: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteFields {
	quote_id: String,
	#[serde(with = "u256_decimal")]
	dst_token_amount: U256,
	presets: QuotePresets,
	#[serde(default)]
	recommended_preset: Option<Preset>,
}

impl Quote {
	/// Validates a quoter response. The original document is retained so it
	/// can be sent back verbatim to the build endpoint.
	pub fn from_value(raw: serde_json::Value) -> Result<Self, serde_json::Error> {
		let fields: QuoteFields = serde_json::from_value(raw.clone())?;
		Ok(Self {
			quote_id: fields.quote_id,
			dst_token_amount: fields.dst_token_amount,
			presets: fields.presets,
			recommended_preset: fields.recommended_preset,
			raw,
		})
	}

	/// The raw quote document as received from the server.
	pub fn raw(&self) -> &serde_json::Value {
		&self.raw
	}

	/// Number of secrets the given preset requires. Falls back to 1 when the
	/// quote does not declare the preset.
	pub fn secrets_count(&self, preset: Preset) -> usize {
		self.presets.get(preset).map(|p| p.secrets_count).unwrap_or(1)
	}
}

/// Parameters for a quote request. Amount is already converted to the source
/// token's smallest unit; the client performs no decimal conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteParams {
	pub src_chain: ChainId,
	pub dst_chain: ChainId,
	pub src_token_address: Address,
	pub dst_token_address: Address,
	#[serde(with = "u256_decimal")]
	pub amount: U256,
	pub wallet_address: Address,
	pub enable_estimate: bool,
}

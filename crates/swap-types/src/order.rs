//! Order types exchanged with the aggregator's build and relayer endpoints.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// An unsigned order as returned by the build endpoint.
///
/// `typed_data` is the EIP-712 payload the wallet must sign; `extension` is
/// an opaque blob that must be passed through to submission verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltOrder {
	pub typed_data: serde_json::Value,
	pub order_hash: B256,
	pub extension: String,
}

impl BuiltOrder {
	/// The EIP-712 `message` object, which is what the relayer expects in
	/// the submit body.
	pub fn message(&self) -> Option<&serde_json::Value> {
		self.typed_data.get("message")
	}
}

/// An order with its wallet signature attached. Immutable after signing,
/// submitted exactly once.
#[derive(Debug, Clone)]
pub struct SignedOrder {
	pub order: BuiltOrder,
	/// 65-byte signature, 0x-prefixed hex.
	pub signature: String,
}

/// One escrow fill the relayer reports as ready to accept its secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyFill {
	pub idx: usize,
}

/// Response of the ready-to-accept-secret-fills endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadyFills {
	#[serde(default)]
	pub fills: Vec<ReadyFill>,
}

/// Relayer-side lifecycle status of a submitted order. Variant names match
/// the wire values, which are PascalCase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
	Created,
	Pending,
	Executed,
	Expired,
	Refunded,
}

impl OrderStatus {
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			OrderStatus::Executed | OrderStatus::Expired | OrderStatus::Refunded
		)
	}
}

//! The swap attempt lifecycle as a single tagged union.
//!
//! Every transition of the orchestrator is a write of one of these values;
//! `Confirmed` and `Error` are terminal for the attempt.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapStage {
	/// No attempt running.
	Idle,
	/// Secrets generated, order being built.
	Processing,
	/// Allowance check / approval transaction in flight.
	AwaitingApproval,
	/// Wallet produced the typed-data signature.
	Signed,
	/// Order accepted by the relayer; waiting for an escrow fill.
	Submitted { order_hash: B256 },
	/// At least one fill is ready; secrets being revealed.
	Placed { order_hash: B256 },
	/// All required secrets revealed; attempt complete.
	Confirmed { order_hash: B256 },
	/// Attempt failed; requires explicit user restart.
	Error { message: String },
}

impl SwapStage {
	/// Stable lowercase name for display and logging.
	pub fn name(&self) -> &'static str {
		match self {
			SwapStage::Idle => "idle",
			SwapStage::Processing => "processing",
			SwapStage::AwaitingApproval => "awaitingApproval",
			SwapStage::Signed => "signed",
			SwapStage::Submitted { .. } => "submitted",
			SwapStage::Placed { .. } => "placed",
			SwapStage::Confirmed { .. } => "confirmed",
			SwapStage::Error { .. } => "error",
		}
	}

	pub fn is_terminal(&self) -> bool {
		matches!(self, SwapStage::Confirmed { .. } | SwapStage::Error { .. })
	}
}

impl std::fmt::Display for SwapStage {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.name())
	}
}

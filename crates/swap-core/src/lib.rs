//! Swap attempt orchestration.
//!
//! [`orchestrator::SwapOrchestrator`] drives one cross-chain order through
//! its lifecycle: secret generation, order build, approval, signing,
//! submission and the fill-readiness poll loop that reveals secrets.
//! [`quote_watcher::QuoteWatcher`] keeps a live quote for the current form
//! parameters with debouncing and stale-response suppression.

use swap_aggregator::AggregatorError;
use swap_approval::ApprovalError;
use swap_secrets::SecretError;
use swap_types::{AmountError, ChainId, OrderStatus, Preset, Token};
use swap_wallet::WalletError;
use thiserror::Error;

pub mod orchestrator;
pub mod quote_watcher;

pub use orchestrator::{SwapOrchestrator, SwapOutcome};
pub use quote_watcher::{QuoteSnapshot, QuoteWatcher};

/// Failure of a swap attempt. Remote and approval errors pass their message
/// through untouched so the user sees the server's own description.
#[derive(Debug, Error)]
pub enum SwapError {
	#[error("invalid swap request: {0}")]
	Validation(String),
	#[error("{0}")]
	Amount(#[from] AmountError),
	#[error("{0}")]
	Secrets(#[from] SecretError),
	#[error("{0}")]
	Aggregator(#[from] AggregatorError),
	#[error("signature failed: {0}")]
	Signature(WalletError),
	#[error("{0}")]
	Wallet(#[from] WalletError),
	#[error("{0}")]
	Approval(#[from] ApprovalError),
	#[error("no escrow fill became ready within the monitoring window")]
	MonitoringTimeout,
	#[error("order closed relayer-side as {status:?}")]
	OrderClosed { status: OrderStatus },
}

/// A user-confirmed swap: everything needed to run one attempt end to end.
#[derive(Debug, Clone)]
pub struct SwapRequest {
	pub src_chain: ChainId,
	pub dst_chain: ChainId,
	pub src_token: Token,
	pub dst_token: Token,
	/// Human-readable decimal amount of the source token (e.g. "1.5").
	pub amount: String,
	pub preset: Preset,
}

impl SwapRequest {
	/// Structural checks performed before any network call.
	pub fn validate(&self) -> Result<(), SwapError> {
		if self.src_chain == self.dst_chain && self.src_token.address == self.dst_token.address {
			return Err(SwapError::Validation(
				"source and destination token are identical".into(),
			));
		}
		if self.amount.trim().is_empty() {
			return Err(SwapError::Validation("amount is empty".into()));
		}
		Ok(())
	}
}

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::SwapStage;

/// Attempt-scoped notifications the front-end subscribes to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SwapEvent {
	/// The orchestrator moved to a new lifecycle stage.
	StageChanged { stage: SwapStage },
	/// A fresh quote was applied for the current parameter set.
	QuoteUpdated { quote_id: String, dst_token_amount: String },
	/// A quote request failed; `transient` distinguishes transport trouble
	/// (retry on next trigger) from a remote rejection (fix input).
	QuoteFailed { reason: String, transient: bool },
	/// Approval transaction broadcast, awaiting inclusion.
	ApprovalPending { tx_hash: B256 },
	/// Approval transaction mined, awaiting receipt confirmation.
	ApprovalConfirming { tx_hash: B256 },
	/// Allowance is sufficient; `already_sufficient` is true when no
	/// transaction was needed.
	ApprovalCompleted { already_sufficient: bool },
	/// A secret was revealed for a ready fill.
	SecretRevealed { order_hash: B256, fill_idx: usize },
}

pub struct EventBus {
	sender: broadcast::Sender<SwapEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<SwapEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event; a send error only means nobody is listening.
	pub fn publish(&self, event: SwapEvent) {
		let _ = self.sender.send(event);
	}
}

impl Clone for EventBus {
	fn clone(&self) -> Self {
		Self {
			sender: self.sender.clone(),
		}
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(256)
	}
}

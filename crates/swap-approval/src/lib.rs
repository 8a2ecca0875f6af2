//! ERC-20 approval coordination for the order's escrow contract.
//!
//! Before an order can be submitted, the escrow contract must hold a
//! sufficient allowance over the source token. The coordinator checks the
//! current allowance first and only drives an on-chain approve when needed:
//! idle → pending (broadcast) → confirming (awaiting receipt) → success or
//! error. Failures are terminal for the swap attempt; there is no automatic
//! retry.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use swap_types::{Address, EventBus, SwapEvent, B256, U256};
use swap_wallet::{WalletError, WalletService};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ApprovalError {
	#[error("{0}")]
	Wallet(#[from] WalletError),
	#[error("approval transaction {tx_hash} reverted")]
	Reverted { tx_hash: B256 },
}

/// How much allowance to grant when one is needed. The choice affects the
/// user's future risk exposure, so it is always logged before the
/// transaction goes out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalPolicy {
	/// Approve exactly the order amount.
	#[default]
	Exact,
	/// Approve U256::MAX once so later swaps skip this stage.
	Unlimited,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
	/// Existing allowance already covered the amount; no transaction sent.
	AlreadySufficient,
	/// An approve transaction was mined successfully.
	Approved { tx_hash: B256 },
}

pub struct ApprovalCoordinator {
	wallet: Arc<WalletService>,
	events: EventBus,
	policy: ApprovalPolicy,
	receipt_timeout: Duration,
	receipt_poll_interval: Duration,
}

impl ApprovalCoordinator {
	pub fn new(wallet: Arc<WalletService>, events: EventBus) -> Self {
		Self {
			wallet,
			events,
			policy: ApprovalPolicy::default(),
			receipt_timeout: Duration::from_secs(180),
			receipt_poll_interval: Duration::from_secs(2),
		}
	}

	pub fn with_policy(mut self, policy: ApprovalPolicy) -> Self {
		self.policy = policy;
		self
	}

	pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
		self.receipt_timeout = timeout;
		self
	}

	pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
		self.receipt_poll_interval = interval;
		self
	}

	/// Ensures `spender` can move `amount` of `token` from the connected
	/// address. A no-op when the allowance already suffices; otherwise
	/// broadcasts an approve per the configured policy and waits for the
	/// receipt.
	pub async fn ensure_approval(
		&self,
		token: Address,
		spender: Address,
		amount: U256,
	) -> Result<ApprovalOutcome, ApprovalError> {
		let owner = self.wallet.address();
		let current = self.wallet.allowance(token, owner, spender).await?;
		if current >= amount {
			info!(%token, %spender, "existing allowance covers the order amount");
			self.events.publish(SwapEvent::ApprovalCompleted {
				already_sufficient: true,
			});
			return Ok(ApprovalOutcome::AlreadySufficient);
		}

		let approve_amount = match self.policy {
			ApprovalPolicy::Exact => amount,
			ApprovalPolicy::Unlimited => U256::MAX,
		};
		info!(
			%token,
			%spender,
			policy = ?self.policy,
			amount = %approve_amount,
			"requesting token approval"
		);

		let tx_hash = self.wallet.approve(token, spender, approve_amount).await?;
		self.events.publish(SwapEvent::ApprovalPending { tx_hash });

		let receipt = self
			.wallet
			.wait_for_receipt(&tx_hash, self.receipt_timeout, self.receipt_poll_interval)
			.await?;
		// A receipt exists, so the transaction is mined; announce confirming
		// before its outcome is evaluated.
		self.events.publish(SwapEvent::ApprovalConfirming { tx_hash });
		if !receipt.success {
			warn!(%tx_hash, "approval transaction reverted");
			return Err(ApprovalError::Reverted { tx_hash });
		}

		self.events.publish(SwapEvent::ApprovalCompleted {
			already_sufficient: false,
		});
		Ok(ApprovalOutcome::Approved { tx_hash })
	}
}

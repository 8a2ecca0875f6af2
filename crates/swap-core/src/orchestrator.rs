//! The swap attempt state machine.
//!
//! One attempt runs at a time: quote, secrets, build, chain check, approval,
//! signature, submission, then a poll loop that reveals one secret per ready
//! escrow fill until all are out. Stage changes are written to a watch
//! channel and mirrored on the event bus. There is no automatic retry; any
//! failure lands in `error` and stays there until the user starts over.

use crate::{SwapError, SwapRequest};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use swap_aggregator::AggregatorApi;
use swap_approval::ApprovalCoordinator;
use swap_secrets::generate_secrets;
use swap_types::{
	amount, EventBus, OrderStatus, Quote, QuoteParams, SignedOrder, SwapEvent, SwapStage, B256,
	U256,
};
use swap_wallet::WalletService;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// How an attempt ended when it did not error out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
	/// Every required secret was revealed.
	Confirmed {
		order_hash: B256,
		secrets_revealed: usize,
	},
	/// The user stopped monitoring; the order stays live relayer-side.
	Cancelled { order_hash: B256 },
}

pub struct SwapOrchestrator {
	aggregator: Arc<dyn AggregatorApi>,
	wallet: Arc<WalletService>,
	approvals: ApprovalCoordinator,
	events: EventBus,
	stage_tx: watch::Sender<SwapStage>,
	/// Cancel handle for the attempt currently in its poll loop. Replacing it
	/// drops the previous sender, which ends the superseded loop.
	cancel: Mutex<Option<watch::Sender<bool>>>,
	poll_interval: Duration,
	monitoring_timeout: Duration,
}

impl SwapOrchestrator {
	pub fn new(
		aggregator: Arc<dyn AggregatorApi>,
		wallet: Arc<WalletService>,
		approvals: ApprovalCoordinator,
		events: EventBus,
	) -> Self {
		let (stage_tx, _) = watch::channel(SwapStage::Idle);
		Self {
			aggregator,
			wallet,
			approvals,
			events,
			stage_tx,
			cancel: Mutex::new(None),
			poll_interval: Duration::from_secs(5),
			monitoring_timeout: Duration::from_secs(30 * 60),
		}
	}

	pub fn with_poll_interval(mut self, interval: Duration) -> Self {
		self.poll_interval = interval;
		self
	}

	pub fn with_monitoring_timeout(mut self, timeout: Duration) -> Self {
		self.monitoring_timeout = timeout;
		self
	}

	/// Watch channel carrying the current lifecycle stage.
	pub fn stage(&self) -> watch::Receiver<SwapStage> {
		self.stage_tx.subscribe()
	}

	pub fn events(&self) -> &EventBus {
		&self.events
	}

	/// Stops the fill-monitoring loop of the running attempt, if any. The
	/// submitted order itself is not withdrawn.
	pub fn cancel(&self) {
		if let Ok(slot) = self.cancel.lock() {
			if let Some(tx) = slot.as_ref() {
				let _ = tx.send(true);
			}
		}
	}

	/// Runs one swap attempt to completion. On failure the stage moves to
	/// `error` carrying the failure message and the error is returned.
	pub async fn execute(&self, request: &SwapRequest) -> Result<SwapOutcome, SwapError> {
		match self.run(request).await {
			Ok(outcome) => Ok(outcome),
			Err(err) => {
				self.set_stage(SwapStage::Error {
					message: err.to_string(),
				});
				Err(err)
			}
		}
	}

	async fn run(&self, request: &SwapRequest) -> Result<SwapOutcome, SwapError> {
		request.validate()?;
		let amount_units = amount::parse_units(&request.amount, request.src_token.decimals)?;
		if amount_units.is_zero() {
			return Err(SwapError::Validation("amount must be positive".into()));
		}

		self.set_stage(SwapStage::Processing);

		let params = QuoteParams {
			src_chain: request.src_chain,
			dst_chain: request.dst_chain,
			src_token_address: request.src_token.address,
			dst_token_address: request.dst_token.address,
			amount: amount_units,
			wallet_address: self.wallet.address(),
			enable_estimate: true,
		};
		let quote = self.aggregator.get_quote(&params).await?;
		info!(
			quote_id = %quote.quote_id,
			dst_token_amount = %quote.dst_token_amount,
			"quote received for swap attempt"
		);

		let secrets_count = quote.secrets_count(request.preset);
		let hash_lock = generate_secrets(secrets_count)?;
		debug!(secrets_count, hash_lock = %hash_lock.hash_lock, "hash-lock committed");

		let order = self
			.aggregator
			.build_order(&quote, &params, &hash_lock.secret_hashes)
			.await?;

		// The approve and the order signature must both target the source
		// chain; switch the wallet over before either.
		if self.wallet.chain_id().await? != request.src_chain {
			self.wallet.switch_chain(request.src_chain).await?;
		}

		self.set_stage(SwapStage::AwaitingApproval);
		self.ensure_allowance(request, &params.amount).await?;

		let signature = self
			.wallet
			.sign_typed_data(&order.typed_data)
			.await
			.map_err(SwapError::Signature)?;
		self.set_stage(SwapStage::Signed);

		let order_hash = order.order_hash;
		let signed = SignedOrder {
			order,
			signature: signature.to_hex(),
		};
		self.submit(&signed, request, &quote, &hash_lock.secret_hashes)
			.await?;
		self.set_stage(SwapStage::Submitted { order_hash });
		info!(%order_hash, "order accepted by relayer");

		self.monitor_fills(order_hash, &hash_lock.secrets).await
	}

	async fn ensure_allowance(
		&self,
		request: &SwapRequest,
		amount_units: &U256,
	) -> Result<(), SwapError> {
		let escrow = self.aggregator.escrow_address(request.src_chain).await?;
		self.approvals
			.ensure_approval(request.src_token.address, escrow, *amount_units)
			.await?;
		Ok(())
	}

	async fn submit(
		&self,
		signed: &SignedOrder,
		request: &SwapRequest,
		quote: &Quote,
		secret_hashes: &[B256],
	) -> Result<(), SwapError> {
		// The relayer rejects a secretHashes field on single-fill orders.
		let hashes = (secret_hashes.len() > 1).then_some(secret_hashes);
		self.aggregator
			.submit_order(signed, request.src_chain, &quote.quote_id, hashes)
			.await?;
		Ok(())
	}

	/// Polls fill readiness and reveals one secret per newly ready fill.
	/// Ends when all secrets are out (confirmed), the attempt is cancelled or
	/// superseded, or the monitoring window closes.
	async fn monitor_fills(
		&self,
		order_hash: B256,
		secrets: &[B256],
	) -> Result<SwapOutcome, SwapError> {
		let (cancel_tx, mut cancel_rx) = watch::channel(false);
		if let Ok(mut slot) = self.cancel.lock() {
			*slot = Some(cancel_tx);
		}

		let mut revealed = vec![false; secrets.len()];
		let mut revealed_count = 0usize;
		let mut placed = false;

		let started = tokio::time::Instant::now();
		let mut ticker = tokio::time::interval(self.poll_interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				changed = cancel_rx.changed() => {
					// Err: the handle was replaced by a newer attempt.
					if changed.is_err() || *cancel_rx.borrow() {
						info!(%order_hash, "fill monitoring stopped");
						return Ok(SwapOutcome::Cancelled { order_hash });
					}
				}
				_ = ticker.tick() => {
					if started.elapsed() > self.monitoring_timeout {
						return Err(SwapError::MonitoringTimeout);
					}

					// An order can reach a terminal status relayer-side (expiry,
					// refund, or fills completed elsewhere) while we wait; stop
					// monitoring as soon as it does.
					match self.aggregator.order_status(&order_hash).await {
						Ok(OrderStatus::Executed) => {
							self.set_stage(SwapStage::Confirmed { order_hash });
							return Ok(SwapOutcome::Confirmed {
								order_hash,
								secrets_revealed: revealed_count,
							});
						}
						Ok(status) if status.is_terminal() => {
							return Err(SwapError::OrderClosed { status });
						}
						Ok(_) => {}
						Err(err) if err.is_transient() => {
							warn!(%order_hash, %err, "order status poll failed, will retry");
							continue;
						}
						Err(err) => return Err(err.into()),
					}

					let fills = match self.aggregator.ready_fills(&order_hash).await {
						Ok(fills) => fills,
						Err(err) if err.is_transient() => {
							// One bad tick does not fail the attempt.
							warn!(%order_hash, %err, "fill readiness poll failed, will retry");
							continue;
						}
						Err(err) => return Err(err.into()),
					};

					if !fills.fills.is_empty() && !placed {
						placed = true;
						self.set_stage(SwapStage::Placed { order_hash });
					}

					for fill in &fills.fills {
						if fill.idx >= secrets.len() || revealed[fill.idx] {
							continue;
						}
						match self
							.aggregator
							.submit_secret(&secrets[fill.idx], &order_hash)
							.await
						{
							Ok(()) => {
								revealed[fill.idx] = true;
								revealed_count += 1;
								self.events.publish(SwapEvent::SecretRevealed {
									order_hash,
									fill_idx: fill.idx,
								});
								info!(%order_hash, fill_idx = fill.idx, "secret revealed");
							}
							Err(err) if err.is_transient() => {
								warn!(%order_hash, fill_idx = fill.idx, %err, "secret submission failed, will retry");
							}
							Err(err) => return Err(err.into()),
						}
					}

					if revealed_count == secrets.len() {
						self.set_stage(SwapStage::Confirmed { order_hash });
						return Ok(SwapOutcome::Confirmed {
							order_hash,
							secrets_revealed: revealed_count,
						});
					}
				}
			}
		}
	}

	fn set_stage(&self, stage: SwapStage) {
		self.stage_tx.send_replace(stage.clone());
		self.events.publish(SwapEvent::StageChanged { stage });
	}
}

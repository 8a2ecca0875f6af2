//! Live quote maintenance for the swap form.
//!
//! Parameter updates arrive on a channel; amount-only edits are debounced so
//! typing does not flood the quoter, while chain or token changes refetch
//! immediately. Every fetch carries a generation number and a response is
//! dropped when a newer fetch has started since, so a slow old response can
//! never overwrite a fresh quote.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use swap_aggregator::AggregatorApi;
use swap_types::{EventBus, Quote, QuoteParams, SwapEvent};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The latest applied quote together with the parameters it answers.
#[derive(Debug, Clone)]
pub struct QuoteSnapshot {
	pub params: QuoteParams,
	pub quote: Quote,
}

pub struct QuoteWatcher {
	params_tx: mpsc::UnboundedSender<QuoteParams>,
	quote_rx: watch::Receiver<Option<QuoteSnapshot>>,
	worker: JoinHandle<()>,
}

impl QuoteWatcher {
	/// Spawns the watcher task. `debounce` is the quiet period applied to
	/// amount-only parameter changes.
	pub fn spawn(
		aggregator: Arc<dyn AggregatorApi>,
		events: EventBus,
		debounce: Duration,
	) -> Self {
		let (params_tx, params_rx) = mpsc::unbounded_channel();
		let (quote_tx, quote_rx) = watch::channel(None);
		let worker = tokio::spawn(run(aggregator, events, debounce, params_rx, quote_tx));
		Self {
			params_tx,
			quote_rx,
			worker,
		}
	}

	/// Feeds a new parameter set. Returns false when the watcher has shut
	/// down.
	pub fn update(&self, params: QuoteParams) -> bool {
		self.params_tx.send(params).is_ok()
	}

	/// The most recent applied quote, if any.
	pub fn latest(&self) -> Option<QuoteSnapshot> {
		self.quote_rx.borrow().clone()
	}

	pub fn subscribe(&self) -> watch::Receiver<Option<QuoteSnapshot>> {
		self.quote_rx.clone()
	}
}

impl Drop for QuoteWatcher {
	fn drop(&mut self) {
		self.worker.abort();
	}
}

/// True when only the amount differs, which is the debounced kind of change.
fn amount_only_change(prev: &QuoteParams, next: &QuoteParams) -> bool {
	prev.src_chain == next.src_chain
		&& prev.dst_chain == next.dst_chain
		&& prev.src_token_address == next.src_token_address
		&& prev.dst_token_address == next.dst_token_address
		&& prev.wallet_address == next.wallet_address
		&& prev.amount != next.amount
}

async fn run(
	aggregator: Arc<dyn AggregatorApi>,
	events: EventBus,
	debounce: Duration,
	mut params_rx: mpsc::UnboundedReceiver<QuoteParams>,
	quote_tx: watch::Sender<Option<QuoteSnapshot>>,
) {
	let generation = Arc::new(AtomicU64::new(0));
	let mut last: Option<QuoteParams> = None;

	while let Some(received) = params_rx.recv().await {
		let mut params = received;
		let mut wait = matches!(&last, Some(prev) if amount_only_change(prev, &params));
		last = Some(params.clone());

		// Debounce window: further amount edits restart it, a structural
		// change fires immediately.
		while wait {
			tokio::select! {
				next = params_rx.recv() => match next {
					Some(p) => {
						wait = matches!(&last, Some(prev) if amount_only_change(prev, &p));
						last = Some(p.clone());
						params = p;
					}
					None => return,
				},
				_ = tokio::time::sleep(debounce) => break,
			}
		}

		if params.amount.is_zero() {
			// Nothing to quote; clear any stale estimate.
			let _ = quote_tx.send(None);
			continue;
		}

		let gen = generation.fetch_add(1, Ordering::SeqCst) + 1;
		let aggregator = aggregator.clone();
		let events = events.clone();
		let generation = generation.clone();
		let quote_tx = quote_tx.clone();
		tokio::spawn(async move {
			let result = aggregator.get_quote(&params).await;
			if generation.load(Ordering::SeqCst) != gen {
				debug!(gen, "discarding superseded quote response");
				return;
			}
			match result {
				Ok(quote) => {
					events.publish(SwapEvent::QuoteUpdated {
						quote_id: quote.quote_id.clone(),
						dst_token_amount: quote.dst_token_amount.to_string(),
					});
					let _ = quote_tx.send(Some(QuoteSnapshot { params, quote }));
				}
				Err(err) => {
					warn!(%err, "quote request failed");
					events.publish(SwapEvent::QuoteFailed {
						reason: err.to_string(),
						transient: err.is_transient(),
					});
				}
			}
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::sync::Mutex;
	use swap_aggregator::AggregatorError;
	use swap_types::{
		Address, BuiltOrder, ChainId, OrderStatus, ReadyFills, SignedOrder, B256, U256,
	};

	/// Quoter mock that answers with a per-call delay and echoes a quote id
	/// derived from the requested amount, so tests can tell which request a
	/// response belongs to.
	struct SlowQuoter {
		delays: Mutex<Vec<Duration>>,
		calls: Arc<Mutex<usize>>,
	}

	impl SlowQuoter {
		fn new(delays: Vec<Duration>) -> Self {
			Self {
				delays: Mutex::new(delays),
				calls: Arc::new(Mutex::new(0)),
			}
		}
	}

	#[async_trait]
	impl AggregatorApi for SlowQuoter {
		async fn get_quote(&self, params: &QuoteParams) -> Result<Quote, AggregatorError> {
			let delay = {
				let mut delays = self.delays.lock().unwrap();
				*self.calls.lock().unwrap() += 1;
				if delays.is_empty() {
					Duration::ZERO
				} else {
					delays.remove(0)
				}
			};
			tokio::time::sleep(delay).await;
			Quote::from_value(serde_json::json!({
				"quoteId": format!("q-{}", params.amount),
				"dstTokenAmount": params.amount.to_string(),
				"presets": { "fast": { "secretsCount": 1 } }
			}))
			.map_err(|e| AggregatorError::Malformed(e.to_string()))
		}

		async fn build_order(
			&self,
			_quote: &Quote,
			_params: &QuoteParams,
			_secret_hashes: &[B256],
		) -> Result<BuiltOrder, AggregatorError> {
			unimplemented!("quote watcher never builds orders")
		}

		async fn submit_order(
			&self,
			_order: &SignedOrder,
			_src_chain: ChainId,
			_quote_id: &str,
			_secret_hashes: Option<&[B256]>,
		) -> Result<(), AggregatorError> {
			unimplemented!()
		}

		async fn ready_fills(&self, _order_hash: &B256) -> Result<ReadyFills, AggregatorError> {
			unimplemented!()
		}

		async fn submit_secret(
			&self,
			_secret: &B256,
			_order_hash: &B256,
		) -> Result<(), AggregatorError> {
			unimplemented!()
		}

		async fn order_status(&self, _order_hash: &B256) -> Result<OrderStatus, AggregatorError> {
			unimplemented!()
		}

		async fn escrow_address(&self, _chain_id: ChainId) -> Result<Address, AggregatorError> {
			Ok(Address::ZERO)
		}
	}

	fn params(amount: u64) -> QuoteParams {
		QuoteParams {
			src_chain: 137,
			dst_chain: 8453,
			src_token_address: Address::repeat_byte(0x01),
			dst_token_address: Address::repeat_byte(0x02),
			amount: U256::from(amount),
			wallet_address: Address::repeat_byte(0xaa),
			enable_estimate: true,
		}
	}

	async fn wait_for_quote(
		rx: &mut watch::Receiver<Option<QuoteSnapshot>>,
	) -> QuoteSnapshot {
		tokio::time::timeout(Duration::from_secs(2), async {
			loop {
				if let Some(snapshot) = rx.borrow_and_update().clone() {
					return snapshot;
				}
				rx.changed().await.unwrap();
			}
		})
		.await
		.unwrap()
	}

	#[tokio::test]
	async fn rapid_amount_edits_collapse_into_one_fetch() {
		let quoter = SlowQuoter::new(vec![]);
		let calls = quoter.calls.clone();
		let watcher = QuoteWatcher::spawn(
			Arc::new(quoter),
			EventBus::new(16),
			Duration::from_millis(40),
		);
		let mut rx = watcher.subscribe();

		// First update fires immediately (no previous params), then a burst
		// of amount edits within the quiet period.
		assert!(watcher.update(params(1)));
		let first = wait_for_quote(&mut rx).await;
		assert_eq!(first.quote.quote_id, "q-1");

		for amount in [10, 100, 1000] {
			watcher.update(params(amount));
			tokio::time::sleep(Duration::from_millis(5)).await;
		}
		tokio::time::sleep(Duration::from_millis(80)).await;

		// One fetch for the initial params, one for the collapsed burst.
		assert_eq!(*calls.lock().unwrap(), 2);
		assert_eq!(watcher.latest().unwrap().quote.quote_id, "q-1000");
	}

	#[tokio::test]
	async fn structural_change_bypasses_the_debounce() {
		let quoter = SlowQuoter::new(vec![]);
		let calls = quoter.calls.clone();
		let watcher = QuoteWatcher::spawn(
			Arc::new(quoter),
			EventBus::new(16),
			Duration::from_millis(200),
		);
		let mut rx = watcher.subscribe();

		watcher.update(params(1));
		wait_for_quote(&mut rx).await;

		// Different destination token: no quiet period applies.
		let mut changed = params(1);
		changed.dst_token_address = Address::repeat_byte(0x03);
		watcher.update(changed);
		tokio::time::sleep(Duration::from_millis(50)).await;
		assert_eq!(*calls.lock().unwrap(), 2);
	}

	#[tokio::test]
	async fn stale_response_never_overwrites_a_newer_quote() {
		// First request is slow, second (different token, immediate) is fast.
		let quoter = SlowQuoter::new(vec![Duration::from_millis(100), Duration::ZERO]);
		let watcher = QuoteWatcher::spawn(
			Arc::new(quoter),
			EventBus::new(16),
			Duration::from_millis(10),
		);
		let mut rx = watcher.subscribe();

		watcher.update(params(111));
		tokio::time::sleep(Duration::from_millis(20)).await;
		let mut newer = params(222);
		newer.src_token_address = Address::repeat_byte(0x09);
		watcher.update(newer);

		let applied = wait_for_quote(&mut rx).await;
		assert_eq!(applied.quote.quote_id, "q-222");

		// Give the slow response time to arrive; it must be discarded.
		tokio::time::sleep(Duration::from_millis(150)).await;
		assert_eq!(watcher.latest().unwrap().quote.quote_id, "q-222");
	}

	#[tokio::test]
	async fn zero_amount_clears_the_estimate() {
		let quoter = SlowQuoter::new(vec![]);
		let calls = quoter.calls.clone();
		let watcher = QuoteWatcher::spawn(
			Arc::new(quoter),
			EventBus::new(16),
			Duration::from_millis(10),
		);
		let mut rx = watcher.subscribe();

		watcher.update(params(5));
		wait_for_quote(&mut rx).await;

		watcher.update(params(0));
		tokio::time::sleep(Duration::from_millis(60)).await;
		assert!(watcher.latest().is_none());
		// The zero-amount update performed no fetch.
		assert_eq!(*calls.lock().unwrap(), 1);
	}
}

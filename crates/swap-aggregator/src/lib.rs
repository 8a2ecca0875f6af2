//! Client for the remote aggregator/relayer HTTP API.
//!
//! The API is consumed through the [`AggregatorApi`] trait so the
//! orchestrator can be exercised against mocks; [`http::HttpAggregator`] is
//! the production implementation.

use async_trait::async_trait;
use swap_types::{
	Address, BuiltOrder, ChainId, OrderStatus, Quote, QuoteParams, ReadyFills, SignedOrder, B256,
};
use thiserror::Error;

pub mod http;

pub use http::HttpAggregator;

/// Errors from the remote API, split along the retryability boundary:
/// `Remote` means the server understood and rejected the request (fix the
/// input), everything else is transport trouble (safe to retry on the next
/// trigger).
#[derive(Debug, Error)]
pub enum AggregatorError {
	/// Structured application error, carrying the server's description
	/// verbatim for display.
	#[error("{0}")]
	Remote(String),
	#[error("transport error: {0}")]
	Transport(String),
	#[error("no response from relayer within timeout")]
	Timeout,
	#[error("malformed response: {0}")]
	Malformed(String),
}

impl AggregatorError {
	/// Whether the failure is transient (retry) rather than a rejection
	/// (fix input).
	pub fn is_transient(&self) -> bool {
		matches!(self, AggregatorError::Transport(_) | AggregatorError::Timeout)
	}
}

/// The logical operations of the aggregator/relayer, independent of paths
/// and transport.
#[async_trait]
pub trait AggregatorApi: Send + Sync {
	/// Requests exchange terms. `params.amount` is already in the source
	/// token's smallest unit.
	async fn get_quote(&self, params: &QuoteParams) -> Result<Quote, AggregatorError>;

	/// Builds the unsigned typed-data order from a quote and the secret hash
	/// commitment.
	async fn build_order(
		&self,
		quote: &Quote,
		params: &QuoteParams,
		secret_hashes: &[B256],
	) -> Result<BuiltOrder, AggregatorError>;

	/// Submits the signed order to the relayer. `secret_hashes` must be
	/// `None` for single-secret orders.
	async fn submit_order(
		&self,
		order: &SignedOrder,
		src_chain: ChainId,
		quote_id: &str,
		secret_hashes: Option<&[B256]>,
	) -> Result<(), AggregatorError>;

	/// Lists escrow fills that are ready to accept their secret.
	async fn ready_fills(&self, order_hash: &B256) -> Result<ReadyFills, AggregatorError>;

	/// Reveals one secret for a ready fill.
	async fn submit_secret(&self, secret: &B256, order_hash: &B256)
		-> Result<(), AggregatorError>;

	/// Relayer-side status of a submitted order.
	async fn order_status(&self, order_hash: &B256) -> Result<OrderStatus, AggregatorError>;

	/// Escrow contract address for a chain; the spender of the ERC-20
	/// approval.
	async fn escrow_address(&self, chain_id: ChainId) -> Result<Address, AggregatorError>;
}

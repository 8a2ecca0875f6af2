//! reqwest-backed implementation of [`AggregatorApi`].
//!
//! Paths follow the aggregator's fusion-plus API layout. Every response is
//! deserialized into a concrete shape at this boundary; anything that does
//! not parse is a `Malformed` error, never a null propagated downstream.

use crate::{AggregatorApi, AggregatorError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use swap_types::{
	amount::u256_decimal, Address, BuiltOrder, ChainId, OrderStatus, Quote, QuoteParams,
	ReadyFills, SignedOrder, B256, U256,
};
use tracing::debug;

const QUOTE_PATH: &str = "fusion-plus/quoter/v1.0/quote/receive";
const BUILD_PATH: &str = "fusion-plus/quoter/v1.0/quote/build";
const SUBMIT_PATH: &str = "fusion-plus/relayer/v1.0/submit";
const SUBMIT_SECRET_PATH: &str = "fusion-plus/relayer/v1.0/submit/secret";
const READY_FILLS_PATH: &str = "fusion-plus/orders/v1.0/order/ready-to-accept-secret-fills";
const STATUS_PATH: &str = "fusion-plus/orders/v1.0/order/status";
const ESCROW_PATH: &str = "fusion-plus/orders/v1.0/order/escrow";

const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpAggregator {
	client: reqwest::Client,
	base_url: String,
	api_key: String,
	submit_timeout: Duration,
}

impl HttpAggregator {
	pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
		Self {
			client: reqwest::Client::new(),
			base_url: base_url.into(),
			api_key: api_key.into(),
			submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
		}
	}

	/// Overrides the relayer submit timeout (default 30s).
	pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
		self.submit_timeout = timeout;
		self
	}

	fn url(&self, path: &str) -> String {
		format!("{}/{}", self.base_url.trim_end_matches('/'), path)
	}

	async fn check(resp: reqwest::Response) -> Result<reqwest::Response, AggregatorError> {
		let status = resp.status();
		if status.is_success() {
			return Ok(resp);
		}
		let body = resp.text().await.unwrap_or_default();
		Err(remote_error(status.as_u16(), &body))
	}
}

fn transport(e: reqwest::Error) -> AggregatorError {
	if e.is_timeout() {
		AggregatorError::Timeout
	} else {
		AggregatorError::Transport(e.to_string())
	}
}

/// Extracts the server's human-readable description from an error body,
/// preferring `description` over `message` as the aggregator populates both
/// inconsistently.
fn remote_error(status: u16, body: &str) -> AggregatorError {
	#[derive(Deserialize)]
	struct ErrorBody {
		description: Option<String>,
		message: Option<String>,
		error: Option<String>,
	}

	if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
		if let Some(description) = parsed
			.description
			.or(parsed.message)
			.or(parsed.error)
		{
			return AggregatorError::Remote(description);
		}
	}
	AggregatorError::Remote(format!("HTTP {}", status))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildQuery<'a> {
	src_chain: ChainId,
	dst_chain: ChainId,
	src_token_address: &'a Address,
	dst_token_address: &'a Address,
	#[serde(with = "u256_decimal")]
	amount: U256,
	wallet_address: &'a Address,
}

impl<'a> From<&'a QuoteParams> for BuildQuery<'a> {
	fn from(params: &'a QuoteParams) -> Self {
		Self {
			src_chain: params.src_chain,
			dst_chain: params.dst_chain,
			src_token_address: &params.src_token_address,
			dst_token_address: &params.dst_token_address,
			amount: params.amount,
			wallet_address: &params.wallet_address,
		}
	}
}

#[derive(Serialize)]
struct BuildBody<'a> {
	quote: &'a serde_json::Value,
	#[serde(rename = "secretsHashList")]
	secrets_hash_list: &'a [B256],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody<'a> {
	order: &'a serde_json::Value,
	src_chain_id: ChainId,
	signature: &'a str,
	extension: &'a str,
	quote_id: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	secret_hashes: Option<&'a [B256]>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SecretBody<'a> {
	secret: &'a B256,
	order_hash: &'a B256,
}

#[derive(Deserialize)]
struct StatusBody {
	status: OrderStatus,
}

#[derive(Deserialize)]
struct EscrowBody {
	address: Address,
}

#[async_trait]
impl AggregatorApi for HttpAggregator {
	async fn get_quote(&self, params: &QuoteParams) -> Result<Quote, AggregatorError> {
		debug!(
			src_chain = params.src_chain,
			dst_chain = params.dst_chain,
			"requesting quote"
		);
		let resp = self
			.client
			.get(self.url(QUOTE_PATH))
			.bearer_auth(&self.api_key)
			.query(params)
			.send()
			.await
			.map_err(transport)?;
		let resp = Self::check(resp).await?;
		let raw: serde_json::Value = resp.json().await.map_err(transport)?;
		Quote::from_value(raw).map_err(|e| AggregatorError::Malformed(e.to_string()))
	}

	async fn build_order(
		&self,
		quote: &Quote,
		params: &QuoteParams,
		secret_hashes: &[B256],
	) -> Result<BuiltOrder, AggregatorError> {
		debug!(quote_id = %quote.quote_id, secrets = secret_hashes.len(), "building order");
		let resp = self
			.client
			.post(self.url(BUILD_PATH))
			.bearer_auth(&self.api_key)
			.query(&BuildQuery::from(params))
			.json(&BuildBody {
				quote: quote.raw(),
				secrets_hash_list: secret_hashes,
			})
			.send()
			.await
			.map_err(transport)?;
		let resp = Self::check(resp).await?;
		resp.json::<BuiltOrder>()
			.await
			.map_err(|e| AggregatorError::Malformed(e.to_string()))
	}

	async fn submit_order(
		&self,
		order: &SignedOrder,
		src_chain: ChainId,
		quote_id: &str,
		secret_hashes: Option<&[B256]>,
	) -> Result<(), AggregatorError> {
		let message = order
			.order
			.message()
			.ok_or_else(|| AggregatorError::Malformed("typed data has no message".into()))?;
		let body = SubmitBody {
			order: message,
			src_chain_id: src_chain,
			signature: &order.signature,
			extension: &order.order.extension,
			quote_id,
			secret_hashes,
		};

		debug!(order_hash = %order.order.order_hash, "submitting order to relayer");
		// The relayer submit call gets its own deadline so "no response" is
		// classified separately from an application-level rejection.
		let send = async {
			let resp = self
				.client
				.post(self.url(SUBMIT_PATH))
				.bearer_auth(&self.api_key)
				.json(&body)
				.send()
				.await
				.map_err(transport)?;
			Self::check(resp).await?;
			Ok(())
		};
		tokio::time::timeout(self.submit_timeout, send)
			.await
			.map_err(|_| AggregatorError::Timeout)?
	}

	async fn ready_fills(&self, order_hash: &B256) -> Result<ReadyFills, AggregatorError> {
		let resp = self
			.client
			.get(self.url(&format!("{}/{}", READY_FILLS_PATH, order_hash)))
			.bearer_auth(&self.api_key)
			.send()
			.await
			.map_err(transport)?;
		let resp = Self::check(resp).await?;
		resp.json::<ReadyFills>()
			.await
			.map_err(|e| AggregatorError::Malformed(e.to_string()))
	}

	async fn submit_secret(
		&self,
		secret: &B256,
		order_hash: &B256,
	) -> Result<(), AggregatorError> {
		let resp = self
			.client
			.post(self.url(SUBMIT_SECRET_PATH))
			.bearer_auth(&self.api_key)
			.json(&SecretBody { secret, order_hash })
			.send()
			.await
			.map_err(transport)?;
		Self::check(resp).await?;
		Ok(())
	}

	async fn order_status(&self, order_hash: &B256) -> Result<OrderStatus, AggregatorError> {
		let resp = self
			.client
			.get(self.url(&format!("{}/{}", STATUS_PATH, order_hash)))
			.bearer_auth(&self.api_key)
			.send()
			.await
			.map_err(transport)?;
		let resp = Self::check(resp).await?;
		let body: StatusBody = resp
			.json()
			.await
			.map_err(|e| AggregatorError::Malformed(e.to_string()))?;
		Ok(body.status)
	}

	async fn escrow_address(&self, chain_id: ChainId) -> Result<Address, AggregatorError> {
		let resp = self
			.client
			.get(self.url(ESCROW_PATH))
			.bearer_auth(&self.api_key)
			.query(&[("chainId", chain_id.to_string())])
			.send()
			.await
			.map_err(transport)?;
		let resp = Self::check(resp).await?;
		let body: EscrowBody = resp
			.json()
			.await
			.map_err(|e| AggregatorError::Malformed(e.to_string()))?;
		Ok(body.address)
	}
}

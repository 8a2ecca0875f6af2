//! Minimal JSON-RPC 2.0 client used by the local wallet implementation.

use crate::WalletError;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use swap_types::U256;

pub(crate) struct RpcClient {
	client: reqwest::Client,
	next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse {
	result: Option<Value>,
	error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
	message: String,
}

impl RpcClient {
	pub fn new() -> Self {
		Self {
			client: reqwest::Client::new(),
			next_id: AtomicU64::new(1),
		}
	}

	pub async fn call(
		&self,
		url: &str,
		method: &str,
		params: Value,
	) -> Result<Value, WalletError> {
		let body = json!({
			"jsonrpc": "2.0",
			"id": self.next_id.fetch_add(1, Ordering::Relaxed),
			"method": method,
			"params": params,
		});

		let resp = self
			.client
			.post(url)
			.json(&body)
			.send()
			.await
			.map_err(|e| WalletError::Rpc(e.to_string()))?;
		let parsed: RpcResponse = resp
			.json()
			.await
			.map_err(|e| WalletError::Rpc(e.to_string()))?;

		if let Some(err) = parsed.error {
			return Err(WalletError::Rpc(err.message));
		}
		parsed
			.result
			.ok_or_else(|| WalletError::Rpc(format!("{}: empty result", method)))
	}
}

/// Parses a JSON-RPC hex quantity ("0x...") into a U256.
pub(crate) fn parse_quantity(value: &Value) -> Result<U256, WalletError> {
	let s = value
		.as_str()
		.ok_or_else(|| WalletError::Rpc(format!("expected hex quantity, got {}", value)))?;
	let digits = s.strip_prefix("0x").unwrap_or(s);
	U256::from_str_radix(digits, 16)
		.map_err(|e| WalletError::Rpc(format!("bad hex quantity {}: {}", s, e)))
}

pub(crate) fn parse_quantity_u64(value: &Value) -> Result<u64, WalletError> {
	let q = parse_quantity(value)?;
	u64::try_from(q).map_err(|_| WalletError::Rpc(format!("quantity {} overflows u64", q)))
}

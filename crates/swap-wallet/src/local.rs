//! Local private-key wallet backed by plain JSON-RPC endpoints.
//!
//! Suitable for development and CLI use where key management simplicity is
//! preferred. Chain switching selects which configured endpoint subsequent
//! on-chain calls go to, mirroring a connected wallet's active network.

use crate::rpc::{parse_quantity, parse_quantity_u64, RpcClient};
use crate::{Signature, TransactionReceipt, WalletError, WalletInterface};
use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_dyn_abi::TypedData;
use alloy_eips::eip2718::Encodable2718;
use alloy_network::TxSigner;
use alloy_primitives::{Bytes, TxKind};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use swap_types::{Address, ChainId, B256, U256};
use tokio::sync::RwLock;
use tracing::{debug, info};

sol! {
	/// The two ERC-20 entry points the approval flow touches.
	interface IERC20 {
		function allowance(address owner, address spender) external view returns (uint256);
		function approve(address spender, uint256 amount) external returns (bool);
	}
}

const APPROVE_GAS_LIMIT: u64 = 100_000;

pub struct LocalWallet {
	signer: PrivateKeySigner,
	endpoints: HashMap<ChainId, String>,
	active: RwLock<ChainId>,
	rpc: RpcClient,
}

impl LocalWallet {
	/// Creates a wallet from a hex private key (with or without 0x prefix)
	/// and a chain-id to RPC-endpoint map.
	pub fn new(
		private_key_hex: &str,
		endpoints: HashMap<ChainId, String>,
		initial_chain: ChainId,
	) -> Result<Self, WalletError> {
		let signer = private_key_hex
			.parse::<PrivateKeySigner>()
			.map_err(|e| WalletError::InvalidKey(e.to_string()))?;
		if !endpoints.contains_key(&initial_chain) {
			return Err(WalletError::UnsupportedChain(initial_chain));
		}
		Ok(Self {
			signer,
			endpoints,
			active: RwLock::new(initial_chain),
			rpc: RpcClient::new(),
		})
	}

	async fn active_endpoint(&self) -> Result<(ChainId, String), WalletError> {
		let chain = *self.active.read().await;
		let url = self
			.endpoints
			.get(&chain)
			.ok_or(WalletError::UnsupportedChain(chain))?;
		Ok((chain, url.clone()))
	}
}

#[async_trait]
impl WalletInterface for LocalWallet {
	fn address(&self) -> Address {
		self.signer.address()
	}

	async fn chain_id(&self) -> Result<ChainId, WalletError> {
		Ok(*self.active.read().await)
	}

	async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
		if !self.endpoints.contains_key(&chain_id) {
			return Err(WalletError::UnsupportedChain(chain_id));
		}
		*self.active.write().await = chain_id;
		info!(chain_id, "switched active chain");
		Ok(())
	}

	async fn sign_typed_data(
		&self,
		typed_data: &serde_json::Value,
	) -> Result<Signature, WalletError> {
		let typed: TypedData = serde_json::from_value(typed_data.clone())
			.map_err(|e| WalletError::SigningFailed(format!("invalid typed data: {}", e)))?;
		let hash = typed
			.eip712_signing_hash()
			.map_err(|e| WalletError::SigningFailed(e.to_string()))?;
		let signature = self
			.signer
			.sign_hash(&hash)
			.await
			.map_err(|e| WalletError::SigningFailed(e.to_string()))?;
		Ok(signature.into())
	}

	async fn allowance(
		&self,
		token: Address,
		owner: Address,
		spender: Address,
	) -> Result<U256, WalletError> {
		let (_, url) = self.active_endpoint().await?;
		let data = IERC20::allowanceCall { owner, spender }.abi_encode();
		let result = self
			.rpc
			.call(
				&url,
				"eth_call",
				json!([{ "to": token, "data": format!("0x{}", hex::encode(&data)) }, "latest"]),
			)
			.await?;
		let hex_str = result
			.as_str()
			.ok_or_else(|| WalletError::Rpc("eth_call returned non-string".into()))?;
		let bytes = hex::decode(hex_str.trim_start_matches("0x"))
			.map_err(|e| WalletError::Rpc(format!("bad eth_call result: {}", e)))?;
		let decoded = IERC20::allowanceCall::abi_decode_returns(&bytes, true)
			.map_err(|e| WalletError::Rpc(format!("bad allowance return: {}", e)))?;
		Ok(decoded._0)
	}

	async fn approve(
		&self,
		token: Address,
		spender: Address,
		amount: U256,
	) -> Result<B256, WalletError> {
		let (chain, url) = self.active_endpoint().await?;
		let data = IERC20::approveCall { spender, amount }.abi_encode();

		let nonce = parse_quantity_u64(
			&self
				.rpc
				.call(
					&url,
					"eth_getTransactionCount",
					json!([self.signer.address(), "pending"]),
				)
				.await?,
		)?;
		let gas_price = parse_quantity(&self.rpc.call(&url, "eth_gasPrice", json!([])).await?)?;
		let gas_price = u128::try_from(gas_price)
			.map_err(|_| WalletError::Rpc("gas price overflows u128".into()))?;

		let mut tx = TxLegacy {
			chain_id: Some(chain),
			nonce,
			gas_price,
			gas_limit: APPROVE_GAS_LIMIT,
			to: TxKind::Call(token),
			value: U256::ZERO,
			input: Bytes::from(data),
		};
		let signature = self
			.signer
			.sign_transaction(&mut tx)
			.await
			.map_err(|e| WalletError::SigningFailed(e.to_string()))?;
		let envelope = TxEnvelope::Legacy(tx.into_signed(signature));
		let raw = format!("0x{}", hex::encode(envelope.encoded_2718()));

		debug!(%token, %spender, "broadcasting approve transaction");
		let result = self
			.rpc
			.call(&url, "eth_sendRawTransaction", json!([raw]))
			.await?;
		result
			.as_str()
			.and_then(|s| s.parse::<B256>().ok())
			.ok_or_else(|| WalletError::Rpc(format!("bad transaction hash: {}", result)))
	}

	async fn transaction_receipt(
		&self,
		tx_hash: &B256,
	) -> Result<Option<TransactionReceipt>, WalletError> {
		let (_, url) = self.active_endpoint().await?;
		let result = self
			.rpc
			.call(&url, "eth_getTransactionReceipt", json!([tx_hash]))
			.await?;
		if result.is_null() {
			return Ok(None);
		}
		let status = parse_quantity_u64(&result["status"])?;
		let block_number = parse_quantity_u64(&result["blockNumber"])?;
		Ok(Some(TransactionReceipt {
			tx_hash: *tx_hash,
			block_number,
			success: status == 1,
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const TEST_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

	fn test_wallet() -> LocalWallet {
		let endpoints =
			HashMap::from([(137u64, "http://localhost:8545".to_string())]);
		LocalWallet::new(TEST_KEY, endpoints, 137).unwrap()
	}

	#[test]
	fn rejects_invalid_private_key() {
		assert!(matches!(
			LocalWallet::new("0xnot-a-key", HashMap::new(), 1),
			Err(WalletError::InvalidKey(_))
		));
	}

	#[test]
	fn rejects_initial_chain_without_endpoint() {
		assert!(matches!(
			LocalWallet::new(TEST_KEY, HashMap::new(), 137),
			Err(WalletError::UnsupportedChain(137))
		));
	}

	#[tokio::test]
	async fn switch_chain_requires_configured_endpoint() {
		let wallet = test_wallet();
		assert!(matches!(
			wallet.switch_chain(8453).await,
			Err(WalletError::UnsupportedChain(8453))
		));
		assert_eq!(wallet.chain_id().await.unwrap(), 137);
	}

	#[tokio::test]
	async fn signs_typed_data() {
		let wallet = test_wallet();
		let typed = serde_json::json!({
			"types": {
				"EIP712Domain": [
					{ "name": "name", "type": "string" },
					{ "name": "chainId", "type": "uint256" }
				],
				"Order": [
					{ "name": "maker", "type": "address" },
					{ "name": "makingAmount", "type": "uint256" }
				]
			},
			"primaryType": "Order",
			"domain": { "name": "Test", "chainId": 137 },
			"message": {
				"maker": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
				"makingAmount": "1000000"
			}
		});

		let sig = wallet.sign_typed_data(&typed).await.unwrap();
		assert_eq!(sig.0.len(), 65);
		// Signing is deterministic (RFC 6979), same input same output.
		let again = wallet.sign_typed_data(&typed).await.unwrap();
		assert_eq!(sig.0, again.0);
	}

	#[tokio::test]
	async fn rejects_malformed_typed_data() {
		let wallet = test_wallet();
		let bad = serde_json::json!({ "message": {} });
		assert!(matches!(
			wallet.sign_typed_data(&bad).await,
			Err(WalletError::SigningFailed(_))
		));
	}
}

//! Wallet capability consumed by the swap pipeline.
//!
//! The pipeline only needs a narrow surface: the connected address, chain
//! switching, EIP-712 typed-data signing, and a contract-write capability
//! for the ERC-20 approve call. [`WalletInterface`] captures that seam;
//! [`local::LocalWallet`] implements it with a local private key and plain
//! JSON-RPC endpoints.

use alloy_primitives::PrimitiveSignature;
use async_trait::async_trait;
use std::time::Duration;
use swap_types::{Address, ChainId, B256, U256};
use thiserror::Error;

pub mod local;
mod rpc;

pub use local::LocalWallet;

#[derive(Debug, Error)]
pub enum WalletError {
	#[error("user rejected the request")]
	Rejected,
	#[error("signing failed: {0}")]
	SigningFailed(String),
	#[error("invalid key: {0}")]
	InvalidKey(String),
	#[error("no rpc endpoint configured for chain {0}")]
	UnsupportedChain(ChainId),
	#[error("rpc error: {0}")]
	Rpc(String),
}

/// 65-byte signature in the standard Ethereum (r, s, v) layout.
#[derive(Debug, Clone)]
pub struct Signature(pub Vec<u8>);

impl Signature {
	/// 0x-prefixed hex, the form the relayer expects.
	pub fn to_hex(&self) -> String {
		format!("0x{}", hex::encode(&self.0))
	}
}

impl From<PrimitiveSignature> for Signature {
	fn from(sig: PrimitiveSignature) -> Self {
		let mut bytes = Vec::with_capacity(65);
		bytes.extend_from_slice(&sig.r().to_be_bytes::<32>());
		bytes.extend_from_slice(&sig.s().to_be_bytes::<32>());
		bytes.push(if sig.v() { 28 } else { 27 });
		Signature(bytes)
	}
}

/// Receipt of a mined transaction, reduced to what approval tracking needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
	pub tx_hash: B256,
	pub block_number: u64,
	pub success: bool,
}

#[async_trait]
pub trait WalletInterface: Send + Sync {
	/// The connected account address.
	fn address(&self) -> Address;

	/// The wallet's currently active chain.
	async fn chain_id(&self) -> Result<ChainId, WalletError>;

	/// Switches the active chain. Fails for chains the wallet has no
	/// endpoint for.
	async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError>;

	/// Signs an EIP-712 typed-data document (`domain`/`types`/`message`).
	async fn sign_typed_data(
		&self,
		typed_data: &serde_json::Value,
	) -> Result<Signature, WalletError>;

	/// Current ERC-20 allowance of `spender` over `owner`'s `token`.
	async fn allowance(
		&self,
		token: Address,
		owner: Address,
		spender: Address,
	) -> Result<U256, WalletError>;

	/// Broadcasts an ERC-20 approve on the active chain; returns the
	/// transaction hash without waiting for inclusion.
	async fn approve(
		&self,
		token: Address,
		spender: Address,
		amount: U256,
	) -> Result<B256, WalletError>;

	/// Receipt for a transaction, or None while it is unmined.
	async fn transaction_receipt(
		&self,
		tx_hash: &B256,
	) -> Result<Option<TransactionReceipt>, WalletError>;
}

/// High-level wrapper adding receipt polling on top of a wallet provider.
pub struct WalletService {
	provider: Box<dyn WalletInterface>,
}

impl WalletService {
	pub fn new(provider: Box<dyn WalletInterface>) -> Self {
		Self { provider }
	}

	pub fn provider(&self) -> &dyn WalletInterface {
		self.provider.as_ref()
	}

	pub fn address(&self) -> Address {
		self.provider.address()
	}

	/// Polls for a receipt until the transaction is mined or the timeout
	/// elapses.
	pub async fn wait_for_receipt(
		&self,
		tx_hash: &B256,
		timeout: Duration,
		poll_interval: Duration,
	) -> Result<TransactionReceipt, WalletError> {
		let started = tokio::time::Instant::now();
		loop {
			if let Some(receipt) = self.provider.transaction_receipt(tx_hash).await? {
				return Ok(receipt);
			}
			if started.elapsed() > timeout {
				return Err(WalletError::Rpc(format!(
					"transaction {} not mined within {}s",
					tx_hash,
					timeout.as_secs()
				)));
			}
			tokio::time::sleep(poll_interval).await;
		}
	}
}

impl std::ops::Deref for WalletService {
	type Target = dyn WalletInterface;

	fn deref(&self) -> &Self::Target {
		self.provider.as_ref()
	}
}

pub mod amount;
pub mod events;
pub mod order;
pub mod quote;
pub mod stage;

pub use amount::*;
pub use events::*;
pub use order::*;
pub use quote::*;
pub use stage::*;

pub use alloy_primitives::{Address, B256, U256};

/// Chain identifier (EVM numeric chain id).
pub type ChainId = u64;

/// A token as selected in the swap form: address plus the metadata needed
/// for amount conversion.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Token {
	/// Contract address of the token on its chain.
	pub address: Address,
	/// Display symbol (e.g. "USDC").
	pub symbol: String,
	/// Number of decimals the token uses.
	pub decimals: u8,
}

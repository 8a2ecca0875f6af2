//! Secret and hash-lock generation for cross-chain atomic swap orders.
//!
//! A swap order commits to one keccak-256 secret hash per potential partial
//! fill. Single-fill orders use the hash directly as the hash-lock;
//! multi-fill orders commit to the Merkle root over the ordered hash list.
//! The Merkle construction must match the aggregator's validation algorithm
//! bit for bit: pairwise keccak over concatenated nodes, an odd trailing
//! node carried up unchanged.
//!
//! Secrets stay in the caller-held attempt object until the reveal phase and
//! are never persisted or logged.

use alloy_primitives::{keccak256, B256};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretError {
	#[error("secret count must be at least 1")]
	InvalidCount,
	#[error("system randomness unavailable: {0}")]
	EntropyUnavailable(String),
}

/// The secrets for one swap attempt together with their commitment.
#[derive(Debug, Clone)]
pub struct HashLockData {
	/// 32-byte secrets, one per potential fill. Reveal-phase material.
	pub secrets: Vec<B256>,
	/// keccak-256 of each secret, in the same order.
	pub secret_hashes: Vec<B256>,
	/// The commitment transmitted at order-build time.
	pub hash_lock: B256,
}

/// Hashes a single secret.
pub fn hash_secret(secret: &B256) -> B256 {
	keccak256(secret)
}

/// Computes the Merkle root over an ordered, non-empty list of hashes.
///
/// Order-sensitive by design: leaf i corresponds to fill index i. At each
/// level pairs are combined as keccak256(left || right); an unpaired last
/// node moves up unchanged.
pub fn merkle_root(hashes: &[B256]) -> Result<B256, SecretError> {
	if hashes.is_empty() {
		return Err(SecretError::InvalidCount);
	}

	let mut nodes = hashes.to_vec();
	while nodes.len() > 1 {
		let mut next = Vec::with_capacity(nodes.len().div_ceil(2));
		for pair in nodes.chunks(2) {
			match pair {
				[left, right] => {
					let mut buf = [0u8; 64];
					buf[..32].copy_from_slice(left.as_slice());
					buf[32..].copy_from_slice(right.as_slice());
					next.push(keccak256(buf));
				}
				[odd] => next.push(*odd),
				_ => unreachable!(),
			}
		}
		nodes = next;
	}
	Ok(nodes[0])
}

/// Computes the hash-lock for an ordered hash list: the sole hash for a
/// single-fill order, the Merkle root otherwise.
pub fn compute_hash_lock(hashes: &[B256]) -> Result<B256, SecretError> {
	match hashes {
		[] => Err(SecretError::InvalidCount),
		[single] => Ok(*single),
		many => merkle_root(many),
	}
}

/// Generates `count` fresh secrets with their hashes and hash-lock.
///
/// `count` of zero is rejected up front; an empty hash-lock must never be
/// produced. Entropy failure is fatal and non-retryable.
pub fn generate_secrets(count: usize) -> Result<HashLockData, SecretError> {
	if count == 0 {
		return Err(SecretError::InvalidCount);
	}

	let mut secrets = Vec::with_capacity(count);
	for _ in 0..count {
		let mut bytes = [0u8; 32];
		OsRng
			.try_fill_bytes(&mut bytes)
			.map_err(|e| SecretError::EntropyUnavailable(e.to_string()))?;
		secrets.push(B256::from(bytes));
	}

	let secret_hashes: Vec<B256> = secrets.iter().map(hash_secret).collect();
	let hash_lock = compute_hash_lock(&secret_hashes)?;

	Ok(HashLockData {
		secrets,
		secret_hashes,
		hash_lock,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fixed_hashes(n: usize) -> Vec<B256> {
		(0..n).map(|i| keccak256([i as u8])).collect()
	}

	#[test]
	fn zero_count_fails_fast() {
		assert!(matches!(generate_secrets(0), Err(SecretError::InvalidCount)));
	}

	#[test]
	fn single_secret_hash_lock_is_the_hash_itself() {
		let data = generate_secrets(1).unwrap();
		assert_eq!(data.secrets.len(), 1);
		assert_eq!(data.secret_hashes[0], hash_secret(&data.secrets[0]));
		assert_eq!(data.hash_lock, data.secret_hashes[0]);
	}

	#[test]
	fn secrets_are_unique() {
		let data = generate_secrets(8).unwrap();
		for i in 0..data.secrets.len() {
			for j in (i + 1)..data.secrets.len() {
				assert_ne!(data.secrets[i], data.secrets[j]);
			}
		}
	}

	#[test]
	fn merkle_root_is_deterministic() {
		let hashes = fixed_hashes(5);
		assert_eq!(merkle_root(&hashes).unwrap(), merkle_root(&hashes).unwrap());
	}

	#[test]
	fn merkle_root_is_order_sensitive() {
		let hashes = fixed_hashes(4);
		let mut reversed = hashes.clone();
		reversed.reverse();
		assert_ne!(merkle_root(&hashes).unwrap(), merkle_root(&reversed).unwrap());
	}

	#[test]
	fn merkle_pairs_concatenate_left_then_right() {
		let hashes = fixed_hashes(2);
		let mut buf = [0u8; 64];
		buf[..32].copy_from_slice(hashes[0].as_slice());
		buf[32..].copy_from_slice(hashes[1].as_slice());
		assert_eq!(merkle_root(&hashes).unwrap(), keccak256(buf));
	}

	#[test]
	fn odd_trailing_node_is_carried_up_unchanged() {
		// For 3 leaves: root = H(H(a||b) || c).
		let hashes = fixed_hashes(3);
		let mut buf = [0u8; 64];
		buf[..32].copy_from_slice(hashes[0].as_slice());
		buf[32..].copy_from_slice(hashes[1].as_slice());
		let left = keccak256(buf);
		buf[..32].copy_from_slice(left.as_slice());
		buf[32..].copy_from_slice(hashes[2].as_slice());
		assert_eq!(merkle_root(&hashes).unwrap(), keccak256(buf));
	}

	#[test]
	fn multi_fill_hash_lock_is_merkle_root() {
		let data = generate_secrets(4).unwrap();
		assert_eq!(
			data.hash_lock,
			merkle_root(&data.secret_hashes).unwrap()
		);
		assert_ne!(data.hash_lock, data.secret_hashes[0]);
	}
}

//! Work value derivation and threshold validation.

use blake2::digest::consts::U8;
use blake2::{Blake2b, Digest};
use ember_types::BlockHash;

type Blake2b64 = Blake2b<U8>;

/// Derive the numeric work value for a nonce against a root.
///
/// The root is the block's `previous` hash, or the account number for an
/// account's first block. Blake2b with 8-byte output over
/// `nonce (LE) || root`, read little-endian.
pub fn work_value(root: &BlockHash, nonce: u64) -> u64 {
    let mut hasher = Blake2b64::new();
    hasher.update(nonce.to_le_bytes());
    hasher.update(root.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest);
    u64::from_le_bytes(bytes)
}

/// Check that a work nonce meets `threshold` for the given root.
pub fn work_validate(root: &BlockHash, nonce: u64, threshold: u64) -> bool {
    work_value(root, nonce) >= threshold
}

//! Blake2b hashing for blocks and votes.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ember_types::BlockHash;

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
///
/// Block canonical hashing feeds each hashable field through this in
/// declaration order.
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices into a `BlockHash`.
pub fn hash_parts(parts: &[&[u8]]) -> BlockHash {
    BlockHash::new(blake2b_256_multi(parts))
}

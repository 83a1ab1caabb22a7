//! A representative's vote: "for this root, this block is my current
//! choice."
//!
//! Votes carry a monotonically increasing sequence number per voting
//! account; only the highest sequence from an account is ever counted, so
//! replayed or stale votes are inert.

use ember_crypto::{hash_parts, sign_message, verify_signature};
use ember_ledger::{Block, BlockDecodeError};
use ember_types::{Account, BlockHash, PrivateKey, Signature};
use serde_json::json;
use std::sync::Arc;

/// Classification of an incoming vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteCode {
    /// Signed correctly with the highest sequence seen from this account.
    Vote,
    /// Sequence is not higher than one already accepted: a replay.
    Replay,
    /// Not signed correctly.
    Invalid,
}

/// A signed vote naming one block for its root.
#[derive(Clone, Debug)]
pub struct Vote {
    /// The representative casting this vote.
    pub account: Account,
    /// Vote round sequence number.
    pub sequence: u64,
    /// Signature over the digest of block hash and sequence.
    pub signature: Signature,
    pub block: Arc<Block>,
}

impl Vote {
    /// Wire size: account(32) + signature(64) + sequence(8), then the
    /// type-tagged block.
    const HEADER_SIZE: usize = 32 + 64 + 8;

    pub fn new(account: Account, private_key: &PrivateKey, sequence: u64, block: Arc<Block>) -> Self {
        let signature = sign_message(digest(&block, sequence).as_bytes(), private_key);
        Self {
            account,
            sequence,
            signature,
            block,
        }
    }

    /// The digest this vote's signature covers.
    pub fn hash(&self) -> BlockHash {
        digest(&self.block, self.sequence)
    }

    /// Verify the signature against the claimed account's public key.
    pub fn validate(&self) -> bool {
        verify_signature(
            self.hash().as_bytes(),
            &self.signature,
            &self.account.public_key(),
        )
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::HEADER_SIZE + 1 + self.block.serialize().len());
        bytes.extend_from_slice(self.account.as_bytes());
        bytes.extend_from_slice(self.signature.as_bytes());
        bytes.extend_from_slice(&self.sequence.to_be_bytes());
        bytes.extend_from_slice(&self.block.serialize_with_type());
        bytes
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, BlockDecodeError> {
        if bytes.len() <= Self::HEADER_SIZE {
            return Err(BlockDecodeError::Truncated);
        }
        let mut account = [0u8; 32];
        account.copy_from_slice(&bytes[0..32]);
        let mut signature = [0u8; 64];
        signature.copy_from_slice(&bytes[32..96]);
        let mut sequence = [0u8; 8];
        sequence.copy_from_slice(&bytes[96..104]);
        let (block, consumed) = Block::deserialize_with_type(&bytes[Self::HEADER_SIZE..])?;
        if Self::HEADER_SIZE + consumed != bytes.len() {
            return Err(BlockDecodeError::Truncated);
        }
        Ok(Self {
            account: Account::new(account),
            sequence: u64::from_be_bytes(sequence),
            signature: Signature(signature),
            block: Arc::new(block),
        })
    }

    pub fn to_json(&self) -> String {
        json!({
            "account": ember_crypto::encode_account(&self.account),
            "signature": self
                .signature
                .as_bytes()
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<String>(),
            "sequence": self.sequence.to_string(),
            "block": self.block.serialize_json(),
        })
        .to_string()
    }
}

/// Digest of `(block hash, sequence)` — what a vote signs.
fn digest(block: &Block, sequence: u64) -> BlockHash {
    hash_parts(&[block.hash().as_bytes(), &sequence.to_be_bytes()])
}

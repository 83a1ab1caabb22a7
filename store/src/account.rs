//! Per-account chain head record.

use ember_types::{Amount, BlockHash};
use serde::{Deserialize, Serialize};

/// Latest information about an account's chain.
///
/// Created when the account's open block is accepted, mutated by every
/// subsequent accepted block, and deleted only when a full rollback removes
/// the open block again.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Hash of the most recent block in this account's chain.
    pub head: BlockHash,
    /// Hash of the most recent block that set the representative
    /// (the open block or the latest change block).
    pub rep_block: BlockHash,
    /// Hash of the account's first block.
    pub open_block: BlockHash,
    /// Balance after the head block.
    pub balance: Amount,
    /// Seconds since the Unix epoch when the account was last modified.
    pub modified: u64,
    /// Number of blocks in this account's chain.
    pub block_count: u64,
}

//! Pending receive records — uncollected sends.

use ember_types::{Account, Amount, BlockHash};
use serde::{Deserialize, Serialize};

/// Key for a pending receive: the destination account plus the hash of the
/// send block awaiting collection.
///
/// Keys order by account first, so one account's pending entries form a
/// contiguous range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PendingKey {
    pub account: Account,
    pub hash: BlockHash,
}

impl PendingKey {
    pub fn new(account: Account, hash: BlockHash) -> Self {
        Self { account, hash }
    }

    /// The lowest key for `account`, for range scans.
    pub fn begin(account: Account) -> Self {
        Self {
            account,
            hash: BlockHash::ZERO,
        }
    }
}

/// Information on an uncollected send: the sending account and the amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInfo {
    pub source: Account,
    pub amount: Amount,
}

impl PendingInfo {
    pub fn new(source: Account, amount: Amount) -> Self {
        Self { source, amount }
    }
}

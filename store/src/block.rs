//! Stored block records.
//!
//! Blocks are stored as opaque type-tagged bytes (the backend does not
//! interpret them) together with a sideband of chain metadata the ledger
//! needs for O(1) lookups: the owning account, the balance after the block,
//! the chain height, and the successor pointer.

use ember_types::{Account, Amount, BlockHash};
use serde::{Deserialize, Serialize};

/// Chain metadata recorded next to each block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSideband {
    /// The account whose chain contains this block.
    pub account: Account,
    /// Account balance after this block.
    pub balance: Amount,
    /// Position in the account's chain (open block = 1).
    pub height: u64,
    /// The next block in the chain, zero while this block is the head.
    pub successor: BlockHash,
}

/// A block as persisted: serialized bytes plus sideband metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlock {
    /// Type-tagged serialized block (see the ledger crate's block codec).
    pub bytes: Vec<u8>,
    pub sideband: BlockSideband,
}

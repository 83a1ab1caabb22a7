//! Genesis bootstrap — the first block on each network.
//!
//! The genesis block is an open block holding the entire supply, written
//! directly into the store (it has no send to collect, so it never goes
//! through `process`). Each network derives a distinct genesis account so
//! hashes differ per network.

use crate::block::{Block, OpenBlock};
use ember_crypto::keypair_from_seed;
use ember_store::{AccountInfo, BlockSideband, ReadTransaction, StoredBlock, WriteTransaction};
use ember_types::{Account, Amount, BlockHash, KeyPair, NetworkId};
use ember_utils::seconds_since_epoch;

/// The full initial supply, credited to the genesis account.
pub const GENESIS_AMOUNT: Amount = Amount::MAX;

/// The genesis block and account for one network.
pub struct Genesis {
    pub block: OpenBlock,
    pub account: Account,
}

/// Key seed per network. The test seed is published so fixtures can spend
/// from genesis; beta and live keys are placeholders until launch keys are
/// ceremony-generated.
fn genesis_seed(network: NetworkId) -> [u8; 32] {
    match network {
        NetworkId::Test => [0u8; 32],
        NetworkId::Beta => [0xBB; 32],
        NetworkId::Live => [0xEE; 32],
    }
}

/// The key pair for a network's genesis account.
pub fn genesis_keypair(network: NetworkId) -> KeyPair {
    keypair_from_seed(&genesis_seed(network))
}

impl Genesis {
    pub fn new(network: NetworkId) -> Self {
        let keypair = genesis_keypair(network);
        let account = keypair.account();
        // Genesis opens against its own account as source.
        let block = OpenBlock::new(
            account.as_root(),
            account,
            account,
            &keypair.private,
            &keypair.public,
            0,
        );
        Self { block, account }
    }

    pub fn hash(&self) -> BlockHash {
        self.block.hash()
    }

    /// Write the genesis block, account record and initial representation
    /// into an empty store.
    pub fn initialize(&self, txn: &mut dyn WriteTransaction) {
        debug_assert_eq!(txn.block_count(), 0, "store already initialized");
        let hash = self.hash();
        txn.block_put(
            &hash,
            &StoredBlock {
                bytes: Block::Open(self.block.clone()).serialize_with_type(),
                sideband: BlockSideband {
                    account: self.account,
                    balance: GENESIS_AMOUNT,
                    height: 1,
                    successor: BlockHash::ZERO,
                },
            },
        );
        txn.account_put(
            &self.account,
            &AccountInfo {
                head: hash,
                rep_block: hash,
                open_block: hash,
                balance: GENESIS_AMOUNT,
                modified: seconds_since_epoch(),
                block_count: 1,
            },
        );
        txn.representation_put(&self.account, GENESIS_AMOUNT);
    }
}

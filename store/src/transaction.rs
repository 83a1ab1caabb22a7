//! Scoped transaction contract.
//!
//! Every table operation hangs off a transaction object rather than taking
//! a bare handle parameter. Lookups return `Option`; a missing key is an
//! ordinary outcome the ledger classifies (gap, unreceivable, ...), while a
//! record that fails to decode indicates store corruption and is fatal in
//! the backend.

use crate::account::AccountInfo;
use crate::block::StoredBlock;
use crate::pending::{PendingInfo, PendingKey};
use ember_types::{Account, Amount, BlockHash};

/// Read-only view over a consistent snapshot of all tables.
pub trait ReadTransaction {
    // ── Accounts ─────────────────────────────────────────────────────────
    fn account_get(&self, account: &Account) -> Option<AccountInfo>;
    fn account_exists(&self, account: &Account) -> bool {
        self.account_get(account).is_some()
    }
    fn account_count(&self) -> u64;
    /// All accounts in key order. Backends expose this as an ordered scan.
    fn accounts_iter(&self) -> Vec<(Account, AccountInfo)>;

    // ── Blocks ───────────────────────────────────────────────────────────
    fn block_get(&self, hash: &BlockHash) -> Option<StoredBlock>;
    fn block_exists(&self, hash: &BlockHash) -> bool {
        self.block_get(hash).is_some()
    }
    fn block_count(&self) -> u64;
    /// The block following `hash` in its account chain, if any.
    fn block_successor(&self, hash: &BlockHash) -> Option<BlockHash>;

    // ── Pending ──────────────────────────────────────────────────────────
    fn pending_get(&self, key: &PendingKey) -> Option<PendingInfo>;
    fn pending_exists(&self, key: &PendingKey) -> bool {
        self.pending_get(key).is_some()
    }
    /// All pending entries addressed to `account`, in key order.
    fn pending_iter(&self, account: &Account) -> Vec<(PendingKey, PendingInfo)>;
    fn pending_count(&self) -> u64;

    // ── Representation ───────────────────────────────────────────────────
    /// Aggregate weight delegated to `representative` (zero if none).
    fn representation_get(&self, representative: &Account) -> Amount;
    fn representation_iter(&self) -> Vec<(Account, Amount)>;

    // ── Votes ────────────────────────────────────────────────────────────
    /// Highest vote sequence number observed from `account` (zero if none).
    fn vote_sequence_get(&self, account: &Account) -> u64;
}

/// A write transaction: all reads plus mutation and atomic commit.
///
/// Dropping the transaction without calling [`commit`](Self::commit)
/// discards every mutation made through it.
pub trait WriteTransaction: ReadTransaction {
    fn account_put(&mut self, account: &Account, info: &AccountInfo);
    fn account_del(&mut self, account: &Account);

    fn block_put(&mut self, hash: &BlockHash, stored: &StoredBlock);
    fn block_del(&mut self, hash: &BlockHash);
    /// Point `hash`'s sideband at `successor` (zero clears it).
    fn block_successor_set(&mut self, hash: &BlockHash, successor: &BlockHash);

    fn pending_put(&mut self, key: &PendingKey, info: &PendingInfo);
    fn pending_del(&mut self, key: &PendingKey);

    fn representation_put(&mut self, representative: &Account, weight: Amount);
    /// Add `delta` to a representative's weight, saturating at zero.
    fn representation_add(&mut self, representative: &Account, delta: Amount) {
        let current = self.representation_get(representative);
        self.representation_put(representative, current.saturating_add(delta));
    }
    /// Subtract `delta` from a representative's weight, saturating at zero.
    fn representation_sub(&mut self, representative: &Account, delta: Amount) {
        let current = self.representation_get(representative);
        self.representation_put(representative, current.saturating_sub(delta));
    }

    fn vote_sequence_put(&mut self, account: &Account, sequence: u64);

    /// Apply every mutation atomically. Consumes the transaction.
    fn commit(self: Box<Self>);
}

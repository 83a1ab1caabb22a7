//! Ledger state transitions.
//!
//! [`Ledger::process`] is the central admission function: it classifies one
//! block against the account tables, pending receives and representation
//! weights, and applies it atomically within the caller's write
//! transaction. [`Ledger::rollback`] is its exact inverse.

use crate::block::{Block, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock};
use crate::error::LedgerError;
use ember_crypto::verify_signature;
use ember_store::{
    AccountInfo, BlockSideband, PendingInfo, PendingKey, ReadTransaction, Store, StoredBlock,
    WriteTransaction,
};
use ember_types::{Account, Amount, BlockHash};
use ember_utils::seconds_since_epoch;
use std::sync::Arc;

/// Outcome of applying one block. Each variant is a terminal classification
/// of one `process` call; only the gap variants can succeed later, once the
/// missing dependency arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Hasn't been seen before and was applied.
    Progress,
    /// Signature was bad: forged or transmission error.
    BadSignature,
    /// Already seen, and was valid.
    Old,
    /// Malicious attempt to spend more than the balance.
    NegativeSpend,
    /// Two blocks claim the same previous: resolved by election.
    Fork,
    /// Source block exists but is not pending for this account.
    Unreceivable,
    /// The block named as previous is unknown.
    GapPrevious,
    /// The block named as source is unknown.
    GapSource,
    /// Receive/open names a source that is not a send block.
    NotReceiveFromSend,
    /// Open's account is not the send's destination.
    AccountMismatch,
    /// Someone claims to hold the private key of the zero account.
    OpenedBurnAccount,
}

const CORRUPT_BLOCK: &str = "stored block failed to decode";

/// The ledger: account chains, pending receives and representative weights
/// behind an abstract transactional store.
pub struct Ledger {
    store: Arc<dyn Store>,
}

impl Ledger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// The underlying store, for opening transactions.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    // ── Read accessors ───────────────────────────────────────────────────

    /// Fetch and decode a block.
    pub fn block<T: ReadTransaction + ?Sized>(&self, txn: &T, hash: &BlockHash) -> Option<Block> {
        let stored = txn.block_get(hash)?;
        let (block, _) = Block::deserialize_with_type(&stored.bytes).expect(CORRUPT_BLOCK);
        Some(block)
    }

    /// The account whose chain contains `hash`.
    pub fn account<T: ReadTransaction + ?Sized>(
        &self,
        txn: &T,
        hash: &BlockHash,
    ) -> Option<Account> {
        txn.block_get(hash).map(|stored| stored.sideband.account)
    }

    /// Balance of the owning account immediately after `hash`.
    pub fn balance<T: ReadTransaction + ?Sized>(&self, txn: &T, hash: &BlockHash) -> Amount {
        txn.block_get(hash)
            .map(|stored| stored.sideband.balance)
            .unwrap_or(Amount::ZERO)
    }

    /// The amount a block moved: balance delta against its predecessor.
    pub fn amount<T: ReadTransaction + ?Sized>(&self, txn: &T, hash: &BlockHash) -> Amount {
        let Some(block) = self.block(txn, hash) else {
            return Amount::ZERO;
        };
        let balance = self.balance(txn, hash);
        let previous = self.balance(txn, &block.previous());
        if balance >= previous {
            balance - previous
        } else {
            previous - balance
        }
    }

    /// Head block of an account's chain, if opened.
    pub fn latest<T: ReadTransaction + ?Sized>(
        &self,
        txn: &T,
        account: &Account,
    ) -> Option<BlockHash> {
        txn.account_get(account).map(|info| info.head)
    }

    /// Head block of an account's chain, or the account number itself when
    /// the chain is unopened (the root its open block will contest).
    pub fn latest_root<T: ReadTransaction + ?Sized>(&self, txn: &T, account: &Account) -> BlockHash {
        match txn.account_get(account) {
            Some(info) => info.head,
            None => account.as_root(),
        }
    }

    /// The block following `hash` in its chain, if any.
    pub fn successor<T: ReadTransaction + ?Sized>(&self, txn: &T, hash: &BlockHash) -> Option<Block> {
        let successor = txn.block_successor(hash)?;
        self.block(txn, &successor)
    }

    /// The block already occupying a fork's chain position: the sibling
    /// sharing `block.root()`.
    pub fn forked_block<T: ReadTransaction + ?Sized>(&self, txn: &T, block: &Block) -> Option<Block> {
        match block {
            Block::Open(open) => {
                let info = txn.account_get(&open.hashables.account)?;
                self.block(txn, &info.open_block)
            }
            other => self.successor(txn, &other.previous()),
        }
    }

    pub fn account_balance<T: ReadTransaction + ?Sized>(&self, txn: &T, account: &Account) -> Amount {
        txn.account_get(account)
            .map(|info| info.balance)
            .unwrap_or(Amount::ZERO)
    }

    /// Sum of all pending receives addressed to an account.
    pub fn account_pending<T: ReadTransaction + ?Sized>(&self, txn: &T, account: &Account) -> Amount {
        txn.pending_iter(account)
            .into_iter()
            .fold(Amount::ZERO, |sum, (_, info)| sum.saturating_add(info.amount))
    }

    /// Aggregate voting weight delegated to a representative.
    pub fn weight<T: ReadTransaction + ?Sized>(&self, txn: &T, representative: &Account) -> Amount {
        txn.representation_get(representative)
    }

    /// Total delegated weight across all representatives.
    pub fn supply<T: ReadTransaction + ?Sized>(&self, txn: &T) -> Amount {
        txn.representation_iter()
            .into_iter()
            .fold(Amount::ZERO, |sum, (_, weight)| sum.saturating_add(weight))
    }

    /// Whether a block exists anywhere in the ledger (own read transaction).
    pub fn block_exists(&self, hash: &BlockHash) -> bool {
        self.store.tx_begin_read().block_exists(hash)
    }

    /// Representative currently credited with an account's weight.
    fn account_representative<T: ReadTransaction + ?Sized>(
        &self,
        txn: &T,
        info: &AccountInfo,
    ) -> Account {
        let block = self.block(txn, &info.rep_block).expect(CORRUPT_BLOCK);
        designated_representative(&block).expect("rep_block does not designate a representative")
    }

    /// Walk back from `hash` to the nearest block that designates a
    /// representative (the open block terminates the walk).
    fn representative_calculated<T: ReadTransaction + ?Sized>(
        &self,
        txn: &T,
        hash: &BlockHash,
    ) -> Result<(BlockHash, Account), LedgerError> {
        let mut current = *hash;
        loop {
            let block = self
                .block(txn, &current)
                .ok_or(LedgerError::BlockNotFound(current))?;
            if let Some(representative) = designated_representative(&block) {
                return Ok((current, representative));
            }
            current = block.previous();
        }
    }

    // ── Process ──────────────────────────────────────────────────────────

    /// Validate `block` against current state and apply it on success.
    ///
    /// Short-circuits on the first failed check; a non-`Progress` result
    /// leaves every table untouched.
    pub fn process(&self, txn: &mut dyn WriteTransaction, block: &Block) -> ProcessResult {
        let result = match block {
            Block::Send(send) => self.process_send(txn, send),
            Block::Receive(receive) => self.process_receive(txn, receive),
            Block::Open(open) => self.process_open(txn, open),
            Block::Change(change) => self.process_change(txn, change),
        };
        match result {
            ProcessResult::Progress => {
                tracing::debug!(hash = %block.hash(), kind = block.block_type().as_str(), "block processed");
            }
            ProcessResult::Fork => {
                tracing::debug!(root = %block.root(), hash = %block.hash(), "fork detected");
            }
            _ => {}
        }
        result
    }

    /// Resolve the account owning `previous` and check the common chain
    /// rules shared by send/receive/change.
    ///
    /// Returns the account and its info, or the failure classification.
    fn resolve_chain(
        &self,
        txn: &dyn WriteTransaction,
        hash: &BlockHash,
        previous: &BlockHash,
        signature: &ember_types::Signature,
    ) -> Result<(Account, AccountInfo), ProcessResult> {
        if txn.block_exists(hash) {
            return Err(ProcessResult::Old);
        }
        let Some(previous_stored) = txn.block_get(previous) else {
            return Err(ProcessResult::GapPrevious);
        };
        let account = previous_stored.sideband.account;
        if !verify_signature(hash.as_bytes(), signature, &account.public_key()) {
            return Err(ProcessResult::BadSignature);
        }
        let info = txn
            .account_get(&account)
            .expect("account record missing for existing block");
        if info.head != *previous {
            // Two blocks claim the same predecessor.
            return Err(ProcessResult::Fork);
        }
        Ok((account, info))
    }

    /// Check a receive/open source: it must be a known send block addressed
    /// to `account` with an uncollected pending entry.
    fn resolve_source(
        &self,
        txn: &dyn WriteTransaction,
        source: &BlockHash,
        account: &Account,
    ) -> Result<PendingInfo, ProcessResult> {
        let Some(source_block) = self.block(txn, source) else {
            return Err(ProcessResult::GapSource);
        };
        let Block::Send(send) = source_block else {
            return Err(ProcessResult::NotReceiveFromSend);
        };
        if send.hashables.destination != *account {
            return Err(ProcessResult::AccountMismatch);
        }
        let key = PendingKey::new(*account, *source);
        match txn.pending_get(&key) {
            Some(pending) => Ok(pending),
            // Already collected.
            None => Err(ProcessResult::Unreceivable),
        }
    }

    fn process_send(&self, txn: &mut dyn WriteTransaction, send: &SendBlock) -> ProcessResult {
        let hash = send.hash();
        let (account, info) = match self.resolve_chain(
            &*txn,
            &hash,
            &send.hashables.previous,
            &send.signature,
        ) {
            Ok(resolved) => resolved,
            Err(result) => return result,
        };
        // A send names the resulting balance; it must not exceed the
        // previous one.
        let Some(amount) = info.balance.checked_sub(send.hashables.balance) else {
            return ProcessResult::NegativeSpend;
        };
        let representative = self.account_representative(&*txn, &info);

        self.append_block(
            txn,
            &hash,
            &Block::Send(send.clone()),
            &account,
            send.hashables.balance,
            &info,
        );
        txn.account_put(
            &account,
            &AccountInfo {
                head: hash,
                rep_block: info.rep_block,
                open_block: info.open_block,
                balance: send.hashables.balance,
                modified: seconds_since_epoch(),
                block_count: info.block_count + 1,
            },
        );
        txn.pending_put(
            &PendingKey::new(send.hashables.destination, hash),
            &PendingInfo::new(account, amount),
        );
        txn.representation_sub(&representative, amount);
        ProcessResult::Progress
    }

    fn process_receive(
        &self,
        txn: &mut dyn WriteTransaction,
        receive: &ReceiveBlock,
    ) -> ProcessResult {
        let hash = receive.hash();
        let (account, info) = match self.resolve_chain(
            &*txn,
            &hash,
            &receive.hashables.previous,
            &receive.signature,
        ) {
            Ok(resolved) => resolved,
            Err(result) => return result,
        };
        let pending = match self.resolve_source(&*txn, &receive.hashables.source, &account) {
            Ok(pending) => pending,
            Err(result) => return result,
        };
        let balance = info.balance.saturating_add(pending.amount);
        let representative = self.account_representative(&*txn, &info);

        txn.pending_del(&PendingKey::new(account, receive.hashables.source));
        self.append_block(txn, &hash, &Block::Receive(receive.clone()), &account, balance, &info);
        txn.account_put(
            &account,
            &AccountInfo {
                head: hash,
                rep_block: info.rep_block,
                open_block: info.open_block,
                balance,
                modified: seconds_since_epoch(),
                block_count: info.block_count + 1,
            },
        );
        txn.representation_add(&representative, pending.amount);
        ProcessResult::Progress
    }

    fn process_open(&self, txn: &mut dyn WriteTransaction, open: &OpenBlock) -> ProcessResult {
        let hash = open.hash();
        if txn.block_exists(&hash) {
            return ProcessResult::Old;
        }
        let account = open.hashables.account;
        if account.is_zero() {
            return ProcessResult::OpenedBurnAccount;
        }
        if !verify_signature(hash.as_bytes(), &open.signature, &account.public_key()) {
            return ProcessResult::BadSignature;
        }
        if txn.account_exists(&account) {
            // Re-opening an opened account contests the same root.
            return ProcessResult::Fork;
        }
        let pending = match self.resolve_source(&*txn, &open.hashables.source, &account) {
            Ok(pending) => pending,
            Err(result) => return result,
        };

        txn.pending_del(&PendingKey::new(account, open.hashables.source));
        txn.block_put(
            &hash,
            &StoredBlock {
                bytes: Block::Open(open.clone()).serialize_with_type(),
                sideband: BlockSideband {
                    account,
                    balance: pending.amount,
                    height: 1,
                    successor: BlockHash::ZERO,
                },
            },
        );
        txn.account_put(
            &account,
            &AccountInfo {
                head: hash,
                rep_block: hash,
                open_block: hash,
                balance: pending.amount,
                modified: seconds_since_epoch(),
                block_count: 1,
            },
        );
        txn.representation_add(&open.hashables.representative, pending.amount);
        ProcessResult::Progress
    }

    fn process_change(&self, txn: &mut dyn WriteTransaction, change: &ChangeBlock) -> ProcessResult {
        let hash = change.hash();
        let (account, info) = match self.resolve_chain(
            &*txn,
            &hash,
            &change.hashables.previous,
            &change.signature,
        ) {
            Ok(resolved) => resolved,
            Err(result) => return result,
        };
        let old_representative = self.account_representative(&*txn, &info);

        self.append_block(txn, &hash, &Block::Change(change.clone()), &account, info.balance, &info);
        txn.account_put(
            &account,
            &AccountInfo {
                head: hash,
                rep_block: hash,
                open_block: info.open_block,
                balance: info.balance,
                modified: seconds_since_epoch(),
                block_count: info.block_count + 1,
            },
        );
        txn.representation_sub(&old_representative, info.balance);
        txn.representation_add(&change.hashables.representative, info.balance);
        ProcessResult::Progress
    }

    /// Store a non-open block and link it behind the current head.
    fn append_block(
        &self,
        txn: &mut dyn WriteTransaction,
        hash: &BlockHash,
        block: &Block,
        account: &Account,
        balance: Amount,
        info: &AccountInfo,
    ) {
        txn.block_put(
            hash,
            &StoredBlock {
                bytes: block.serialize_with_type(),
                sideband: BlockSideband {
                    account: *account,
                    balance,
                    height: info.block_count + 1,
                    successor: BlockHash::ZERO,
                },
            },
        );
        txn.block_successor_set(&block.previous(), hash);
    }

    // ── Rollback ─────────────────────────────────────────────────────────

    /// Undo blocks from the owning account's head backwards until `hash`
    /// has been removed. Safe to call for hashes already rolled back.
    pub fn rollback(&self, txn: &mut dyn WriteTransaction, hash: &BlockHash) -> Result<(), LedgerError> {
        let account = match txn.block_get(hash) {
            Some(stored) => stored.sideband.account,
            None => return Ok(()),
        };
        while txn.block_exists(hash) {
            let info = txn
                .account_get(&account)
                .ok_or(LedgerError::AccountNotFound(*hash))?;
            let head_hash = info.head;
            let head = self
                .block(&*txn, &head_hash)
                .ok_or(LedgerError::BlockNotFound(head_hash))?;
            tracing::debug!(hash = %head_hash, kind = head.block_type().as_str(), "rolling back block");
            match &head {
                Block::Send(send) => self.rollback_send(txn, &head_hash, send, &account)?,
                Block::Receive(receive) => {
                    self.rollback_receive(txn, &head_hash, receive, &account, &info)?
                }
                Block::Open(open) => self.rollback_open(txn, &head_hash, open, &account, &info)?,
                Block::Change(change) => {
                    self.rollback_change(txn, &head_hash, change, &account, &info)?
                }
            }
        }
        Ok(())
    }

    fn rollback_send(
        &self,
        txn: &mut dyn WriteTransaction,
        hash: &BlockHash,
        send: &SendBlock,
        account: &Account,
    ) -> Result<(), LedgerError> {
        // If the destination already collected this send, its receiving
        // blocks must come off first so the pending entry reappears.
        let key = PendingKey::new(send.hashables.destination, *hash);
        while !txn.pending_exists(&key) {
            let destination_head = self
                .latest(&*txn, &send.hashables.destination)
                .ok_or(LedgerError::Corruption("send neither pending nor received"))?;
            self.rollback(txn, &destination_head)?;
        }
        txn.pending_del(&key);

        // Re-read: unwinding the destination may have touched shared tables.
        let info = &txn
            .account_get(account)
            .ok_or(LedgerError::AccountNotFound(*hash))?;
        let previous_balance = self.balance(&*txn, &send.hashables.previous);
        let amount = previous_balance
            .checked_sub(info.balance)
            .ok_or(LedgerError::Corruption("send increased balance"))?;
        let representative = self.account_representative(&*txn, info);

        txn.representation_add(&representative, amount);
        txn.account_put(
            account,
            &AccountInfo {
                head: send.hashables.previous,
                rep_block: info.rep_block,
                open_block: info.open_block,
                balance: previous_balance,
                modified: seconds_since_epoch(),
                block_count: info.block_count - 1,
            },
        );
        txn.block_del(hash);
        txn.block_successor_set(&send.hashables.previous, &BlockHash::ZERO);
        Ok(())
    }

    fn rollback_receive(
        &self,
        txn: &mut dyn WriteTransaction,
        hash: &BlockHash,
        receive: &ReceiveBlock,
        account: &Account,
        info: &AccountInfo,
    ) -> Result<(), LedgerError> {
        let previous_balance = self.balance(&*txn, &receive.hashables.previous);
        let amount = info
            .balance
            .checked_sub(previous_balance)
            .ok_or(LedgerError::Corruption("receive decreased balance"))?;
        let source_account = self
            .account(&*txn, &receive.hashables.source)
            .ok_or(LedgerError::BlockNotFound(receive.hashables.source))?;
        let representative = self.account_representative(&*txn, info);

        txn.representation_sub(&representative, amount);
        txn.pending_put(
            &PendingKey::new(*account, receive.hashables.source),
            &PendingInfo::new(source_account, amount),
        );
        txn.account_put(
            account,
            &AccountInfo {
                head: receive.hashables.previous,
                rep_block: info.rep_block,
                open_block: info.open_block,
                balance: previous_balance,
                modified: seconds_since_epoch(),
                block_count: info.block_count - 1,
            },
        );
        txn.block_del(hash);
        txn.block_successor_set(&receive.hashables.previous, &BlockHash::ZERO);
        Ok(())
    }

    fn rollback_open(
        &self,
        txn: &mut dyn WriteTransaction,
        hash: &BlockHash,
        open: &OpenBlock,
        account: &Account,
        info: &AccountInfo,
    ) -> Result<(), LedgerError> {
        let amount = info.balance;
        let source_account = self
            .account(&*txn, &open.hashables.source)
            .ok_or(LedgerError::BlockNotFound(open.hashables.source))?;

        txn.representation_sub(&open.hashables.representative, amount);
        txn.pending_put(
            &PendingKey::new(*account, open.hashables.source),
            &PendingInfo::new(source_account, amount),
        );
        txn.account_del(account);
        txn.block_del(hash);
        Ok(())
    }

    fn rollback_change(
        &self,
        txn: &mut dyn WriteTransaction,
        hash: &BlockHash,
        change: &ChangeBlock,
        account: &Account,
        info: &AccountInfo,
    ) -> Result<(), LedgerError> {
        let (rep_block, old_representative) =
            self.representative_calculated(&*txn, &change.hashables.previous)?;

        txn.representation_sub(&change.hashables.representative, info.balance);
        txn.representation_add(&old_representative, info.balance);
        txn.account_put(
            account,
            &AccountInfo {
                head: change.hashables.previous,
                rep_block,
                open_block: info.open_block,
                balance: info.balance,
                modified: seconds_since_epoch(),
                block_count: info.block_count - 1,
            },
        );
        txn.block_del(hash);
        txn.block_successor_set(&change.hashables.previous, &BlockHash::ZERO);
        Ok(())
    }
}

/// The representative a block designates, for open and change blocks.
fn designated_representative(block: &Block) -> Option<Account> {
    match block {
        Block::Open(open) => Some(open.hashables.representative),
        Block::Change(change) => Some(change.hashables.representative),
        Block::Send(_) | Block::Receive(_) => None,
    }
}

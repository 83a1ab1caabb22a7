//! In-memory store — the reference implementation of the transaction
//! contract.
//!
//! Reads snapshot the tables via a cheap `Arc` clone. A write transaction
//! holds the single writer lock for its whole lifetime, works on a private
//! copy of the tables, and swaps the copy in on commit — giving the
//! single-writer, snapshot-isolated, atomic-commit semantics a persistent
//! backend gets from its transaction machinery.

use crate::account::AccountInfo;
use crate::block::StoredBlock;
use crate::pending::{PendingInfo, PendingKey};
use crate::transaction::{ReadTransaction, WriteTransaction};
use crate::Store;
use ember_types::{Account, Amount, BlockHash};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

#[derive(Clone, Default)]
struct Tables {
    accounts: BTreeMap<Account, AccountInfo>,
    blocks: HashMap<BlockHash, StoredBlock>,
    pending: BTreeMap<PendingKey, PendingInfo>,
    representation: BTreeMap<Account, Amount>,
    vote_sequences: HashMap<Account, u64>,
}

impl Tables {
    fn account_get(&self, account: &Account) -> Option<AccountInfo> {
        self.accounts.get(account).cloned()
    }

    fn block_get(&self, hash: &BlockHash) -> Option<StoredBlock> {
        self.blocks.get(hash).cloned()
    }

    fn pending_get(&self, key: &PendingKey) -> Option<PendingInfo> {
        self.pending.get(key).cloned()
    }

    fn pending_iter(&self, account: &Account) -> Vec<(PendingKey, PendingInfo)> {
        self.pending
            .range(PendingKey::begin(*account)..)
            .take_while(|(key, _)| key.account == *account)
            .map(|(key, info)| (*key, info.clone()))
            .collect()
    }

    fn representation_get(&self, representative: &Account) -> Amount {
        self.representation
            .get(representative)
            .copied()
            .unwrap_or(Amount::ZERO)
    }
}

/// Thread-safe in-memory storage backend.
pub struct MemoryStore {
    tables: RwLock<Arc<Tables>>,
    write_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Arc::new(Tables::default())),
            write_lock: Mutex::new(()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn tx_begin_read(&self) -> Box<dyn ReadTransaction + '_> {
        let snapshot = Arc::clone(&self.tables.read().unwrap());
        Box::new(MemoryReadTransaction { snapshot })
    }

    fn tx_begin_write(&self) -> Box<dyn WriteTransaction + '_> {
        let guard = self.write_lock.lock().unwrap();
        let working = (**self.tables.read().unwrap()).clone();
        Box::new(MemoryWriteTransaction {
            store: self,
            _guard: guard,
            working,
        })
    }
}

struct MemoryReadTransaction {
    snapshot: Arc<Tables>,
}

macro_rules! impl_read_transaction {
    ($type:ty, $field:ident) => {
        impl ReadTransaction for $type {
            fn account_get(&self, account: &Account) -> Option<AccountInfo> {
                self.$field.account_get(account)
            }

            fn account_count(&self) -> u64 {
                self.$field.accounts.len() as u64
            }

            fn accounts_iter(&self) -> Vec<(Account, AccountInfo)> {
                self.$field
                    .accounts
                    .iter()
                    .map(|(account, info)| (*account, info.clone()))
                    .collect()
            }

            fn block_get(&self, hash: &BlockHash) -> Option<StoredBlock> {
                self.$field.block_get(hash)
            }

            fn block_count(&self) -> u64 {
                self.$field.blocks.len() as u64
            }

            fn block_successor(&self, hash: &BlockHash) -> Option<BlockHash> {
                self.$field
                    .block_get(hash)
                    .map(|stored| stored.sideband.successor)
                    .filter(|successor| !successor.is_zero())
            }

            fn pending_get(&self, key: &PendingKey) -> Option<PendingInfo> {
                self.$field.pending_get(key)
            }

            fn pending_iter(&self, account: &Account) -> Vec<(PendingKey, PendingInfo)> {
                self.$field.pending_iter(account)
            }

            fn pending_count(&self) -> u64 {
                self.$field.pending.len() as u64
            }

            fn representation_get(&self, representative: &Account) -> Amount {
                self.$field.representation_get(representative)
            }

            fn representation_iter(&self) -> Vec<(Account, Amount)> {
                self.$field
                    .representation
                    .iter()
                    .map(|(account, weight)| (*account, *weight))
                    .collect()
            }

            fn vote_sequence_get(&self, account: &Account) -> u64 {
                self.$field
                    .vote_sequences
                    .get(account)
                    .copied()
                    .unwrap_or(0)
            }
        }
    };
}

impl_read_transaction!(MemoryReadTransaction, snapshot);
impl_read_transaction!(MemoryWriteTransaction<'_>, working);

struct MemoryWriteTransaction<'a> {
    store: &'a MemoryStore,
    _guard: MutexGuard<'a, ()>,
    working: Tables,
}

impl WriteTransaction for MemoryWriteTransaction<'_> {
    fn account_put(&mut self, account: &Account, info: &AccountInfo) {
        self.working.accounts.insert(*account, info.clone());
    }

    fn account_del(&mut self, account: &Account) {
        self.working.accounts.remove(account);
    }

    fn block_put(&mut self, hash: &BlockHash, stored: &StoredBlock) {
        self.working.blocks.insert(*hash, stored.clone());
    }

    fn block_del(&mut self, hash: &BlockHash) {
        self.working.blocks.remove(hash);
    }

    fn block_successor_set(&mut self, hash: &BlockHash, successor: &BlockHash) {
        if let Some(stored) = self.working.blocks.get_mut(hash) {
            stored.sideband.successor = *successor;
        }
    }

    fn pending_put(&mut self, key: &PendingKey, info: &PendingInfo) {
        self.working.pending.insert(*key, info.clone());
    }

    fn pending_del(&mut self, key: &PendingKey) {
        self.working.pending.remove(key);
    }

    fn representation_put(&mut self, representative: &Account, weight: Amount) {
        if weight.is_zero() {
            self.working.representation.remove(representative);
        } else {
            self.working.representation.insert(*representative, weight);
        }
    }

    fn vote_sequence_put(&mut self, account: &Account, sequence: u64) {
        self.working.vote_sequences.insert(*account, sequence);
    }

    fn commit(self: Box<Self>) {
        *self.store.tables.write().unwrap() = Arc::new(self.working);
    }
}

//! Abstract transactional store contract for the Ember ledger.
//!
//! Every storage backend (LMDB, RocksDB, in-memory) exposes the same
//! contract: a [`Store`] hands out transaction objects that scope all table
//! operations. At most one write transaction is open at a time, readers see
//! a consistent snapshot, and a write transaction's effects apply atomically
//! on commit and are discarded on drop.
//!
//! The ledger depends only on this contract; [`MemoryStore`] is the
//! reference implementation.

pub mod account;
pub mod block;
pub mod memory;
pub mod pending;
pub mod transaction;

pub use account::AccountInfo;
pub use block::{BlockSideband, StoredBlock};
pub use memory::MemoryStore;
pub use pending::{PendingInfo, PendingKey};
pub use transaction::{ReadTransaction, WriteTransaction};

/// A storage backend capable of opening scoped transactions.
pub trait Store: Send + Sync {
    /// Open a read transaction over a consistent snapshot.
    fn tx_begin_read(&self) -> Box<dyn ReadTransaction + '_>;

    /// Open the (single) write transaction. Blocks while another write
    /// transaction is open.
    fn tx_begin_write(&self) -> Box<dyn WriteTransaction + '_>;
}

//! Block-lattice ledger.
//!
//! Each account has its own hash-linked block chain; there is no global
//! ordering. This crate defines the block model with its canonical hashing
//! and wire codecs, and the ledger state machine that admits or rejects
//! blocks against per-account chain state, pending receives and
//! representative weights — plus the exact inverse of admission, rollback.

pub mod block;
pub mod error;
pub mod genesis;
pub mod ledger;

pub use block::{
    Block, BlockDecodeError, BlockType, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock,
};
pub use error::LedgerError;
pub use genesis::Genesis;
pub use ledger::{Ledger, ProcessResult};

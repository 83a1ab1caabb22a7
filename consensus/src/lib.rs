//! Consensus — fork resolution via representative-weighted elections.
//!
//! Each account delegates its balance to a representative. When two blocks
//! contest the same root, representatives vote and the candidate with the
//! most delegated weight wins: immediately at quorum, or by settling time
//! when nobody contests.
//!
//! ## Module overview
//!
//! - [`vote`] — a representative's signed, sequence-numbered ballot.
//! - [`votes`] — per-root ballot container and weight tally.
//! - [`election`] — per-root state machine with one-shot confirmation.
//! - [`active_transactions`] — the set of all contested roots and the
//!   periodic announcement sweep.

pub mod active_transactions;
pub mod election;
pub mod error;
pub mod vote;
pub mod votes;

pub use active_transactions::{ActiveTransactions, ConflictInfo};
pub use election::{ConfirmationAction, Election};
pub use error::ConsensusError;
pub use vote::{Vote, VoteCode};
pub use votes::{TallyResult, Votes};

//! Fundamental types for the Ember block-lattice.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: hashes, accounts, keys, amounts, network ids and consensus
//! parameters.

pub mod amount;
pub mod hash;
pub mod keys;
pub mod network;
pub mod params;

pub use amount::Amount;
pub use hash::BlockHash;
pub use keys::{Account, KeyPair, PrivateKey, PublicKey, Signature};
pub use network::NetworkId;
pub use params::ConsensusParams;

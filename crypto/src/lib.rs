//! Cryptographic primitives for Ember.
//!
//! Blake2b-256 block digests, Ed25519 signing and verification, and the
//! `emb_` account address text format.

pub mod address;
pub mod hash;
pub mod keys;
pub mod sign;

pub use address::{decode_account, encode_account, valid_account};
pub use hash::{blake2b_256, blake2b_256_multi, hash_parts};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};

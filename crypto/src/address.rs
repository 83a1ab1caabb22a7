//! Account address text format.
//!
//! Format: `emb_` + base32(account, 52 chars) + base32(checksum, 8 chars)
//!
//! Checksum: first 5 bytes of Blake2b-256(account bytes).
//! Base32 alphabet: `13456789abcdefghijkmnopqrstuwxyz` (avoids ambiguous
//! chars). Total address length: 4 (prefix) + 52 + 8 = 64 characters.

use ember_types::Account;

/// Base32 alphabet (32 chars, avoids visually ambiguous 0/O, 2/Z, l/I, v).
const BASE32_ALPHABET: &[u8; 32] = b"13456789abcdefghijkmnopqrstuwxyz";

/// Reverse lookup table: ASCII byte → 5-bit value (0xFF = invalid).
const BASE32_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let alpha = BASE32_ALPHABET;
    let mut i = 0;
    while i < 32 {
        table[alpha[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Prefix for all Ember account addresses.
const PREFIX: &str = "emb_";
/// Number of base32 characters for the account (256 bits → ceil(256/5) = 52).
const ACCOUNT_CHARS: usize = 52;
/// Expected length of the encoded part (after `emb_`): 52 account + 8 checksum.
const ENCODED_LEN: usize = 60;

/// Encode a byte slice as base32 using the Ember alphabet.
fn encode_base32(bytes: &[u8]) -> String {
    let total_bits = bytes.len() * 8;
    let num_chars = total_bits.div_ceil(5);
    let mut result = String::with_capacity(num_chars);

    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | byte as u64;
        bits_in_buffer += 8;
        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let idx = ((buffer >> bits_in_buffer) & 0x1F) as usize;
            result.push(BASE32_ALPHABET[idx] as char);
        }
    }
    // Remaining bits (padded with zeros on the right).
    if bits_in_buffer > 0 {
        let idx = ((buffer << (5 - bits_in_buffer)) & 0x1F) as usize;
        result.push(BASE32_ALPHABET[idx] as char);
    }

    result
}

/// Decode a base32 string into a fixed-size byte array. Returns `None` on
/// invalid characters or wrong length.
fn decode_base32_fixed<const N: usize>(s: &str) -> Option<[u8; N]> {
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;
    let mut result = [0u8; N];
    let mut pos = 0;

    for c in s.bytes() {
        if c >= 128 {
            return None;
        }
        let val = BASE32_DECODE[c as usize];
        if val == 0xFF {
            return None;
        }
        buffer = (buffer << 5) | val as u64;
        bits_in_buffer += 5;
        if bits_in_buffer >= 8 {
            bits_in_buffer -= 8;
            if pos < N {
                result[pos] = (buffer >> bits_in_buffer) as u8;
                pos += 1;
            }
        }
    }

    if pos < N {
        return None;
    }
    Some(result)
}

/// Render an account number as its `emb_` address string.
pub fn encode_account(account: &Account) -> String {
    let account_encoded = encode_base32(account.as_bytes());
    let hash = crate::blake2b_256(account.as_bytes());
    let checksum_encoded = encode_base32(&hash[..5]);
    format!("{}{}{}", PREFIX, account_encoded, checksum_encoded)
}

/// Parse an `emb_` address back into an account number.
///
/// Returns `None` if the address is malformed or has an invalid checksum.
pub fn decode_account(address: &str) -> Option<Account> {
    let encoded = address.strip_prefix(PREFIX)?;
    if encoded.len() != ENCODED_LEN {
        return None;
    }

    let account_encoded = &encoded[..ACCOUNT_CHARS];
    let checksum_encoded = &encoded[ACCOUNT_CHARS..];

    let account_bytes: [u8; 32] = decode_base32_fixed(account_encoded)?;
    let checksum_bytes: [u8; 5] = decode_base32_fixed(checksum_encoded)?;

    let expected_checksum = &crate::blake2b_256(&account_bytes)[..5];
    if checksum_bytes != *expected_checksum {
        return None;
    }

    Some(Account::new(account_bytes))
}

/// Validate that an address string is well-formed and its checksum is correct.
pub fn valid_account(address: &str) -> bool {
    decode_account(address).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{generate_keypair, keypair_from_seed};

    #[test]
    fn encode_and_validate() {
        let kp = generate_keypair();
        let addr = encode_account(&kp.account());
        assert!(addr.starts_with("emb_"));
        assert_eq!(addr.len(), 64);
        assert!(valid_account(&addr));
    }

    #[test]
    fn encode_is_deterministic() {
        let kp = keypair_from_seed(&[7u8; 32]);
        let a1 = encode_account(&kp.account());
        let a2 = encode_account(&kp.account());
        assert_eq!(a1, a2);
    }

    #[test]
    fn decode_roundtrip() {
        let kp = generate_keypair();
        let addr = encode_account(&kp.account());
        let decoded = decode_account(&addr).unwrap();
        assert_eq!(decoded, kp.account());
    }

    #[test]
    fn invalid_prefix_rejected() {
        let kp = generate_keypair();
        let addr = encode_account(&kp.account());
        let wrong = addr.replacen("emb_", "xrb_", 1);
        assert!(!valid_account(&wrong));
    }

    #[test]
    fn invalid_checksum_rejected() {
        let kp = generate_keypair();
        let mut bad = encode_account(&kp.account());
        let last = bad.pop().unwrap();
        let replacement = if last == '1' { '3' } else { '1' };
        bad.push(replacement);
        assert!(!valid_account(&bad));
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(!valid_account("emb_tooshort"));
        assert!(!valid_account("emb_"));
    }

    #[test]
    fn burn_account_encodes() {
        let addr = encode_account(&Account::ZERO);
        assert_eq!(decode_account(&addr), Some(Account::ZERO));
    }

    #[test]
    fn base32_encode_decode_roundtrip() {
        let data = [0xDE, 0xAD, 0xBE, 0xEF, 0x42];
        let encoded = encode_base32(&data);
        let decoded: [u8; 5] = decode_base32_fixed(&encoded).unwrap();
        assert_eq!(decoded, data);
    }
}

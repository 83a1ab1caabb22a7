//! The four block variants and their codecs.
//!
//! A block is immutable once signed. Its canonical hash covers only the
//! variant's hashable fields — never the signature or work — so re-signing
//! or re-working a block changes its identity for storage purposes but not
//! its hash. Binary encodings are fixed width with no padding and no length
//! prefixes; every variant's wire size is known at compile time.

use ember_crypto::{hash_parts, sign_message};
use ember_types::{Account, Amount, BlockHash, PrivateKey, PublicKey, Signature};
use serde_json::{json, Value};
use thiserror::Error;

/// Wire tag for each block type. Tags 0 and 1 are reserved for invalid and
/// not-a-block markers in the network protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockType {
    Send,
    Receive,
    Open,
    Change,
}

impl BlockType {
    pub fn tag(self) -> u8 {
        match self {
            Self::Send => 2,
            Self::Receive => 3,
            Self::Open => 4,
            Self::Change => 5,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            2 => Some(Self::Send),
            3 => Some(Self::Receive),
            4 => Some(Self::Open),
            5 => Some(Self::Change),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Receive => "receive",
            Self::Open => "open",
            Self::Change => "change",
        }
    }

    pub fn from_str_name(name: &str) -> Option<Self> {
        match name {
            "send" => Some(Self::Send),
            "receive" => Some(Self::Receive),
            "open" => Some(Self::Open),
            "change" => Some(Self::Change),
            _ => None,
        }
    }
}

/// Failure to construct a block from bytes or JSON.
///
/// Decoding either yields a fully-populated, internally-consistent block or
/// one of these — never a partially-populated value.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BlockDecodeError {
    #[error("input truncated or wrong size")]
    Truncated,
    #[error("unknown block type tag {0}")]
    UnknownType(u8),
    #[error("unknown block type name `{0}`")]
    UnknownTypeName(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("malformed hex in field `{0}`")]
    BadHex(&'static str),
    #[error("malformed account in field `{0}`")]
    BadAccount(&'static str),
    #[error("malformed json: {0}")]
    BadJson(String),
}

// ── Field codec helpers ──────────────────────────────────────────────────

fn read_32(bytes: &[u8], offset: usize) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes[offset..offset + 32]);
    out
}

fn read_16(bytes: &[u8], offset: usize) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(&bytes[offset..offset + 16]);
    out
}

fn read_64(bytes: &[u8], offset: usize) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&bytes[offset..offset + 64]);
    out
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut out = [0u8; 8];
    out.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_be_bytes(out)
}

fn json_field<'a>(tree: &'a Value, field: &'static str) -> Result<&'a str, BlockDecodeError> {
    tree.get(field)
        .and_then(Value::as_str)
        .ok_or(BlockDecodeError::MissingField(field))
}

fn hash_from_json(tree: &Value, field: &'static str) -> Result<BlockHash, BlockDecodeError> {
    let text = json_field(tree, field)?;
    if text.len() != 64 {
        return Err(BlockDecodeError::BadHex(field));
    }
    let bytes = hex::decode(text).map_err(|_| BlockDecodeError::BadHex(field))?;
    let arr: [u8; 32] = bytes.try_into().map_err(|_| BlockDecodeError::BadHex(field))?;
    Ok(BlockHash::new(arr))
}

fn account_from_json(tree: &Value, field: &'static str) -> Result<Account, BlockDecodeError> {
    let text = json_field(tree, field)?;
    ember_crypto::decode_account(text).ok_or(BlockDecodeError::BadAccount(field))
}

fn amount_from_json(tree: &Value, field: &'static str) -> Result<Amount, BlockDecodeError> {
    let text = json_field(tree, field)?;
    if text.is_empty() || text.len() > 32 {
        return Err(BlockDecodeError::BadHex(field));
    }
    let raw = u128::from_str_radix(text, 16).map_err(|_| BlockDecodeError::BadHex(field))?;
    Ok(Amount::new(raw))
}

fn work_from_json(tree: &Value, field: &'static str) -> Result<u64, BlockDecodeError> {
    let text = json_field(tree, field)?;
    if text.is_empty() || text.len() > 16 {
        return Err(BlockDecodeError::BadHex(field));
    }
    u64::from_str_radix(text, 16).map_err(|_| BlockDecodeError::BadHex(field))
}

fn signature_from_json(tree: &Value, field: &'static str) -> Result<Signature, BlockDecodeError> {
    let text = json_field(tree, field)?;
    if text.len() != 128 {
        return Err(BlockDecodeError::BadHex(field));
    }
    let bytes = hex::decode(text).map_err(|_| BlockDecodeError::BadHex(field))?;
    let arr: [u8; 64] = bytes.try_into().map_err(|_| BlockDecodeError::BadHex(field))?;
    Ok(Signature(arr))
}

fn amount_hex(amount: Amount) -> String {
    format!("{:032X}", amount.raw())
}

fn work_hex(work: u64) -> String {
    format!("{:016x}", work)
}

fn signature_hex(signature: &Signature) -> String {
    signature
        .as_bytes()
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect()
}

// ── Send ─────────────────────────────────────────────────────────────────

/// Hashable fields of a send block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendHashables {
    pub previous: BlockHash,
    pub destination: Account,
    /// Balance of the sending account *after* this block.
    pub balance: Amount,
}

impl SendHashables {
    fn hash(&self) -> BlockHash {
        hash_parts(&[
            self.previous.as_bytes(),
            self.destination.as_bytes(),
            &self.balance.to_be_bytes(),
        ])
    }
}

/// Debits an account by setting its new (lower) balance and naming a
/// destination that may later collect the difference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendBlock {
    pub hashables: SendHashables,
    pub signature: Signature,
    pub work: u64,
}

impl SendBlock {
    pub const SIZE: usize = 32 + 32 + 16 + 64 + 8;

    pub fn new(
        previous: BlockHash,
        destination: Account,
        balance: Amount,
        private_key: &PrivateKey,
        _public_key: &PublicKey,
        work: u64,
    ) -> Self {
        let hashables = SendHashables {
            previous,
            destination,
            balance,
        };
        let signature = sign_message(hashables.hash().as_bytes(), private_key);
        Self {
            hashables,
            signature,
            work,
        }
    }

    pub fn hash(&self) -> BlockHash {
        self.hashables.hash()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::SIZE);
        bytes.extend_from_slice(self.hashables.previous.as_bytes());
        bytes.extend_from_slice(self.hashables.destination.as_bytes());
        bytes.extend_from_slice(&self.hashables.balance.to_be_bytes());
        bytes.extend_from_slice(self.signature.as_bytes());
        bytes.extend_from_slice(&self.work.to_be_bytes());
        bytes
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, BlockDecodeError> {
        if bytes.len() != Self::SIZE {
            return Err(BlockDecodeError::Truncated);
        }
        Ok(Self {
            hashables: SendHashables {
                previous: BlockHash::new(read_32(bytes, 0)),
                destination: Account::new(read_32(bytes, 32)),
                balance: Amount::from_be_bytes(read_16(bytes, 64)),
            },
            signature: Signature(read_64(bytes, 80)),
            work: read_u64(bytes, 144),
        })
    }

    fn to_json(&self) -> Value {
        json!({
            "type": "send",
            "previous": self.hashables.previous.to_string(),
            "destination": ember_crypto::encode_account(&self.hashables.destination),
            "balance": amount_hex(self.hashables.balance),
            "work": work_hex(self.work),
            "signature": signature_hex(&self.signature),
        })
    }

    fn from_json(tree: &Value) -> Result<Self, BlockDecodeError> {
        Ok(Self {
            hashables: SendHashables {
                previous: hash_from_json(tree, "previous")?,
                destination: account_from_json(tree, "destination")?,
                balance: amount_from_json(tree, "balance")?,
            },
            signature: signature_from_json(tree, "signature")?,
            work: work_from_json(tree, "work")?,
        })
    }
}

// ── Receive ──────────────────────────────────────────────────────────────

/// Hashable fields of a receive block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiveHashables {
    pub previous: BlockHash,
    /// The send block being collected.
    pub source: BlockHash,
}

impl ReceiveHashables {
    fn hash(&self) -> BlockHash {
        hash_parts(&[self.previous.as_bytes(), self.source.as_bytes()])
    }
}

/// Credits an account with the amount of a pending send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiveBlock {
    pub hashables: ReceiveHashables,
    pub signature: Signature,
    pub work: u64,
}

impl ReceiveBlock {
    pub const SIZE: usize = 32 + 32 + 64 + 8;

    pub fn new(
        previous: BlockHash,
        source: BlockHash,
        private_key: &PrivateKey,
        _public_key: &PublicKey,
        work: u64,
    ) -> Self {
        let hashables = ReceiveHashables { previous, source };
        let signature = sign_message(hashables.hash().as_bytes(), private_key);
        Self {
            hashables,
            signature,
            work,
        }
    }

    pub fn hash(&self) -> BlockHash {
        self.hashables.hash()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::SIZE);
        bytes.extend_from_slice(self.hashables.previous.as_bytes());
        bytes.extend_from_slice(self.hashables.source.as_bytes());
        bytes.extend_from_slice(self.signature.as_bytes());
        bytes.extend_from_slice(&self.work.to_be_bytes());
        bytes
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, BlockDecodeError> {
        if bytes.len() != Self::SIZE {
            return Err(BlockDecodeError::Truncated);
        }
        Ok(Self {
            hashables: ReceiveHashables {
                previous: BlockHash::new(read_32(bytes, 0)),
                source: BlockHash::new(read_32(bytes, 32)),
            },
            signature: Signature(read_64(bytes, 64)),
            work: read_u64(bytes, 128),
        })
    }

    fn to_json(&self) -> Value {
        json!({
            "type": "receive",
            "previous": self.hashables.previous.to_string(),
            "source": self.hashables.source.to_string(),
            "work": work_hex(self.work),
            "signature": signature_hex(&self.signature),
        })
    }

    fn from_json(tree: &Value) -> Result<Self, BlockDecodeError> {
        Ok(Self {
            hashables: ReceiveHashables {
                previous: hash_from_json(tree, "previous")?,
                source: hash_from_json(tree, "source")?,
            },
            signature: signature_from_json(tree, "signature")?,
            work: work_from_json(tree, "work")?,
        })
    }
}

// ── Open ─────────────────────────────────────────────────────────────────

/// Hashable fields of an open block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenHashables {
    /// The send block funding this account.
    pub source: BlockHash,
    pub representative: Account,
    pub account: Account,
}

impl OpenHashables {
    fn hash(&self) -> BlockHash {
        hash_parts(&[
            self.source.as_bytes(),
            self.representative.as_bytes(),
            self.account.as_bytes(),
        ])
    }
}

/// The first block of an account's chain: collects a pending send and
/// designates the account's representative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenBlock {
    pub hashables: OpenHashables,
    pub signature: Signature,
    pub work: u64,
}

impl OpenBlock {
    pub const SIZE: usize = 32 + 32 + 32 + 64 + 8;

    pub fn new(
        source: BlockHash,
        representative: Account,
        account: Account,
        private_key: &PrivateKey,
        _public_key: &PublicKey,
        work: u64,
    ) -> Self {
        let hashables = OpenHashables {
            source,
            representative,
            account,
        };
        let signature = sign_message(hashables.hash().as_bytes(), private_key);
        Self {
            hashables,
            signature,
            work,
        }
    }

    pub fn hash(&self) -> BlockHash {
        self.hashables.hash()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::SIZE);
        bytes.extend_from_slice(self.hashables.source.as_bytes());
        bytes.extend_from_slice(self.hashables.representative.as_bytes());
        bytes.extend_from_slice(self.hashables.account.as_bytes());
        bytes.extend_from_slice(self.signature.as_bytes());
        bytes.extend_from_slice(&self.work.to_be_bytes());
        bytes
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, BlockDecodeError> {
        if bytes.len() != Self::SIZE {
            return Err(BlockDecodeError::Truncated);
        }
        Ok(Self {
            hashables: OpenHashables {
                source: BlockHash::new(read_32(bytes, 0)),
                representative: Account::new(read_32(bytes, 32)),
                account: Account::new(read_32(bytes, 64)),
            },
            signature: Signature(read_64(bytes, 96)),
            work: read_u64(bytes, 160),
        })
    }

    fn to_json(&self) -> Value {
        json!({
            "type": "open",
            "source": self.hashables.source.to_string(),
            "representative": ember_crypto::encode_account(&self.hashables.representative),
            "account": ember_crypto::encode_account(&self.hashables.account),
            "work": work_hex(self.work),
            "signature": signature_hex(&self.signature),
        })
    }

    fn from_json(tree: &Value) -> Result<Self, BlockDecodeError> {
        Ok(Self {
            hashables: OpenHashables {
                source: hash_from_json(tree, "source")?,
                representative: account_from_json(tree, "representative")?,
                account: account_from_json(tree, "account")?,
            },
            signature: signature_from_json(tree, "signature")?,
            work: work_from_json(tree, "work")?,
        })
    }
}

// ── Change ───────────────────────────────────────────────────────────────

/// Hashable fields of a change block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeHashables {
    pub previous: BlockHash,
    pub representative: Account,
}

impl ChangeHashables {
    fn hash(&self) -> BlockHash {
        hash_parts(&[self.previous.as_bytes(), self.representative.as_bytes()])
    }
}

/// Re-delegates an account's weight to a new representative; balance is
/// unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeBlock {
    pub hashables: ChangeHashables,
    pub signature: Signature,
    pub work: u64,
}

impl ChangeBlock {
    pub const SIZE: usize = 32 + 32 + 64 + 8;

    pub fn new(
        previous: BlockHash,
        representative: Account,
        private_key: &PrivateKey,
        _public_key: &PublicKey,
        work: u64,
    ) -> Self {
        let hashables = ChangeHashables {
            previous,
            representative,
        };
        let signature = sign_message(hashables.hash().as_bytes(), private_key);
        Self {
            hashables,
            signature,
            work,
        }
    }

    pub fn hash(&self) -> BlockHash {
        self.hashables.hash()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::SIZE);
        bytes.extend_from_slice(self.hashables.previous.as_bytes());
        bytes.extend_from_slice(self.hashables.representative.as_bytes());
        bytes.extend_from_slice(self.signature.as_bytes());
        bytes.extend_from_slice(&self.work.to_be_bytes());
        bytes
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, BlockDecodeError> {
        if bytes.len() != Self::SIZE {
            return Err(BlockDecodeError::Truncated);
        }
        Ok(Self {
            hashables: ChangeHashables {
                previous: BlockHash::new(read_32(bytes, 0)),
                representative: Account::new(read_32(bytes, 32)),
            },
            signature: Signature(read_64(bytes, 64)),
            work: read_u64(bytes, 128),
        })
    }

    fn to_json(&self) -> Value {
        json!({
            "type": "change",
            "previous": self.hashables.previous.to_string(),
            "representative": ember_crypto::encode_account(&self.hashables.representative),
            "work": work_hex(self.work),
            "signature": signature_hex(&self.signature),
        })
    }

    fn from_json(tree: &Value) -> Result<Self, BlockDecodeError> {
        Ok(Self {
            hashables: ChangeHashables {
                previous: hash_from_json(tree, "previous")?,
                representative: account_from_json(tree, "representative")?,
            },
            signature: signature_from_json(tree, "signature")?,
            work: work_from_json(tree, "work")?,
        })
    }
}

// ── Block ────────────────────────────────────────────────────────────────

/// A block of any variant.
///
/// Equality compares all fields including signature and work; `hash()`
/// covers only the hashable fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Send(SendBlock),
    Receive(ReceiveBlock),
    Open(OpenBlock),
    Change(ChangeBlock),
}

impl Block {
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Send(_) => BlockType::Send,
            Self::Receive(_) => BlockType::Receive,
            Self::Open(_) => BlockType::Open,
            Self::Change(_) => BlockType::Change,
        }
    }

    /// Digest of the hashable fields only.
    pub fn hash(&self) -> BlockHash {
        match self {
            Self::Send(b) => b.hash(),
            Self::Receive(b) => b.hash(),
            Self::Open(b) => b.hash(),
            Self::Change(b) => b.hash(),
        }
    }

    /// Predecessor in the account's chain; zero for open blocks.
    pub fn previous(&self) -> BlockHash {
        match self {
            Self::Send(b) => b.hashables.previous,
            Self::Receive(b) => b.hashables.previous,
            Self::Open(_) => BlockHash::ZERO,
            Self::Change(b) => b.hashables.previous,
        }
    }

    /// The send block being received or opened against; zero otherwise.
    pub fn source(&self) -> BlockHash {
        match self {
            Self::Send(_) | Self::Change(_) => BlockHash::ZERO,
            Self::Receive(b) => b.hashables.source,
            Self::Open(b) => b.hashables.source,
        }
    }

    /// Fork-detection key: the previous hash, or the account number for an
    /// open block.
    pub fn root(&self) -> BlockHash {
        match self {
            Self::Open(b) => b.hashables.account.as_root(),
            other => other.previous(),
        }
    }

    /// The representative designated by this block; zero unless it sets one.
    pub fn representative(&self) -> Account {
        match self {
            Self::Open(b) => b.hashables.representative,
            Self::Change(b) => b.hashables.representative,
            Self::Send(_) | Self::Receive(_) => Account::ZERO,
        }
    }

    pub fn signature(&self) -> Signature {
        match self {
            Self::Send(b) => b.signature,
            Self::Receive(b) => b.signature,
            Self::Open(b) => b.signature,
            Self::Change(b) => b.signature,
        }
    }

    pub fn work(&self) -> u64 {
        match self {
            Self::Send(b) => b.work,
            Self::Receive(b) => b.work,
            Self::Open(b) => b.work,
            Self::Change(b) => b.work,
        }
    }

    /// Wire size of a block of `block_type`, excluding the type tag.
    pub const fn serialized_size(block_type: BlockType) -> usize {
        match block_type {
            BlockType::Send => SendBlock::SIZE,
            BlockType::Receive => ReceiveBlock::SIZE,
            BlockType::Open => OpenBlock::SIZE,
            BlockType::Change => ChangeBlock::SIZE,
        }
    }

    /// Fixed-width binary encoding, without a type tag.
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Self::Send(b) => b.serialize(),
            Self::Receive(b) => b.serialize(),
            Self::Open(b) => b.serialize(),
            Self::Change(b) => b.serialize(),
        }
    }

    /// Type tag followed by the fixed-width encoding.
    pub fn serialize_with_type(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + Self::serialized_size(self.block_type()));
        bytes.push(self.block_type().tag());
        bytes.extend_from_slice(&self.serialize());
        bytes
    }

    /// Decode a block of a known type from its exact-size encoding.
    pub fn deserialize(block_type: BlockType, bytes: &[u8]) -> Result<Self, BlockDecodeError> {
        Ok(match block_type {
            BlockType::Send => Self::Send(SendBlock::deserialize(bytes)?),
            BlockType::Receive => Self::Receive(ReceiveBlock::deserialize(bytes)?),
            BlockType::Open => Self::Open(OpenBlock::deserialize(bytes)?),
            BlockType::Change => Self::Change(ChangeBlock::deserialize(bytes)?),
        })
    }

    /// Decode a type-tagged block, returning it and the bytes consumed.
    pub fn deserialize_with_type(bytes: &[u8]) -> Result<(Self, usize), BlockDecodeError> {
        let (&tag, rest) = bytes.split_first().ok_or(BlockDecodeError::Truncated)?;
        let block_type = BlockType::from_tag(tag).ok_or(BlockDecodeError::UnknownType(tag))?;
        let size = Self::serialized_size(block_type);
        if rest.len() < size {
            return Err(BlockDecodeError::Truncated);
        }
        let block = Self::deserialize(block_type, &rest[..size])?;
        Ok((block, 1 + size))
    }

    /// JSON encoding: a `"type"`-tagged object with hex fields and
    /// account-address text for account fields.
    pub fn serialize_json(&self) -> String {
        let tree = match self {
            Self::Send(b) => b.to_json(),
            Self::Receive(b) => b.to_json(),
            Self::Open(b) => b.to_json(),
            Self::Change(b) => b.to_json(),
        };
        tree.to_string()
    }

    pub fn deserialize_json(text: &str) -> Result<Self, BlockDecodeError> {
        let tree: Value =
            serde_json::from_str(text).map_err(|e| BlockDecodeError::BadJson(e.to_string()))?;
        Self::from_json_value(&tree)
    }

    pub fn from_json_value(tree: &Value) -> Result<Self, BlockDecodeError> {
        let type_name = json_field(tree, "type")?;
        let block_type = BlockType::from_str_name(type_name)
            .ok_or_else(|| BlockDecodeError::UnknownTypeName(type_name.to_string()))?;
        Ok(match block_type {
            BlockType::Send => Self::Send(SendBlock::from_json(tree)?),
            BlockType::Receive => Self::Receive(ReceiveBlock::from_json(tree)?),
            BlockType::Open => Self::Open(OpenBlock::from_json(tree)?),
            BlockType::Change => Self::Change(ChangeBlock::from_json(tree)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_crypto::keypair_from_seed;
    use ember_types::KeyPair;

    fn key() -> KeyPair {
        keypair_from_seed(&[11u8; 32])
    }

    fn hash(byte: u8) -> BlockHash {
        BlockHash::new([byte; 32])
    }

    fn sample_send() -> Block {
        let kp = key();
        Block::Send(SendBlock::new(
            hash(1),
            Account::new([2u8; 32]),
            Amount::new(1337),
            &kp.private,
            &kp.public,
            0x1234_5678_9ABC_DEF0,
        ))
    }

    fn sample_receive() -> Block {
        let kp = key();
        Block::Receive(ReceiveBlock::new(hash(3), hash(4), &kp.private, &kp.public, 7))
    }

    fn sample_open() -> Block {
        let kp = key();
        Block::Open(OpenBlock::new(
            hash(5),
            Account::new([6u8; 32]),
            kp.account(),
            &kp.private,
            &kp.public,
            8,
        ))
    }

    fn sample_change() -> Block {
        let kp = key();
        Block::Change(ChangeBlock::new(
            hash(9),
            Account::new([10u8; 32]),
            &kp.private,
            &kp.public,
            11,
        ))
    }

    fn all_samples() -> Vec<Block> {
        vec![sample_send(), sample_receive(), sample_open(), sample_change()]
    }

    #[test]
    fn binary_roundtrip_every_variant() {
        for block in all_samples() {
            let bytes = block.serialize();
            assert_eq!(bytes.len(), Block::serialized_size(block.block_type()));
            let decoded = Block::deserialize(block.block_type(), &bytes).unwrap();
            assert_eq!(decoded, block);
        }
    }

    #[test]
    fn tagged_roundtrip_every_variant() {
        for block in all_samples() {
            let bytes = block.serialize_with_type();
            let (decoded, consumed) = Block::deserialize_with_type(&bytes).unwrap();
            assert_eq!(consumed, bytes.len());
            assert_eq!(decoded, block);
        }
    }

    #[test]
    fn json_roundtrip_every_variant() {
        for block in all_samples() {
            let text = block.serialize_json();
            let decoded = Block::deserialize_json(&text).unwrap();
            assert_eq!(decoded, block);
        }
    }

    #[test]
    fn wire_sizes() {
        assert_eq!(SendBlock::SIZE, 152);
        assert_eq!(ReceiveBlock::SIZE, 136);
        assert_eq!(OpenBlock::SIZE, 168);
        assert_eq!(ChangeBlock::SIZE, 136);
    }

    #[test]
    fn hash_ignores_signature_and_work() {
        let block = sample_send();
        let Block::Send(mut resigned) = block.clone() else {
            unreachable!()
        };
        resigned.signature = Signature([0xAB; 64]);
        resigned.work = 999;
        assert_eq!(Block::Send(resigned.clone()).hash(), block.hash());
        // but equality sees the difference
        assert_ne!(Block::Send(resigned), block);
    }

    #[test]
    fn hash_changes_with_any_hashable_field() {
        let kp = key();
        let base = SendBlock::new(
            hash(1),
            Account::new([2u8; 32]),
            Amount::new(1337),
            &kp.private,
            &kp.public,
            0,
        );
        let other_previous = SendBlock::new(
            hash(2),
            Account::new([2u8; 32]),
            Amount::new(1337),
            &kp.private,
            &kp.public,
            0,
        );
        let other_destination = SendBlock::new(
            hash(1),
            Account::new([3u8; 32]),
            Amount::new(1337),
            &kp.private,
            &kp.public,
            0,
        );
        let other_balance = SendBlock::new(
            hash(1),
            Account::new([2u8; 32]),
            Amount::new(1338),
            &kp.private,
            &kp.public,
            0,
        );
        assert_ne!(base.hash(), other_previous.hash());
        assert_ne!(base.hash(), other_destination.hash());
        assert_ne!(base.hash(), other_balance.hash());
    }

    #[test]
    fn root_is_previous_or_account() {
        assert_eq!(sample_send().root(), hash(1));
        assert_eq!(sample_receive().root(), hash(3));
        assert_eq!(sample_change().root(), hash(9));
        let open = sample_open();
        let Block::Open(inner) = &open else { unreachable!() };
        assert_eq!(open.root(), inner.hashables.account.as_root());
        assert!(open.previous().is_zero());
    }

    #[test]
    fn source_zero_unless_receiving() {
        assert!(sample_send().source().is_zero());
        assert!(sample_change().source().is_zero());
        assert_eq!(sample_receive().source(), hash(4));
        assert_eq!(sample_open().source(), hash(5));
    }

    #[test]
    fn representative_zero_unless_set() {
        assert!(sample_send().representative().is_zero());
        assert!(sample_receive().representative().is_zero());
        assert!(!sample_open().representative().is_zero());
        assert!(!sample_change().representative().is_zero());
    }

    #[test]
    fn deserialize_rejects_wrong_size() {
        let bytes = sample_send().serialize();
        assert_eq!(
            Block::deserialize(BlockType::Send, &bytes[..bytes.len() - 1]),
            Err(BlockDecodeError::Truncated)
        );
        let mut longer = bytes.clone();
        longer.push(0);
        assert_eq!(
            Block::deserialize(BlockType::Send, &longer),
            Err(BlockDecodeError::Truncated)
        );
    }

    #[test]
    fn deserialize_rejects_unknown_tag() {
        let mut bytes = sample_send().serialize_with_type();
        bytes[0] = 0;
        assert_eq!(
            Block::deserialize_with_type(&bytes),
            Err(BlockDecodeError::UnknownType(0))
        );
        bytes[0] = 99;
        assert_eq!(
            Block::deserialize_with_type(&bytes),
            Err(BlockDecodeError::UnknownType(99))
        );
    }

    #[test]
    fn json_rejects_malformed_input() {
        assert!(matches!(
            Block::deserialize_json("not json"),
            Err(BlockDecodeError::BadJson(_))
        ));
        assert_eq!(
            Block::deserialize_json(r#"{"type":"mint"}"#),
            Err(BlockDecodeError::UnknownTypeName("mint".to_string()))
        );
        assert_eq!(
            Block::deserialize_json(r#"{"type":"send"}"#),
            Err(BlockDecodeError::MissingField("previous"))
        );
        let text = sample_send().serialize_json();
        let broken = text.replace("send", "receive");
        assert!(Block::deserialize_json(&broken).is_err());
    }

    #[test]
    fn json_rejects_malformed_hex() {
        let text = sample_receive().serialize_json();
        let tree: serde_json::Value = serde_json::from_str(&text).unwrap();
        let mut broken = tree.clone();
        broken["source"] = serde_json::Value::String("zz".repeat(32));
        assert_eq!(
            Block::from_json_value(&broken),
            Err(BlockDecodeError::BadHex("source"))
        );
    }

    #[test]
    fn signatures_verify_against_canonical_hash() {
        let kp = key();
        for block in all_samples() {
            assert!(ember_crypto::verify_signature(
                block.hash().as_bytes(),
                &block.signature(),
                &kp.public
            ));
        }
    }
}

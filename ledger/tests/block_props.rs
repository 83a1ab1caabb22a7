//! Property tests for the block codecs over arbitrary field values.

use ember_ledger::block::{
    ChangeBlock, ChangeHashables, OpenBlock, OpenHashables, ReceiveBlock, ReceiveHashables,
    SendBlock, SendHashables,
};
use ember_ledger::Block;
use ember_types::{Account, Amount, BlockHash, Signature};
use proptest::prelude::*;

fn signature() -> impl Strategy<Value = Signature> {
    proptest::collection::vec(any::<u8>(), 64).prop_map(|bytes| {
        let arr: [u8; 64] = bytes.try_into().unwrap();
        Signature(arr)
    })
}

fn send_block() -> impl Strategy<Value = Block> {
    (
        any::<[u8; 32]>(),
        any::<[u8; 32]>(),
        any::<u128>(),
        signature(),
        any::<u64>(),
    )
        .prop_map(|(previous, destination, balance, signature, work)| {
            Block::Send(SendBlock {
                hashables: SendHashables {
                    previous: BlockHash::new(previous),
                    destination: Account::new(destination),
                    balance: Amount::new(balance),
                },
                signature,
                work,
            })
        })
}

fn receive_block() -> impl Strategy<Value = Block> {
    (any::<[u8; 32]>(), any::<[u8; 32]>(), signature(), any::<u64>()).prop_map(
        |(previous, source, signature, work)| {
            Block::Receive(ReceiveBlock {
                hashables: ReceiveHashables {
                    previous: BlockHash::new(previous),
                    source: BlockHash::new(source),
                },
                signature,
                work,
            })
        },
    )
}

fn open_block() -> impl Strategy<Value = Block> {
    (
        any::<[u8; 32]>(),
        any::<[u8; 32]>(),
        any::<[u8; 32]>(),
        signature(),
        any::<u64>(),
    )
        .prop_map(|(source, representative, account, signature, work)| {
            Block::Open(OpenBlock {
                hashables: OpenHashables {
                    source: BlockHash::new(source),
                    representative: Account::new(representative),
                    account: Account::new(account),
                },
                signature,
                work,
            })
        })
}

fn change_block() -> impl Strategy<Value = Block> {
    (any::<[u8; 32]>(), any::<[u8; 32]>(), signature(), any::<u64>()).prop_map(
        |(previous, representative, signature, work)| {
            Block::Change(ChangeBlock {
                hashables: ChangeHashables {
                    previous: BlockHash::new(previous),
                    representative: Account::new(representative),
                },
                signature,
                work,
            })
        },
    )
}

fn any_block() -> impl Strategy<Value = Block> {
    prop_oneof![send_block(), receive_block(), open_block(), change_block()]
}

proptest! {
    #[test]
    fn binary_roundtrip(block in any_block()) {
        let bytes = block.serialize();
        let decoded = Block::deserialize(block.block_type(), &bytes).unwrap();
        prop_assert_eq!(decoded, block);
    }

    #[test]
    fn tagged_roundtrip(block in any_block()) {
        let bytes = block.serialize_with_type();
        let (decoded, consumed) = Block::deserialize_with_type(&bytes).unwrap();
        prop_assert_eq!(consumed, bytes.len());
        prop_assert_eq!(decoded, block);
    }

    #[test]
    fn json_roundtrip(block in any_block()) {
        let text = block.serialize_json();
        let decoded = Block::deserialize_json(&text).unwrap();
        prop_assert_eq!(decoded, block);
    }

    #[test]
    fn hash_ignores_signature_and_work(block in any_block(), sig in signature(), work in any::<u64>()) {
        let original_hash = block.hash();
        let resigned = match block {
            Block::Send(mut b) => { b.signature = sig; b.work = work; Block::Send(b) }
            Block::Receive(mut b) => { b.signature = sig; b.work = work; Block::Receive(b) }
            Block::Open(mut b) => { b.signature = sig; b.work = work; Block::Open(b) }
            Block::Change(mut b) => { b.signature = sig; b.work = work; Block::Change(b) }
        };
        prop_assert_eq!(resigned.hash(), original_hash);
    }
}

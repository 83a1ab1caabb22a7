//! The set of all currently contested roots.
//!
//! Holds one election per root in an ordered index and runs the periodic
//! announcement sweep: a bounded batch of the lowest unconfirmed roots is
//! re-announced each interval, settling uncontested elections after the
//! configured number of rounds. The index mutex guards lookups only;
//! ballots and tallies run on the shared election outside the lock.

use crate::election::{ConfirmationAction, Election};
use crate::vote::{Vote, VoteCode};
use ember_ledger::{Block, Ledger};
use ember_store::{ReadTransaction, WriteTransaction};
use ember_types::{BlockHash, ConsensusParams};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A contested root and its election.
pub struct ConflictInfo {
    pub root: BlockHash,
    pub election: Arc<Election>,
    /// Announcement rounds this root has been through.
    pub announcements: u32,
}

/// Observer invoked for every unconfirmed election in a sweep, with the
/// block to request votes for. The network layer broadcasts from here.
pub type AnnouncementObserver = Box<dyn Fn(Arc<Block>) + Send + Sync>;

/// All live elections, keyed by root.
pub struct ActiveTransactions {
    roots: Mutex<BTreeMap<BlockHash, ConflictInfo>>,
    params: ConsensusParams,
    announcement_observer: AnnouncementObserver,
    stopped: AtomicBool,
}

impl ActiveTransactions {
    pub fn new(params: ConsensusParams, announcement_observer: AnnouncementObserver) -> Self {
        Self {
            roots: Mutex::new(BTreeMap::new()),
            params,
            announcement_observer,
            stopped: AtomicBool::new(false),
        }
    }

    /// Start an election for a block, with `action` called on confirmation
    /// (the confirmed block may differ from the one started with).
    ///
    /// Returns `true` if an election for this root already existed — the
    /// block then joins it as a competing candidate.
    pub fn start(&self, block: Arc<Block>, action: ConfirmationAction) -> bool {
        if self.stopped.load(Ordering::Acquire) {
            return true;
        }
        let root = block.root();
        let existing = {
            let mut roots = self.roots.lock().unwrap();
            match roots.get(&root) {
                Some(info) => Some(Arc::clone(&info.election)),
                None => {
                    let election = Arc::new(Election::new(
                        Arc::clone(&block),
                        self.params.clone(),
                        action,
                    ));
                    roots.insert(
                        root,
                        ConflictInfo {
                            root,
                            election,
                            announcements: 0,
                        },
                    );
                    None
                }
            }
        };
        match existing {
            Some(election) => {
                election.add_block(block);
                true
            }
            None => false,
        }
    }

    /// Whether the root of this block has a live election.
    pub fn active(&self, block: &Block) -> bool {
        self.roots.lock().unwrap().contains_key(&block.root())
    }

    /// Number of live elections.
    pub fn len(&self) -> usize {
        self.roots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.lock().unwrap().is_empty()
    }

    /// Validate an incoming vote and route it to its election.
    ///
    /// Replay protection is persistent: the highest sequence accepted per
    /// account is stored, and anything not strictly above it is a replay.
    /// Invalid and replayed votes are reported but never abort an election.
    pub fn vote(&self, ledger: &Ledger, txn: &mut dyn WriteTransaction, vote: &Vote) -> VoteCode {
        if !vote.validate() {
            return VoteCode::Invalid;
        }
        if vote.sequence <= txn.vote_sequence_get(&vote.account) {
            return VoteCode::Replay;
        }
        txn.vote_sequence_put(&vote.account, vote.sequence);

        let election = {
            let roots = self.roots.lock().unwrap();
            roots
                .get(&vote.block.root())
                .map(|info| Arc::clone(&info.election))
        };
        if let Some(election) = election {
            if let Err(error) = election.vote(ledger, txn, vote) {
                tracing::warn!(root = %vote.block.root(), %error, "vote application failed");
            }
        }
        VoteCode::Vote
    }

    /// One announcement sweep: walk up to `announcements_per_sweep` lowest
    /// roots, dropping confirmed elections, settling uncontested ones past
    /// the configured round count, and announcing the rest.
    pub fn announce_votes(&self) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        // Snapshot the batch under the lock, then work unlocked.
        let batch: Vec<(BlockHash, Arc<Election>, u32)> = {
            let mut roots = self.roots.lock().unwrap();
            roots
                .values_mut()
                .take(self.params.announcements_per_sweep)
                .map(|info| {
                    info.announcements += 1;
                    (info.root, Arc::clone(&info.election), info.announcements)
                })
                .collect()
        };

        let mut inactive = Vec::new();
        for (root, election, announcements) in batch {
            if election.confirmed() {
                inactive.push(root);
                continue;
            }
            if announcements >= self.params.settling_rounds && !election.contested() {
                // The common case: nobody contested for the whole settling
                // period, accept the sole candidate below quorum.
                election.confirm_cutoff();
                inactive.push(root);
                continue;
            }
            (self.announcement_observer)(election.last_winner());
        }

        if !inactive.is_empty() {
            let mut roots = self.roots.lock().unwrap();
            for root in inactive {
                roots.remove(&root);
            }
        }
    }

    /// Stop accepting new elections and drop the live ones.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.roots.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_ledger::genesis::{genesis_keypair, GENESIS_AMOUNT};
    use ember_ledger::{Genesis, ProcessResult, SendBlock};
    use ember_store::{MemoryStore, Store};
    use ember_types::{Account, Amount, NetworkId};
    use std::sync::atomic::AtomicUsize;

    fn ledger_with_genesis() -> (Ledger, Genesis) {
        let store = Arc::new(MemoryStore::new());
        let ledger = Ledger::new(store);
        let genesis = Genesis::new(NetworkId::Test);
        let mut txn = ledger.store().tx_begin_write();
        genesis.initialize(&mut *txn);
        txn.commit();
        (ledger, genesis)
    }

    fn active() -> (ActiveTransactions, Arc<AtomicUsize>) {
        let announcements = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&announcements);
        let active = ActiveTransactions::new(
            ConsensusParams::test(),
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        (active, announcements)
    }

    fn genesis_send(genesis: &Genesis, remaining: u128) -> Arc<Block> {
        let key = genesis_keypair(NetworkId::Test);
        Arc::new(Block::Send(SendBlock::new(
            genesis.hash(),
            Account::new([2u8; 32]),
            Amount::new(remaining),
            &key.private,
            &key.public,
            0,
        )))
    }

    fn noop_action() -> ConfirmationAction {
        Box::new(|_, _| {})
    }

    #[test]
    fn start_creates_one_election_per_root() {
        let (_ledger, genesis) = ledger_with_genesis();
        let (active, _) = active();

        let first = genesis_send(&genesis, 100);
        let fork = genesis_send(&genesis, 200);

        assert!(!active.start(Arc::clone(&first), noop_action()));
        assert!(active.start(Arc::clone(&fork), noop_action()));
        assert_eq!(active.len(), 1);
        assert!(active.active(&first));
        assert!(active.active(&fork));
    }

    #[test]
    fn vote_codes() {
        let (ledger, genesis) = ledger_with_genesis();
        let (active, _) = active();
        let genesis_key = genesis_keypair(NetworkId::Test);
        let send = genesis_send(&genesis, GENESIS_AMOUNT.raw() / 2);

        let mut txn = ledger.store().tx_begin_write();
        assert_eq!(ledger.process(&mut *txn, &send), ProcessResult::Progress);
        active.start(Arc::clone(&send), noop_action());

        let vote = Vote::new(genesis.account, &genesis_key.private, 5, Arc::clone(&send));
        assert_eq!(active.vote(&ledger, &mut *txn, &vote), VoteCode::Vote);

        // Same sequence again: replay. Lower sequence: replay.
        let same = Vote::new(genesis.account, &genesis_key.private, 5, Arc::clone(&send));
        assert_eq!(active.vote(&ledger, &mut *txn, &same), VoteCode::Replay);
        let lower = Vote::new(genesis.account, &genesis_key.private, 4, Arc::clone(&send));
        assert_eq!(active.vote(&ledger, &mut *txn, &lower), VoteCode::Replay);

        // Tampered signature: invalid.
        let mut forged = Vote::new(genesis.account, &genesis_key.private, 6, Arc::clone(&send));
        forged.signature.0[0] ^= 1;
        assert_eq!(active.vote(&ledger, &mut *txn, &forged), VoteCode::Invalid);

        // Forged votes never consume the account's sequence.
        let next = Vote::new(genesis.account, &genesis_key.private, 6, send);
        assert_eq!(active.vote(&ledger, &mut *txn, &next), VoteCode::Vote);
    }

    #[test]
    fn uncontested_election_settles_after_configured_rounds() {
        let (ledger, genesis) = ledger_with_genesis();
        let (active, announcements) = active();
        let confirmations = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&confirmations);

        let send = genesis_send(&genesis, 100);
        let mut txn = ledger.store().tx_begin_write();
        ledger.process(&mut *txn, &send);
        txn.commit();

        active.start(
            send,
            Box::new(move |_, changed| {
                assert!(!changed);
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let rounds = ConsensusParams::test().settling_rounds;
        for _ in 0..rounds {
            active.announce_votes();
        }

        assert_eq!(confirmations.load(Ordering::SeqCst), 1);
        assert_eq!(active.len(), 0);
        // The rounds before settling each announced the winner.
        assert_eq!(announcements.load(Ordering::SeqCst) as u32, rounds - 1);
    }

    #[test]
    fn contested_election_keeps_announcing_past_settling() {
        let (ledger, genesis) = ledger_with_genesis();
        let (active, announcements) = active();

        let first = genesis_send(&genesis, 100);
        let fork = genesis_send(&genesis, 200);
        let mut txn = ledger.store().tx_begin_write();
        ledger.process(&mut *txn, &first);
        txn.commit();

        active.start(Arc::clone(&first), noop_action());
        active.start(Arc::clone(&fork), noop_action());

        let rounds = ConsensusParams::test().settling_rounds + 3;
        for _ in 0..rounds {
            active.announce_votes();
        }

        // Never settles without quorum while contested.
        assert_eq!(active.len(), 1);
        assert_eq!(announcements.load(Ordering::SeqCst) as u32, rounds);
    }

    #[test]
    fn sweep_is_bounded() {
        let (_ledger, genesis) = ledger_with_genesis();
        let announcements = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&announcements);
        let params = ConsensusParams {
            announcements_per_sweep: 2,
            ..ConsensusParams::test()
        };
        let active = ActiveTransactions::new(
            params,
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        for remaining in 0..5u128 {
            active.start(genesis_send(&genesis, remaining), noop_action());
        }
        assert_eq!(active.len(), 1); // same root: one election, five candidates

        let other_root = Arc::new(Block::Send(SendBlock::new(
            BlockHash::new([0x33; 32]),
            Account::new([2u8; 32]),
            Amount::new(1),
            &genesis_keypair(NetworkId::Test).private,
            &genesis_keypair(NetworkId::Test).public,
            0,
        )));
        active.start(other_root, noop_action());
        assert_eq!(active.len(), 2);

        active.announce_votes();
        // Both roots contested or below settling: both announced, bounded
        // by the sweep size.
        assert!(announcements.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn stop_clears_elections() {
        let (_ledger, genesis) = ledger_with_genesis();
        let (active, _) = active();
        active.start(genesis_send(&genesis, 100), noop_action());
        active.stop();
        assert!(active.is_empty());
        assert!(active.start(genesis_send(&genesis, 50), noop_action()));
    }
}

//! Per-root election state machine.
//!
//! An election owns one contested root. Ballots arrive from any
//! vote-processing path; the tally's leader is kept applied to the ledger
//! (swapping out a provisional fork loser when the network disagrees), and
//! confirmation fires exactly once: either at quorum, or by settling time
//! when nobody contests.

use crate::error::ConsensusError;
use crate::vote::Vote;
use crate::votes::Votes;
use ember_ledger::{Block, Ledger, ProcessResult};
use ember_store::WriteTransaction;
use ember_types::ConsensusParams;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Invoked once on confirmation with the final block and whether it differs
/// from the originally proposed one.
pub type ConfirmationAction = Box<dyn Fn(Arc<Block>, bool) + Send + Sync>;

/// One live election for one contested root.
pub struct Election {
    root: ember_types::BlockHash,
    votes: Mutex<Votes>,
    /// The block currently applied to the ledger for this root.
    last_winner: Mutex<Arc<Block>>,
    /// Hash of the originally proposed block, for the changed flag.
    first_proposal: ember_types::BlockHash,
    /// One-shot confirmation latch: concurrent vote arrivals race to flip
    /// it, and exactly one runs the confirmation action.
    confirmed: AtomicBool,
    confirmation_action: ConfirmationAction,
    params: ConsensusParams,
}

impl Election {
    pub fn new(block: Arc<Block>, params: ConsensusParams, action: ConfirmationAction) -> Self {
        Self {
            root: block.root(),
            votes: Mutex::new(Votes::new(Arc::clone(&block))),
            first_proposal: block.hash(),
            last_winner: Mutex::new(block),
            confirmed: AtomicBool::new(false),
            confirmation_action: action,
            params,
        }
    }

    /// The root this election resolves.
    pub fn root(&self) -> ember_types::BlockHash {
        self.root
    }

    pub fn confirmed(&self) -> bool {
        self.confirmed.load(Ordering::Acquire)
    }

    /// The block currently considered the winner.
    pub fn last_winner(&self) -> Arc<Block> {
        Arc::clone(&self.last_winner.lock().unwrap())
    }

    /// Whether more than one candidate currently holds ballots.
    pub fn contested(&self) -> bool {
        self.votes.lock().unwrap().contested()
    }

    /// Record a validated ballot and re-evaluate quorum.
    ///
    /// Ballots are still accepted after confirmation but have no further
    /// effect.
    pub fn vote(
        &self,
        ledger: &Ledger,
        txn: &mut dyn WriteTransaction,
        vote: &Vote,
    ) -> Result<(), ConsensusError> {
        self.votes
            .lock()
            .unwrap()
            .vote(&vote.account, Arc::clone(&vote.block));
        self.confirm_if_quorum(ledger, txn)
    }

    /// Register a competing proposal (a fork block arriving from the
    /// network) as a zero-weight ballot.
    pub fn add_block(&self, block: Arc<Block>) {
        self.votes.lock().unwrap().add_candidate(block);
    }

    /// Confirmation path 1: uncontested quorum.
    ///
    /// Recomputes the tally; if the leader differs from the block last
    /// applied to the ledger, the loser is rolled back and the leader
    /// applied in its place. Confirms when the leader's weight reaches the
    /// quorum threshold.
    pub fn confirm_if_quorum(
        &self,
        ledger: &Ledger,
        txn: &mut dyn WriteTransaction,
    ) -> Result<(), ConsensusError> {
        if self.confirmed() {
            return Ok(());
        }
        let (weight, leader) = {
            let votes = self.votes.lock().unwrap();
            votes.winner(ledger, &*txn)
        };
        {
            let mut last_winner = self.last_winner.lock().unwrap();
            if leader.hash() != last_winner.hash() {
                tracing::debug!(
                    root = %self.root,
                    from = %last_winner.hash(),
                    to = %leader.hash(),
                    "election winner changed, swapping ledger state"
                );
                ledger.rollback(txn, &last_winner.hash())?;
                let result = ledger.process(txn, &leader);
                if !matches!(result, ProcessResult::Progress | ProcessResult::Old) {
                    return Err(ConsensusError::WinnerRejected(result));
                }
                *last_winner = Arc::clone(&leader);
            }
        }
        let supply = ledger.supply(&*txn);
        if weight.raw() >= self.params.quorum_threshold(supply.raw()) {
            self.confirm_once();
        }
        Ok(())
    }

    /// Confirmation path 2: settling time. Called by the announcement sweep
    /// once an uncontested election has survived the configured number of
    /// rounds.
    pub fn confirm_cutoff(&self) {
        self.confirm_once();
    }

    /// Flip the one-shot latch and run the confirmation action exactly
    /// once, no matter how many threads observe quorum simultaneously.
    fn confirm_once(&self) {
        if self
            .confirmed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let winner = self.last_winner();
            let changed = winner.hash() != self.first_proposal;
            tracing::debug!(root = %self.root, winner = %winner.hash(), changed, "election confirmed");
            (self.confirmation_action)(winner, changed);
        }
    }
}

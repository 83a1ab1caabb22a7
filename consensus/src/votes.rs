//! Per-root ballot container and weight tally.

use ember_ledger::{Block, Ledger};
use ember_store::ReadTransaction;
use ember_types::{Account, Amount, BlockHash};
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of recording one ballot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TallyResult {
    /// First ballot from this account.
    Vote,
    /// The account switched to a different block.
    Changed,
    /// The account re-affirmed its previous choice.
    Confirm,
}

/// All ballots received for one root: the latest block each account has
/// voted for, plus every candidate in first-seen order (ties in the tally
/// break toward the earlier candidate).
#[derive(Clone, Debug)]
pub struct Votes {
    /// Root block hash of the contested chain position.
    pub id: BlockHash,
    /// Latest ballot per voting account.
    pub rep_votes: HashMap<Account, Arc<Block>>,
    candidates: Vec<Arc<Block>>,
}

impl Votes {
    /// Start a ballot set from the first proposed block, recorded as a
    /// zero-weight ballot by its proposer.
    pub fn new(block: Arc<Block>) -> Self {
        let mut votes = Self {
            id: block.root(),
            rep_votes: HashMap::new(),
            candidates: Vec::new(),
        };
        votes.vote(&proposer_ballot(&block), block);
        votes
    }

    /// Record a ballot; the newest ballot per account wins.
    pub fn vote(&mut self, voter: &Account, block: Arc<Block>) -> TallyResult {
        self.track(&block);
        match self.rep_votes.get_mut(voter) {
            None => {
                self.rep_votes.insert(*voter, block);
                TallyResult::Vote
            }
            Some(existing) if existing.hash() == block.hash() => TallyResult::Confirm,
            Some(existing) => {
                *existing = block;
                TallyResult::Changed
            }
        }
    }

    /// Register a competing block without a representative ballot (a
    /// proposer pushing its own fork).
    pub fn add_candidate(&mut self, block: Arc<Block>) -> TallyResult {
        self.vote(&proposer_ballot(&block), block)
    }

    /// Whether more than one block is currently voted for.
    pub fn contested(&self) -> bool {
        let mut first: Option<BlockHash> = None;
        for block in self.rep_votes.values() {
            match first {
                None => first = Some(block.hash()),
                Some(hash) if hash != block.hash() => return true,
                Some(_) => {}
            }
        }
        false
    }

    /// Rank candidates by summed representative weight, descending.
    /// First-seen candidates win ties.
    pub fn tally<T: ReadTransaction + ?Sized>(
        &self,
        ledger: &Ledger,
        txn: &T,
    ) -> Vec<(Amount, Arc<Block>)> {
        let mut weights: HashMap<BlockHash, Amount> = HashMap::new();
        for (account, block) in &self.rep_votes {
            let weight = ledger.weight(txn, account);
            let entry = weights.entry(block.hash()).or_insert(Amount::ZERO);
            *entry = entry.saturating_add(weight);
        }
        let mut ranking: Vec<(Amount, Arc<Block>)> = self
            .candidates
            .iter()
            .map(|candidate| {
                let weight = weights
                    .get(&candidate.hash())
                    .copied()
                    .unwrap_or(Amount::ZERO);
                (weight, Arc::clone(candidate))
            })
            .collect();
        // stable: preserves first-seen order among equal weights
        ranking.sort_by(|a, b| b.0.cmp(&a.0));
        ranking
    }

    /// The highest-weight candidate and its weight.
    pub fn winner<T: ReadTransaction + ?Sized>(
        &self,
        ledger: &Ledger,
        txn: &T,
    ) -> (Amount, Arc<Block>) {
        self.tally(ledger, txn)
            .into_iter()
            .next()
            .expect("ballot set always holds at least the proposed block")
    }

    fn track(&mut self, block: &Arc<Block>) {
        if !self
            .candidates
            .iter()
            .any(|candidate| candidate.hash() == block.hash())
        {
            self.candidates.push(Arc::clone(block));
        }
    }
}

/// Zero-weight ballot identity for a proposed block: derived from the block
/// hash, so distinct forks never displace each other's proposal ballot and
/// no real representative can be impersonated (weight lookups find nothing
/// delegated to it).
fn proposer_ballot(block: &Block) -> Account {
    Account::new(*block.hash().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_crypto::keypair_from_seed;
    use ember_ledger::SendBlock;

    fn block(previous_byte: u8, balance: u128) -> Arc<Block> {
        let kp = keypair_from_seed(&[9u8; 32]);
        Arc::new(Block::Send(SendBlock::new(
            BlockHash::new([previous_byte; 32]),
            Account::new([2u8; 32]),
            Amount::new(balance),
            &kp.private,
            &kp.public,
            0,
        )))
    }

    fn rep(byte: u8) -> Account {
        Account::new([byte; 32])
    }

    #[test]
    fn new_votes_holds_proposed_block() {
        let proposed = block(1, 10);
        let votes = Votes::new(Arc::clone(&proposed));
        assert_eq!(votes.id, proposed.root());
        assert_eq!(votes.rep_votes.len(), 1);
        assert!(!votes.contested());
    }

    #[test]
    fn first_vote_then_confirm_then_change() {
        let proposed = block(1, 10);
        let fork = block(1, 20);
        let mut votes = Votes::new(Arc::clone(&proposed));

        assert_eq!(votes.vote(&rep(3), Arc::clone(&proposed)), TallyResult::Vote);
        assert_eq!(
            votes.vote(&rep(3), Arc::clone(&proposed)),
            TallyResult::Confirm
        );
        assert_eq!(votes.vote(&rep(3), Arc::clone(&fork)), TallyResult::Changed);
        assert!(votes.contested());
    }

    #[test]
    fn competing_candidate_keeps_both_proposals() {
        let proposed = block(1, 10);
        let fork = block(1, 20);
        let mut votes = Votes::new(Arc::clone(&proposed));
        votes.add_candidate(Arc::clone(&fork));

        assert_eq!(votes.rep_votes.len(), 2);
        assert!(votes.contested());
    }

    fn ledger_with_weights(weights: &[(Account, u128)]) -> Ledger {
        use ember_store::{MemoryStore, Store, WriteTransaction as _};
        let ledger = Ledger::new(Arc::new(MemoryStore::new()));
        let mut txn = ledger.store().tx_begin_write();
        for (representative, weight) in weights {
            txn.representation_put(representative, Amount::new(*weight));
        }
        txn.commit();
        ledger
    }

    #[test]
    fn tally_ranks_by_summed_weight() {
        let ledger = ledger_with_weights(&[
            (rep(0xA), 30),
            (rep(0xB), 20),
            (rep(0xC), 10),
            (rep(0xD), 40),
        ]);
        let x = block(1, 10);
        let y = block(1, 20);

        let mut votes = Votes::new(Arc::clone(&x));
        votes.vote(&rep(0xA), Arc::clone(&x));
        votes.vote(&rep(0xB), Arc::clone(&x));
        votes.vote(&rep(0xC), Arc::clone(&x));
        votes.vote(&rep(0xD), Arc::clone(&y));

        let txn = ledger.store().tx_begin_read();
        let ranking = votes.tally(&ledger, &*txn);
        assert_eq!(ranking.len(), 2);
        // X carries 30 + 20 + 10 = 60, Y carries 40.
        assert_eq!(ranking[0].0, Amount::new(60));
        assert_eq!(ranking[0].1.hash(), x.hash());
        assert_eq!(ranking[1].0, Amount::new(40));
        assert_eq!(ranking[1].1.hash(), y.hash());

        let (weight, winner) = votes.winner(&ledger, &*txn);
        assert_eq!(weight, Amount::new(60));
        assert_eq!(winner.hash(), x.hash());
    }

    #[test]
    fn tally_tie_breaks_toward_first_seen() {
        let ledger = ledger_with_weights(&[(rep(0xA), 30), (rep(0xB), 30)]);
        let x = block(1, 10);
        let y = block(1, 20);

        let mut votes = Votes::new(Arc::clone(&x));
        votes.vote(&rep(0xA), Arc::clone(&x));
        votes.vote(&rep(0xB), Arc::clone(&y));

        let txn = ledger.store().tx_begin_read();
        let (weight, winner) = votes.winner(&ledger, &*txn);
        assert_eq!(weight, Amount::new(30));
        assert_eq!(winner.hash(), x.hash());
    }

    #[test]
    fn changed_vote_moves_weight_between_candidates() {
        let ledger = ledger_with_weights(&[(rep(0xA), 25)]);
        let x = block(1, 10);
        let y = block(1, 20);

        let mut votes = Votes::new(Arc::clone(&x));
        votes.vote(&rep(0xA), Arc::clone(&x));
        votes.vote(&rep(0xA), Arc::clone(&y));

        let txn = ledger.store().tx_begin_read();
        let ranking = votes.tally(&ledger, &*txn);
        assert_eq!(ranking[0].0, Amount::new(25));
        assert_eq!(ranking[0].1.hash(), y.hash());
        assert_eq!(ranking[1].0, Amount::ZERO);
    }
}

//! Single-consumer block processing queue.
//!
//! Processing blocks is a potentially long store operation; this queue
//! isolates ledger mutation from network and RPC threads. Producers only
//! enqueue; one consumer drains the FIFO and funnels every block through
//! `Ledger::process`, so there is never more than one writer by
//! construction.

use ember_consensus::ActiveTransactions;
use ember_ledger::{Block, Ledger, ProcessResult};
use ember_store::WriteTransaction;
use ember_types::BlockHash;
use ember_work::WorkThresholds;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

/// Receives blocks whose dependency is not yet known — the unresolved-block
/// cache retries them once the missing block arrives.
pub trait GapSink: Send + Sync {
    /// `block`'s previous is unknown; `dependency` is the missing hash.
    fn gap_previous(&self, dependency: BlockHash, block: Arc<Block>);
    /// `block`'s source is unknown; `dependency` is the missing hash.
    fn gap_source(&self, dependency: BlockHash, block: Arc<Block>);
}

/// A queued block with its processing mode.
#[derive(Clone)]
pub struct BlockProcessorItem {
    pub block: Arc<Block>,
    /// Apply as authoritative: a conflicting chain occupant is rolled back
    /// first. Used when the caller (a completed election) already chose
    /// the correct head.
    pub force: bool,
}

impl BlockProcessorItem {
    pub fn new(block: Arc<Block>) -> Self {
        Self {
            block,
            force: false,
        }
    }

    pub fn forced(block: Arc<Block>) -> Self {
        Self { block, force: true }
    }
}

struct State {
    blocks: VecDeque<BlockProcessorItem>,
    stopped: bool,
    idle: bool,
}

/// Serializes all block admission through one consumer.
pub struct BlockProcessor {
    ledger: Arc<Ledger>,
    active: Arc<ActiveTransactions>,
    thresholds: WorkThresholds,
    gap_sink: Option<Arc<dyn GapSink>>,
    state: Mutex<State>,
    condition: Condvar,
}

impl BlockProcessor {
    pub fn new(
        ledger: Arc<Ledger>,
        active: Arc<ActiveTransactions>,
        thresholds: WorkThresholds,
    ) -> Self {
        Self {
            ledger,
            active,
            thresholds,
            gap_sink: None,
            state: Mutex::new(State {
                blocks: VecDeque::new(),
                stopped: false,
                idle: true,
            }),
            condition: Condvar::new(),
        }
    }

    /// Attach the unresolved-block cache.
    pub fn with_gap_sink(mut self, sink: Arc<dyn GapSink>) -> Self {
        self.gap_sink = Some(sink);
        self
    }

    /// Enqueue a block for processing. Blocks failing work validation are
    /// dropped here, before they cost a queue slot.
    pub fn add(&self, item: BlockProcessorItem) {
        if !self.thresholds.validate(&item.block.root(), item.block.work()) {
            tracing::debug!(hash = %item.block.hash(), "dropping block with insufficient work");
            return;
        }
        let mut state = self.state.lock().unwrap();
        if state.stopped {
            return;
        }
        state.blocks.push_back(item);
        self.condition.notify_all();
    }

    /// Signal the consumer to finish the in-flight batch and exit.
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap();
        state.stopped = true;
        self.condition.notify_all();
    }

    /// Block the caller until the queue is drained and the consumer idle.
    /// Used for shutdown and test synchronization.
    pub fn flush(&self) {
        let mut state = self.state.lock().unwrap();
        while !state.stopped && (!state.blocks.is_empty() || !state.idle) {
            state = self.condition.wait(state).unwrap();
        }
    }

    /// The consumer loop. Run on a dedicated thread; returns when
    /// [`stop`](Self::stop) is called.
    pub fn process_blocks(&self) {
        let mut state = self.state.lock().unwrap();
        while !state.stopped {
            if state.blocks.is_empty() {
                state.idle = true;
                self.condition.notify_all();
                state = self.condition.wait(state).unwrap();
            } else {
                state.idle = false;
                let batch = std::mem::take(&mut state.blocks);
                drop(state);
                self.process_receive_many(batch);
                state = self.state.lock().unwrap();
            }
        }
        state.idle = true;
        drop(state);
        self.condition.notify_all();
    }

    /// Drain one batch under a single write transaction.
    pub fn process_receive_many(&self, batch: impl IntoIterator<Item = BlockProcessorItem>) {
        let mut txn = self.ledger.store().tx_begin_write();
        for item in batch {
            self.process_receive_one(&mut *txn, &item);
        }
        txn.commit();
    }

    /// Admit one block and route the outcome: progress starts or feeds an
    /// election, forks start one on the competing block, gaps go to the
    /// unresolved-block cache.
    pub fn process_receive_one(
        &self,
        txn: &mut dyn WriteTransaction,
        item: &BlockProcessorItem,
    ) -> ProcessResult {
        let block = &item.block;
        if item.force {
            if let Some(existing) = self.ledger.forked_block(&*txn, block) {
                if existing.hash() != block.hash() {
                    tracing::debug!(
                        root = %block.root(),
                        losing = %existing.hash(),
                        winning = %block.hash(),
                        "forced replacement of chain occupant"
                    );
                    if let Err(error) = self.ledger.rollback(txn, &existing.hash()) {
                        tracing::warn!(%error, "rollback of losing fork failed");
                    }
                }
            }
        }

        let result = self.ledger.process(txn, block);
        match result {
            ProcessResult::Progress => {
                self.active.start(Arc::clone(block), Box::new(|_, _| {}));
            }
            ProcessResult::Fork => {
                // Both siblings become candidates for this root.
                self.active.start(Arc::clone(block), Box::new(|_, _| {}));
                tracing::warn!(root = %block.root(), hash = %block.hash(), "fork, election started");
            }
            ProcessResult::GapPrevious => {
                if let Some(sink) = &self.gap_sink {
                    sink.gap_previous(block.previous(), Arc::clone(block));
                }
            }
            ProcessResult::GapSource => {
                if let Some(sink) = &self.gap_sink {
                    sink.gap_source(block.source(), Arc::clone(block));
                }
            }
            ProcessResult::Old
            | ProcessResult::BadSignature
            | ProcessResult::NegativeSpend
            | ProcessResult::Unreceivable
            | ProcessResult::NotReceiveFromSend
            | ProcessResult::AccountMismatch
            | ProcessResult::OpenedBurnAccount => {}
        }
        result
    }
}

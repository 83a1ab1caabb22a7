//! Ember node plumbing.
//!
//! The block processor serializes all externally-arriving blocks into
//! ledger admission on a single consumer, the announcer drives periodic
//! election announcement sweeps, and the shutdown controller coordinates
//! stopping both.

pub mod announcer;
pub mod block_processor;
pub mod shutdown;

pub use announcer::spawn_announcer;
pub use block_processor::{BlockProcessor, BlockProcessorItem, GapSink};
pub use shutdown::ShutdownController;

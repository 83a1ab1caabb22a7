use ember_ledger::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("ledger rejected fork winner: {0:?}")]
    WinnerRejected(ember_ledger::ProcessResult),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

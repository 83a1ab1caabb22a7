use ember_types::BlockHash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("block {0} not found")]
    BlockNotFound(BlockHash),

    #[error("account record missing for block {0}")]
    AccountNotFound(BlockHash),

    #[error("store corruption: {0}")]
    Corruption(&'static str),
}

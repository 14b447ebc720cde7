//! Ledger access errors
//!
//! Errors raised by the external ledger boundary (chain reads and canonical
//! contract calls). Decode failures live with the codec because they never
//! escape the scanner; settlement failures live with the engine.

use crate::models::block::BlockId;
use thiserror::Error;

/// Errors from the external ledger
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Ledger unreachable, timed out, or otherwise failed in transport.
    /// Never retried by the core.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unknown block: {0}")]
    UnknownBlock(BlockId),

    /// A canonical read or write would break a debt invariant
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Contract refused the call (e.g. malformed arguments)
    #[error("Call rejected: {0}")]
    Rejected(String),
}

impl LedgerError {
    pub fn is_transport(&self) -> bool {
        matches!(self, LedgerError::Transport(_) | LedgerError::UnknownBlock(_))
    }
}

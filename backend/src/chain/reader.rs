//! Chain Reader
//!
//! Read-only view of the external ledger: where the head is, what a block
//! contains, and how to turn a call payload into a typed call. No retries
//! happen here; transport failures go straight back to the caller.

use crate::chain::codec::{decode_call, DecodeError};
use crate::error::LedgerError;
use crate::models::block::{Block, BlockId};
use crate::models::call::LedgerCall;
use async_trait::async_trait;

#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Identifier of the current head block
    async fn head(&self) -> Result<BlockId, LedgerError>;

    /// Fetch a block by identifier
    async fn block(&self, id: BlockId) -> Result<Block, LedgerError>;

    /// Decode a call payload targeting the debt contract
    fn decode(&self, payload: &[u8]) -> Result<LedgerCall, DecodeError> {
        decode_call(payload)
    }
}

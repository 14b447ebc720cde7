//! Incremental call index
//!
//! Caches every decoded contract call together with the head it was built
//! from. A refresh walks back from the new head only until it meets the
//! cached head, so appended blocks cost one fetch each. If the cached head
//! is no longer an ancestor of the current head the index is rebuilt from
//! scratch. Results are always identical to a fresh scan.

use crate::chain::reader::ChainReader;
use crate::error::LedgerError;
use crate::models::address::Address;
use crate::models::block::BlockId;
use crate::models::call::CallRecord;
use crate::scanner::{block_calls, ChainWalker};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct LogIndex {
    head: Option<BlockId>,
    /// All decoded calls, newest first
    calls: Vec<CallRecord>,
}

impl LogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the index up to the reader's current head
    pub async fn refresh<R: ChainReader + ?Sized>(
        &mut self,
        reader: &R,
        contract: &Address,
    ) -> Result<&[CallRecord], LedgerError> {
        let head = reader.head().await?;
        if self.head == Some(head) {
            return Ok(&self.calls);
        }

        let mut walker = ChainWalker::new(reader, head);
        if let Some(cached) = self.head {
            walker = walker.stop_at(cached);
        }

        let mut fresh = Vec::new();
        let mut blocks = 0usize;
        while let Some(block) = walker.next_block().await? {
            blocks += 1;
            fresh.extend(block_calls(reader, &block, contract, None));
        }

        let new_calls = fresh.len();
        if walker.reached_stop() {
            fresh.append(&mut self.calls);
        } else if self.head.is_some() {
            debug!(%head, "cached head is not an ancestor, index rebuilt");
        }
        debug!(%head, blocks, new_calls, "index refreshed");

        self.calls = fresh;
        self.head = Some(head);
        Ok(&self.calls)
    }
}

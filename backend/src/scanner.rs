//! Log Scanner
//!
//! Walks the chain backward from the head, decoding every transaction sent
//! to the debt contract. Output order is traversal order: newest block
//! first, and within a block the block's own transaction order. That is
//! **reverse chronological**; callers that need oldest-first must reverse.
//!
//! # Failure Semantics
//!
//! - A transport error fetching any block aborts the scan
//! - A payload that fails to decode drops that one transaction and the
//!   scan continues
//!
//! # Termination
//!
//! The walk stops once the next parent pointer is [`BlockId::GENESIS`].
//! The sentinel itself is never fetched.

use crate::chain::reader::ChainReader;
use crate::error::LedgerError;
use crate::models::address::Address;
use crate::models::block::{Block, BlockId};
use crate::models::call::{CallRecord, FunctionName};
use std::sync::Arc;
use tracing::{debug, trace};

/// Backward cursor over the chain
pub struct ChainWalker<'a, R: ChainReader + ?Sized> {
    reader: &'a R,
    next: Option<BlockId>,
    stop_at: Option<BlockId>,
    reached_stop: bool,
}

impl<'a, R: ChainReader + ?Sized> ChainWalker<'a, R> {
    /// Start at `from` and walk to genesis
    pub fn new(reader: &'a R, from: BlockId) -> Self {
        Self {
            reader,
            next: Some(from),
            stop_at: None,
            reached_stop: false,
        }
    }

    /// Stop before fetching `block` (already processed by the caller)
    pub fn stop_at(mut self, block: BlockId) -> Self {
        self.stop_at = Some(block);
        self
    }

    /// Fetch the next older block, or `None` once the walk is done
    pub async fn next_block(&mut self) -> Result<Option<Block>, LedgerError> {
        let id = match self.next {
            Some(id) if Some(id) == self.stop_at => {
                self.reached_stop = true;
                self.next = None;
                return Ok(None);
            }
            Some(id) if !id.is_genesis() => id,
            _ => {
                self.next = None;
                return Ok(None);
            }
        };

        let block = self.reader.block(id).await?;
        self.next = Some(block.parent);
        Ok(Some(block))
    }

    /// Whether the walk ended at the `stop_at` block rather than genesis
    pub fn reached_stop(&self) -> bool {
        self.reached_stop
    }
}

/// Decode the calls in one block that target `contract`
pub fn block_calls<R: ChainReader + ?Sized>(
    reader: &R,
    block: &Block,
    contract: &Address,
    function: Option<FunctionName>,
) -> Vec<CallRecord> {
    let mut calls = Vec::new();
    for (position, tx) in block.transactions.iter().enumerate() {
        if !tx.targets(contract) {
            continue;
        }
        let call = match reader.decode(&tx.payload) {
            Ok(call) => call,
            Err(error) => {
                trace!(block = %block.id, position, %error, "skipping undecodable transaction");
                continue;
            }
        };
        if function.map_or(true, |f| f == call.function()) {
            calls.push(CallRecord {
                call,
                sender: tx.sender.clone(),
                timestamp: block.timestamp,
                block: block.id,
            });
        }
    }
    calls
}

/// Replays the contract's call history from the chain
pub struct LogScanner<R: ChainReader + ?Sized> {
    reader: Arc<R>,
}

impl<R: ChainReader + ?Sized> Clone for LogScanner<R> {
    fn clone(&self) -> Self {
        Self {
            reader: Arc::clone(&self.reader),
        }
    }
}

impl<R: ChainReader + ?Sized> LogScanner<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self { reader }
    }

    /// Every call to `contract`, optionally filtered by function, newest first
    pub async fn scan(
        &self,
        contract: &Address,
        function: Option<FunctionName>,
    ) -> Result<Vec<CallRecord>, LedgerError> {
        let head = self.reader.head().await?;
        let (calls, blocks) = self.scan_range(contract, function, head, None).await?;
        debug!(
            %contract,
            function = function.map(|f| f.as_str()),
            blocks,
            calls = calls.len(),
            "scan complete"
        );
        Ok(calls)
    }

    /// Scan from `from` back to genesis or until `stop_at`
    ///
    /// Returns the calls found and the number of blocks visited.
    pub async fn scan_range(
        &self,
        contract: &Address,
        function: Option<FunctionName>,
        from: BlockId,
        stop_at: Option<BlockId>,
    ) -> Result<(Vec<CallRecord>, usize), LedgerError> {
        let mut walker = ChainWalker::new(self.reader.as_ref(), from);
        if let Some(stop) = stop_at {
            walker = walker.stop_at(stop);
        }

        let mut calls = Vec::new();
        let mut blocks = 0usize;
        while let Some(block) = walker.next_block().await? {
            blocks += 1;
            calls.extend(block_calls(self.reader.as_ref(), &block, contract, function));
        }
        Ok((calls, blocks))
    }

    /// Most recent call matching `predicate`
    ///
    /// Stops walking as soon as a match is found.
    pub async fn find_latest<P>(
        &self,
        contract: &Address,
        predicate: P,
    ) -> Result<Option<CallRecord>, LedgerError>
    where
        P: Fn(&CallRecord) -> bool,
    {
        let head = self.reader.head().await?;
        let mut walker = ChainWalker::new(self.reader.as_ref(), head);
        while let Some(block) = walker.next_block().await? {
            let found = block_calls(self.reader.as_ref(), &block, contract, None)
                .into_iter()
                .find(|record| predicate(record));
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }
}

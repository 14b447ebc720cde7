//! Block and transaction model
//!
//! The chain is an immutable, singly-linked sequence of blocks. Each block
//! points at its parent; the first real block points at [`BlockId::GENESIS`],
//! the all-zero sentinel that terminates every backward walk.

use crate::models::address::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte block identifier (hash)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub [u8; 32]);

impl BlockId {
    /// All-zero sentinel: parent of the genesis block
    pub const GENESIS: BlockId = BlockId([0u8; 32]);

    /// True for the all-zero sentinel
    pub fn is_genesis(&self) -> bool {
        *self == Self::GENESIS
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps traces readable
        write!(f, "BlockId(0x{}..)", hex::encode(&self.0[..4]))
    }
}

/// A transaction as recorded on chain
///
/// `to` is `None` for contract creation; the scanner skips those.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: Address,
    pub to: Option<Address>,
    pub payload: Vec<u8>,
}

impl Transaction {
    pub fn new(sender: Address, to: Option<Address>, payload: Vec<u8>) -> Self {
        Self { sender, to, payload }
    }

    /// Whether this transaction targets `contract`
    pub fn targets(&self, contract: &Address) -> bool {
        self.to.as_ref() == Some(contract)
    }
}

/// An immutable block produced by the external ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub parent: BlockId,
    pub height: u64,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
}

//! In-memory ledger
//!
//! A self-contained chain plus debt contract, used as the test double for
//! every component and as the backend of the CLI. Every successful write
//! mines one block holding one encoded transaction, so the log and the
//! canonical mapping always agree.
//!
//! # Example
//!
//! ```rust
//! use iou_ledger_core::chain::{ChainReader, DebtLedger, MemoryLedger};
//! use iou_ledger_core::{Address, ChainConfig};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let ledger = MemoryLedger::new(ChainConfig::default());
//! let a: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
//! let b: Address = "0x00000000000000000000000000000000000000bb".parse().unwrap();
//!
//! ledger.record_debt(&a, &b, 10).await.unwrap();
//! assert_eq!(ledger.lookup(&a, &b).await.unwrap(), 10);
//! assert_eq!(ledger.height().unwrap(), 1);
//! # });
//! ```

use crate::chain::codec::encode_call;
use crate::chain::contract::DebtLedger;
use crate::chain::reader::ChainReader;
use crate::config::ChainConfig;
use crate::error::LedgerError;
use crate::models::address::Address;
use crate::models::block::{Block, BlockId, Transaction};
use crate::models::call::LedgerCall;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct ChainState {
    blocks: Vec<Block>,
    index: HashMap<BlockId, usize>,
    debts: HashMap<(Address, Address), u32>,
    next_timestamp: u64,
    offline: bool,
    /// Writes allowed before injected failures start
    write_budget: Option<usize>,
}

impl ChainState {
    fn head(&self) -> &Block {
        // Genesis is pushed on construction, so there is always a head
        &self.blocks[self.blocks.len() - 1]
    }

    fn mine(&mut self, transactions: Vec<Transaction>, block_interval: u64) -> BlockId {
        let (parent, height) = match self.blocks.last() {
            Some(head) => (head.id, head.height + 1),
            None => (BlockId::GENESIS, 0),
        };
        let timestamp = self.next_timestamp;
        self.next_timestamp += block_interval;

        let mut hasher = Sha256::new();
        hasher.update(parent.0);
        hasher.update(height.to_be_bytes());
        hasher.update(timestamp.to_be_bytes());
        for tx in &transactions {
            hasher.update(tx.sender.to_bytes());
            hasher.update(&tx.payload);
        }
        let id = BlockId(hasher.finalize().into());

        self.index.insert(id, self.blocks.len());
        self.blocks.push(Block {
            id,
            parent,
            height,
            timestamp,
            transactions,
        });
        id
    }

    fn check_online(&self) -> Result<(), LedgerError> {
        if self.offline {
            return Err(LedgerError::Transport("ledger unreachable".to_string()));
        }
        Ok(())
    }

    fn spend_write(&mut self) -> Result<(), LedgerError> {
        self.check_online()?;
        match self.write_budget.as_mut() {
            Some(0) => Err(LedgerError::Transport(
                "write timed out before inclusion".to_string(),
            )),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Chain and debt contract held entirely in memory
#[derive(Debug)]
pub struct MemoryLedger {
    config: ChainConfig,
    state: Mutex<ChainState>,
}

impl MemoryLedger {
    /// Create a ledger holding only the genesis block
    pub fn new(config: ChainConfig) -> Self {
        let mut state = ChainState {
            blocks: Vec::new(),
            index: HashMap::new(),
            debts: HashMap::new(),
            next_timestamp: config.genesis_timestamp,
            offline: false,
            write_budget: None,
        };
        state.mine(Vec::new(), config.block_interval_secs);

        Self {
            config,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, ChainState>, LedgerError> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Transport("ledger state lock poisoned".to_string()))
    }

    /// Height of the head block (genesis is 0)
    pub fn height(&self) -> Result<u64, LedgerError> {
        Ok(self.state()?.head().height)
    }

    /// Append a block with arbitrary transactions
    ///
    /// Bypasses the contract entirely: used to put foreign or malformed
    /// transactions on chain.
    pub fn push_block(&self, transactions: Vec<Transaction>) -> Result<BlockId, LedgerError> {
        let mut state = self.state()?;
        Ok(state.mine(transactions, self.config.block_interval_secs))
    }

    /// Make every call fail with a transport error
    pub fn set_offline(&self, offline: bool) -> Result<(), LedgerError> {
        self.state()?.offline = offline;
        Ok(())
    }

    /// Let `writes` more writes succeed, then fail every write
    pub fn fail_writes_after(&self, writes: usize) -> Result<(), LedgerError> {
        self.state()?.write_budget = Some(writes);
        Ok(())
    }

    /// Remove all injected faults
    pub fn clear_faults(&self) -> Result<(), LedgerError> {
        let mut state = self.state()?;
        state.offline = false;
        state.write_budget = None;
        Ok(())
    }

    /// Every positive edge, sorted by (debtor, creditor)
    pub fn debts(&self) -> Result<BTreeMap<(Address, Address), u32>, LedgerError> {
        Ok(self
            .state()?
            .debts
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .map(|(edge, amount)| (edge.clone(), *amount))
            .collect())
    }

    /// Outgoing minus incoming debt for `account`
    pub fn net_position(&self, account: &Address) -> Result<i64, LedgerError> {
        let state = self.state()?;
        let mut net = 0i64;
        for ((debtor, creditor), amount) in &state.debts {
            if debtor == account {
                net += i64::from(*amount);
            }
            if creditor == account {
                net -= i64::from(*amount);
            }
        }
        Ok(net)
    }

    /// Sum of all outstanding debt
    pub fn gross_volume(&self) -> Result<u64, LedgerError> {
        Ok(self
            .state()?
            .debts
            .values()
            .map(|amount| u64::from(*amount))
            .sum())
    }

    fn contract_tx(&self, caller: &Address, call: &LedgerCall) -> Transaction {
        Transaction::new(
            caller.clone(),
            Some(self.config.contract_address.clone()),
            encode_call(call),
        )
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

#[async_trait]
impl ChainReader for MemoryLedger {
    async fn head(&self) -> Result<BlockId, LedgerError> {
        let state = self.state()?;
        state.check_online()?;
        Ok(state.head().id)
    }

    async fn block(&self, id: BlockId) -> Result<Block, LedgerError> {
        let state = self.state()?;
        state.check_online()?;
        state
            .index
            .get(&id)
            .map(|idx| state.blocks[*idx].clone())
            .ok_or(LedgerError::UnknownBlock(id))
    }
}

#[async_trait]
impl DebtLedger for MemoryLedger {
    fn contract_address(&self) -> &Address {
        &self.config.contract_address
    }

    async fn lookup(&self, debtor: &Address, creditor: &Address) -> Result<u32, LedgerError> {
        let state = self.state()?;
        state.check_online()?;
        Ok(state
            .debts
            .get(&(debtor.clone(), creditor.clone()))
            .copied()
            .unwrap_or(0))
    }

    async fn record_debt(
        &self,
        caller: &Address,
        creditor: &Address,
        amount: u32,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        if caller == creditor {
            return Err(LedgerError::Rejected(format!(
                "{} cannot owe itself",
                caller
            )));
        }

        let tx = self.contract_tx(
            caller,
            &LedgerCall::RecordDebt {
                creditor: creditor.clone(),
                amount,
            },
        );
        let mut state = self.state()?;
        let key = (caller.clone(), creditor.clone());
        let current = state.debts.get(&key).copied().unwrap_or(0);
        let updated = current.checked_add(amount).ok_or_else(|| {
            LedgerError::Rejected(format!("debt {} -> {} overflows uint32", caller, creditor))
        })?;

        state.spend_write()?;
        state.debts.insert(key, updated);
        state.mine(vec![tx], self.config.block_interval_secs);
        Ok(())
    }

    async fn reduce_debt(
        &self,
        caller: &Address,
        debtor: &Address,
        amount: u32,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }

        let tx = self.contract_tx(
            caller,
            &LedgerCall::ReduceDebt {
                debtor: debtor.clone(),
                amount,
            },
        );
        let mut state = self.state()?;
        let key = (debtor.clone(), caller.clone());
        let current = state.debts.get(&key).copied().unwrap_or(0);
        let updated = current.checked_sub(amount).ok_or_else(|| {
            LedgerError::InvariantViolation(format!(
                "reducing {} -> {} by {} would go below zero (current {})",
                debtor, caller, amount, current
            ))
        })?;

        state.spend_write()?;
        state.debts.insert(key, updated);
        state.mine(vec![tx], self.config.block_interval_secs);
        Ok(())
    }
}

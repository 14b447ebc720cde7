//! Canonical debt contract
//!
//! The contract owns the authoritative pairwise mapping `amount(debtor,
//! creditor)`. Each call is atomic on its own; sequences of calls are not.

use crate::chain::reader::ChainReader;
use crate::error::LedgerError;
use crate::models::address::Address;
use async_trait::async_trait;

#[async_trait]
pub trait DebtLedger: Send + Sync {
    /// Address the contract is deployed at
    fn contract_address(&self) -> &Address;

    /// Current `amount(debtor, creditor)`; 0 when nothing is recorded
    async fn lookup(&self, debtor: &Address, creditor: &Address) -> Result<u32, LedgerError>;

    /// `amount(caller, creditor) += amount`, sent as `caller`
    async fn record_debt(
        &self,
        caller: &Address,
        creditor: &Address,
        amount: u32,
    ) -> Result<(), LedgerError>;

    /// `amount(debtor, caller) -= amount`, sent as `caller` (the creditor)
    async fn reduce_debt(
        &self,
        caller: &Address,
        debtor: &Address,
        amount: u32,
    ) -> Result<(), LedgerError>;
}

/// Explicit client handle passed into every component
pub trait LedgerClient: ChainReader + DebtLedger {}

impl<T: ChainReader + DebtLedger + ?Sized> LedgerClient for T {}

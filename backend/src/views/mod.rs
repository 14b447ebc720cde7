//! Derived-View Builder
//!
//! Answers every query about the ledger by replaying the contract's call
//! log. No off-log state is authoritative: the participant set and last
//! activity come from the scan, balances from canonical point lookups over
//! the scanned participant set.
//!
//! # Queries
//!
//! - [`DerivedViews::get_users`]: everyone who ever sent or was named first
//!   in a `record_debt` call
//! - [`DerivedViews::get_total_owed`]: sum of what an account owes every
//!   other known user
//! - [`DerivedViews::get_last_active`]: timestamp of the newest call the
//!   account sent or appears in
//!
//! With [`ViewConfig::use_index`] set, scans go through a [`LogIndex`]
//! instead of re-walking the chain.

pub mod index;

pub use index::LogIndex;

use crate::chain::contract::LedgerClient;
use crate::config::ViewConfig;
use crate::error::LedgerError;
use crate::models::address::Address;
use crate::models::call::{CallRecord, FunctionName};
use crate::scanner::LogScanner;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct DerivedViews<C: LedgerClient + ?Sized> {
    client: Arc<C>,
    scanner: LogScanner<C>,
    index: Option<Mutex<LogIndex>>,
}

impl<C: LedgerClient + ?Sized> DerivedViews<C> {
    pub fn new(client: Arc<C>, config: &ViewConfig) -> Self {
        let index = config.use_index.then(|| Mutex::new(LogIndex::new()));
        Self {
            scanner: LogScanner::new(Arc::clone(&client)),
            client,
            index,
        }
    }

    fn contract(&self) -> &Address {
        self.client.contract_address()
    }

    /// Calls to the contract, newest first
    pub async fn calls(
        &self,
        function: Option<FunctionName>,
    ) -> Result<Vec<CallRecord>, LedgerError> {
        match &self.index {
            Some(index) => {
                let mut index = index.lock().await;
                let calls = index.refresh(self.client.as_ref(), self.contract()).await?;
                Ok(calls
                    .iter()
                    .filter(|record| function.map_or(true, |f| f == record.function()))
                    .cloned()
                    .collect())
            }
            None => self.scanner.scan(self.contract(), function).await,
        }
    }

    /// Every account that ever issued or received a recorded debt
    pub async fn get_users(&self) -> Result<BTreeSet<Address>, LedgerError> {
        let calls = self.calls(Some(FunctionName::RecordDebt)).await?;
        let mut users = BTreeSet::new();
        for record in calls {
            users.insert(record.sender.clone());
            if let Some(counterparty) = record.call.first_address() {
                users.insert(counterparty.clone());
            }
        }
        Ok(users)
    }

    /// What `account` owes all other known users combined
    ///
    /// Zero for an account that owes nobody or has never appeared.
    pub async fn get_total_owed(&self, account: &Address) -> Result<u64, LedgerError> {
        let users = self.get_users().await?;
        let mut total = 0u64;
        for other in users.iter().filter(|user| *user != account) {
            total += u64::from(self.client.lookup(account, other).await?);
        }
        Ok(total)
    }

    /// Timestamp of the most recent call involving `account`
    pub async fn get_last_active(&self, account: &Address) -> Result<Option<u64>, LedgerError> {
        let latest = match &self.index {
            Some(_) => self
                .calls(None)
                .await?
                .into_iter()
                .find(|record| record.involves(account)),
            None => {
                self.scanner
                    .find_latest(self.contract(), |record| record.involves(account))
                    .await?
            }
        };
        Ok(latest.map(|record| record.timestamp))
    }
}

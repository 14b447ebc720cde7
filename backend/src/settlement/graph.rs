//! Debt Graph Oracle
//!
//! Neighbor relation over the *current* canonical debt state: `b` is a
//! neighbor of `a` iff `amount(a, b) > 0`. Candidates come from the
//! participant set replayed from the log; each call issues one canonical
//! lookup per candidate.

use crate::chain::contract::LedgerClient;
use crate::error::LedgerError;
use crate::models::address::Address;
use crate::settlement::path::NeighborSource;
use crate::views::DerivedViews;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

pub struct DebtGraph<C: LedgerClient + ?Sized> {
    client: Arc<C>,
    users: BTreeSet<Address>,
}

impl<C: LedgerClient + ?Sized> DebtGraph<C> {
    /// Snapshot the participant set and build the oracle over it
    ///
    /// The participant set only grows through `record_debt`, which a
    /// settlement never issues before its probe finishes.
    pub async fn load(client: Arc<C>, views: &DerivedViews<C>) -> Result<Self, LedgerError> {
        let users = views.get_users().await?;
        Ok(Self { client, users })
    }

    /// Current canonical amount on one edge
    pub async fn edge(&self, debtor: &Address, creditor: &Address) -> Result<u32, LedgerError> {
        self.client.lookup(debtor, creditor).await
    }

    /// Canonical amounts along every consecutive pair of `path`
    pub async fn path_amounts(&self, path: &[Address]) -> Result<Vec<u32>, LedgerError> {
        let mut amounts = Vec::with_capacity(path.len().saturating_sub(1));
        for pair in path.windows(2) {
            amounts.push(self.edge(&pair[0], &pair[1]).await?);
        }
        Ok(amounts)
    }
}

#[async_trait]
impl<C: LedgerClient + ?Sized> NeighborSource for DebtGraph<C> {
    async fn neighbors(&self, account: &Address) -> Result<Vec<Address>, LedgerError> {
        let mut neighbors = Vec::new();
        for candidate in self.users.iter().filter(|user| *user != account) {
            if self.client.lookup(account, candidate).await? > 0 {
                neighbors.push(candidate.clone());
            }
        }
        trace!(%account, count = neighbors.len(), "neighbors");
        Ok(neighbors)
    }
}

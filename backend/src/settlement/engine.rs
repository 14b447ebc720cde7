//! Settlement Engine
//!
//! Issues a new IOU, netting it against any debt cycle it would close.
//!
//! # Algorithm
//!
//! 1. Probe: search for a shortest path of positive debts from the
//!    creditor back to the debtor. If one exists, adding `debtor → creditor`
//!    closes a cycle.
//! 2. No cycle: record the whole amount.
//! 3. Cycle `[creditor, n1, .., debtor]`: let `min` be the smallest edge on
//!    the path *and* the new amount. Reduce every path edge by `min`, then
//!    record `amount - min` if positive.
//!
//! Every edge of the cycle (including the proposed one) shrinks by the same
//! bottleneck, so each participant's net position is unchanged while gross
//! outstanding debt falls.
//!
//! # Failure Semantics
//!
//! Each canonical call is atomic; the sequence is not. A failure after the
//! first write returns [`SettlementError::Incomplete`] with the plan at its
//! resumption point; [`SettlementEngine::resume`] continues it. Nothing is
//! rolled back.
//!
//! Concurrent settlements over overlapping accounts are not serialized. An
//! edge that shrank under a concurrent caller is caught by the re-read before
//! each reduction and aborts the settlement with
//! [`SettlementError::InvariantViolation`].

use crate::chain::contract::LedgerClient;
use crate::config::EngineConfig;
use crate::error::LedgerError;
use crate::models::address::Address;
use crate::models::event::{EventLog, SettlementEvent};
use crate::settlement::graph::DebtGraph;
use crate::settlement::path::PathFinder;
use crate::settlement::plan::{SettlementPlan, SettlementStep};
use crate::views::DerivedViews;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Errors that can occur while issuing an IOU
#[derive(Debug, Error, PartialEq)]
pub enum SettlementError {
    #[error("{0} cannot issue an IOU to itself")]
    SelfDebt(Address),

    #[error("Settlement already complete")]
    AlreadyComplete,

    /// Failure before any canonical write; the ledger is unchanged
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// An edge would go below zero; no further writes were issued
    #[error("Invariant violation: {reason}")]
    InvariantViolation {
        reason: String,
        plan: Box<SettlementPlan>,
    },

    /// Failure after at least one write; `plan` holds the resumption point
    #[error("Settlement interrupted: {source}")]
    Incomplete {
        plan: Box<SettlementPlan>,
        source: LedgerError,
    },
}

impl SettlementError {
    /// Plan at the point the settlement stopped, if any write could have happened
    pub fn plan(&self) -> Option<&SettlementPlan> {
        match self {
            SettlementError::InvariantViolation { plan, .. }
            | SettlementError::Incomplete { plan, .. } => Some(plan.as_ref()),
            _ => None,
        }
    }
}

/// What an IOU settlement did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub id: Uuid,

    /// Cycle path `[creditor, .., debtor]` if one was netted
    pub path: Option<Vec<Address>>,

    /// Amount removed from every cycle edge
    pub netted: u32,

    /// New debt recorded for `debtor → creditor`
    pub residual: u32,

    /// Canonical writes issued
    pub writes: usize,

    pub events: EventLog,
}

impl From<SettlementPlan> for SettlementOutcome {
    fn from(plan: SettlementPlan) -> Self {
        Self {
            id: plan.id,
            path: (!plan.path.is_empty()).then_some(plan.path),
            netted: plan.netted,
            residual: plan.residual,
            writes: plan.writes_done,
            events: plan.events,
        }
    }
}

pub struct SettlementEngine<C: LedgerClient + ?Sized> {
    client: Arc<C>,
    views: DerivedViews<C>,
    finder: PathFinder,
}

impl<C: LedgerClient + ?Sized> SettlementEngine<C> {
    pub fn new(client: Arc<C>, config: &EngineConfig) -> Self {
        Self {
            views: DerivedViews::new(Arc::clone(&client), &config.views),
            finder: PathFinder::new(config.search.clone()),
            client,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Derived views over the same ledger
    pub fn views(&self) -> &DerivedViews<C> {
        &self.views
    }

    /// `debtor` now owes `creditor` an additional `amount`
    pub async fn issue_iou(
        &self,
        debtor: &Address,
        creditor: &Address,
        amount: u32,
    ) -> Result<SettlementOutcome, SettlementError> {
        let plan = self.plan(debtor, creditor, amount).await?;
        self.execute(plan).await
    }

    /// Continue a settlement from its resumption point
    pub async fn resume(
        &self,
        plan: SettlementPlan,
    ) -> Result<SettlementOutcome, SettlementError> {
        if plan.is_complete() {
            return Err(SettlementError::AlreadyComplete);
        }
        info!(id = %plan.id, writes_done = plan.writes_done, "resuming settlement");
        self.execute(plan).await
    }

    /// Probe for a cycle and size the netting; issues no writes
    pub async fn plan(
        &self,
        debtor: &Address,
        creditor: &Address,
        amount: u32,
    ) -> Result<SettlementPlan, SettlementError> {
        if debtor == creditor {
            return Err(SettlementError::SelfDebt(debtor.clone()));
        }
        if amount == 0 {
            return Ok(SettlementPlan::direct(debtor.clone(), creditor.clone(), 0));
        }

        let graph = DebtGraph::load(Arc::clone(&self.client), &self.views).await?;
        let path = match self.finder.find_path(creditor, debtor, &graph).await? {
            Some(path) => path,
            None => {
                info!(%debtor, %creditor, amount, "no cycle, recording debt");
                return Ok(SettlementPlan::direct(debtor.clone(), creditor.clone(), amount));
            }
        };

        let amounts = graph.path_amounts(&path).await?;
        let min = amounts.iter().copied().fold(amount, u32::min);
        info!(
            %debtor,
            %creditor,
            amount,
            cycle_len = path.len(),
            min,
            "cycle detected"
        );
        Ok(SettlementPlan::netting(
            debtor.clone(),
            creditor.clone(),
            amount,
            path,
            min,
        ))
    }

    async fn execute(&self, plan: SettlementPlan) -> Result<SettlementOutcome, SettlementError> {
        let span = info_span!(
            "settlement",
            id = %plan.id,
            debtor = %plan.debtor,
            creditor = %plan.creditor
        );
        self.run(plan).instrument(span).await
    }

    async fn run(&self, mut plan: SettlementPlan) -> Result<SettlementOutcome, SettlementError> {
        while let Some(step) = plan.next_step() {
            if let Err(error) = self.apply(&step).await {
                return Err(interrupted(plan, error));
            }
            plan.advance();
        }

        plan.events.record(SettlementEvent::Completed {
            netted: plan.netted,
            residual: plan.residual,
        });
        info!(
            netted = plan.netted,
            residual = plan.residual,
            writes = plan.writes_done,
            "settlement complete"
        );
        Ok(plan.into())
    }

    async fn apply(&self, step: &SettlementStep) -> Result<(), LedgerError> {
        match step {
            SettlementStep::Reduce { edge, amount } => {
                let current = self.client.lookup(&edge.debtor, &edge.creditor).await?;
                if current < *amount {
                    return Err(LedgerError::InvariantViolation(format!(
                        "edge {} -> {} holds {}, cannot reduce by {}",
                        edge.debtor, edge.creditor, current, amount
                    )));
                }
                self.client
                    .reduce_debt(&edge.creditor, &edge.debtor, *amount)
                    .await
            }
            SettlementStep::Record {
                debtor,
                creditor,
                amount,
            } => self.client.record_debt(debtor, creditor, *amount).await,
        }
    }
}

fn interrupted(plan: SettlementPlan, error: LedgerError) -> SettlementError {
    match error {
        LedgerError::InvariantViolation(reason) => {
            warn!(%reason, writes_done = plan.writes_done, "settlement aborted");
            SettlementError::InvariantViolation {
                reason,
                plan: Box::new(plan),
            }
        }
        source if plan.started() => {
            warn!(error = %source, writes_done = plan.writes_done, "settlement interrupted");
            SettlementError::Incomplete {
                plan: Box::new(plan),
                source,
            }
        }
        source => SettlementError::Ledger(source),
    }
}

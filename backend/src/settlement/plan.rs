//! Settlement state machine
//!
//! Issuing an IOU is a sequence of canonical writes that is not atomic as a
//! whole. The plan makes the resumption point explicit so an interrupted
//! settlement can be detected, persisted, and resumed or reported.
//!
//! ```text
//! Netting { remaining } --(last edge reduced)--> Recording --(residual recorded)--> Complete
//!        \--------------(residual == 0)-------------------------------------------/
//! ```

use crate::models::address::Address;
use crate::models::event::{EventLog, SettlementEvent};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// A directed debt edge: `debtor` owes `creditor`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub debtor: Address,
    pub creditor: Address,
}

/// Where the settlement currently is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SettlementPhase {
    /// Edges of the cycle still to be reduced, in path order
    Netting { remaining: VecDeque<Edge> },

    /// Cycle fully netted (or none found); residual still to record
    Recording,

    Complete,
}

/// Next canonical write a plan needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementStep {
    /// `reduce_debt` sent by `edge.creditor` against `edge.debtor`
    Reduce { edge: Edge, amount: u32 },

    /// `record_debt` sent by `debtor`
    Record {
        debtor: Address,
        creditor: Address,
        amount: u32,
    },
}

/// A settlement in progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    pub id: Uuid,
    pub debtor: Address,
    pub creditor: Address,

    /// Newly proposed debt
    pub amount: u32,

    /// Cycle path `[creditor, .., debtor]`, empty when none was found
    pub path: Vec<Address>,

    /// Bottleneck netted off every cycle edge
    pub netted: u32,

    /// `amount - netted`, recorded as new debt
    pub residual: u32,

    pub phase: SettlementPhase,

    /// Canonical writes completed so far
    pub writes_done: usize,

    pub events: EventLog,
}

impl SettlementPlan {
    /// Plan with no cycle: record the whole amount
    pub fn direct(debtor: Address, creditor: Address, amount: u32) -> Self {
        let mut plan = Self {
            id: Uuid::new_v4(),
            debtor,
            creditor,
            amount,
            path: Vec::new(),
            netted: 0,
            residual: amount,
            phase: SettlementPhase::Recording,
            writes_done: 0,
            events: EventLog::default(),
        };
        plan.events.record(SettlementEvent::NoCycle);
        plan.skip_empty_phases();
        plan
    }

    /// Plan netting `min` off every edge of `path`, then recording the rest
    ///
    /// `min` must not exceed `amount`.
    pub fn netting(
        debtor: Address,
        creditor: Address,
        amount: u32,
        path: Vec<Address>,
        min: u32,
    ) -> Self {
        let remaining = path
            .windows(2)
            .map(|pair| Edge {
                debtor: pair[0].clone(),
                creditor: pair[1].clone(),
            })
            .collect();

        let mut plan = Self {
            id: Uuid::new_v4(),
            debtor,
            creditor,
            amount,
            path: path.clone(),
            netted: min,
            residual: amount.saturating_sub(min),
            phase: SettlementPhase::Netting { remaining },
            writes_done: 0,
            events: EventLog::default(),
        };
        plan.events.record(SettlementEvent::CycleDetected { path, min });
        plan.skip_empty_phases();
        plan
    }

    /// Drop phases that need no write
    fn skip_empty_phases(&mut self) {
        loop {
            let next = match &self.phase {
                SettlementPhase::Netting { remaining } if remaining.is_empty() || self.netted == 0 => {
                    SettlementPhase::Recording
                }
                SettlementPhase::Recording if self.residual == 0 => SettlementPhase::Complete,
                _ => return,
            };
            self.phase = next;
        }
    }

    /// The write to perform next, if any
    pub fn next_step(&self) -> Option<SettlementStep> {
        match &self.phase {
            SettlementPhase::Netting { remaining } => {
                remaining.front().map(|edge| SettlementStep::Reduce {
                    edge: edge.clone(),
                    amount: self.netted,
                })
            }
            SettlementPhase::Recording => Some(SettlementStep::Record {
                debtor: self.debtor.clone(),
                creditor: self.creditor.clone(),
                amount: self.residual,
            }),
            SettlementPhase::Complete => None,
        }
    }

    /// Mark the current step as written and move on
    pub fn advance(&mut self) {
        let netted = self.netted;
        let event = match &mut self.phase {
            SettlementPhase::Netting { remaining } => {
                remaining
                    .pop_front()
                    .map(|edge| SettlementEvent::EdgeReduced {
                        debtor: edge.debtor,
                        creditor: edge.creditor,
                        amount: netted,
                    })
            }
            SettlementPhase::Recording => Some(SettlementEvent::DebtRecorded {
                debtor: self.debtor.clone(),
                creditor: self.creditor.clone(),
                amount: self.residual,
            }),
            SettlementPhase::Complete => None,
        };

        if let Some(event) = event {
            if matches!(event, SettlementEvent::DebtRecorded { .. }) {
                self.phase = SettlementPhase::Complete;
            }
            self.writes_done += 1;
            self.events.record(event);
        }
        self.skip_empty_phases();
    }

    pub fn is_complete(&self) -> bool {
        self.phase == SettlementPhase::Complete
    }

    /// Whether any canonical write has already happened
    pub fn started(&self) -> bool {
        self.writes_done > 0
    }

    /// Edges not yet reduced
    pub fn remaining_edges(&self) -> Vec<Edge> {
        match &self.phase {
            SettlementPhase::Netting { remaining } => remaining.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

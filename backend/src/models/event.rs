//! Settlement event log
//!
//! Each settlement records what it decided (cycle or none) and every
//! canonical write it issued, so an outcome or a checkpoint shows exactly
//! how far it got.
//!
//! ```rust
//! use iou_ledger_core::models::{EventLog, SettlementEvent};
//!
//! let mut log = EventLog::default();
//! log.record(SettlementEvent::NoCycle);
//! assert_eq!(log.events().len(), 1);
//! assert_eq!(log.of_type("NoCycle").count(), 1);
//! ```

use crate::models::address::Address;
use serde::{Deserialize, Serialize};

/// Something a settlement did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettlementEvent {
    /// Cycle probe found no path from creditor back to debtor
    NoCycle,

    /// Cycle probe found a path; `min` is the bottleneck including the new debt
    CycleDetected { path: Vec<Address>, min: u32 },

    /// Canonical `reduce_debt` applied to one edge of the cycle
    EdgeReduced {
        debtor: Address,
        creditor: Address,
        amount: u32,
    },

    /// Canonical `record_debt` appended for the residual
    DebtRecorded {
        debtor: Address,
        creditor: Address,
        amount: u32,
    },

    /// All steps finished
    Completed { netted: u32, residual: u32 },
}

impl SettlementEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            SettlementEvent::NoCycle => "NoCycle",
            SettlementEvent::CycleDetected { .. } => "CycleDetected",
            SettlementEvent::EdgeReduced { .. } => "EdgeReduced",
            SettlementEvent::DebtRecorded { .. } => "DebtRecorded",
            SettlementEvent::Completed { .. } => "Completed",
        }
    }

    /// Accounts the event touches
    pub fn accounts(&self) -> Vec<&Address> {
        match self {
            SettlementEvent::CycleDetected { path, .. } => path.iter().collect(),
            SettlementEvent::EdgeReduced {
                debtor, creditor, ..
            }
            | SettlementEvent::DebtRecorded {
                debtor, creditor, ..
            } => vec![debtor, creditor],
            SettlementEvent::NoCycle | SettlementEvent::Completed { .. } => Vec::new(),
        }
    }
}

/// What a settlement did, in the order it did it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog(Vec<SettlementEvent>);

impl EventLog {
    pub fn record(&mut self, event: SettlementEvent) {
        self.0.push(event);
    }

    pub fn events(&self) -> &[SettlementEvent] {
        &self.0
    }

    pub fn of_type<'a>(
        &'a self,
        event_type: &'a str,
    ) -> impl Iterator<Item = &'a SettlementEvent> {
        self.0.iter().filter(move |e| e.event_type() == event_type)
    }

    /// Events naming `account` as a party or path member
    pub fn touching<'a>(
        &'a self,
        account: &'a Address,
    ) -> impl Iterator<Item = &'a SettlementEvent> {
        self.0.iter().filter(move |e| e.accounts().contains(&account))
    }
}

//! Settlement Module
//!
//! Cycle-canceling settlement of new IOUs:
//! - **graph**: Debt Graph Oracle (positive-debt neighbors from canonical state)
//! - **path**: Cycle Finder (breadth-first shortest path)
//! - **plan**: explicit state machine for the multi-write sequence
//! - **checkpoint**: persisted resumption points
//! - **engine**: orchestrates probe, netting and recording
//!
//! # Critical Invariants
//!
//! 1. **Net Preservation**: netting never changes any account's outgoing
//!    minus incoming debt
//! 2. **Non-negativity**: no edge is ever reduced below zero
//! 3. **Exactness**: all amounts are unsigned integers

pub mod checkpoint;
pub mod engine;
pub mod graph;
pub mod path;
pub mod plan;

pub use checkpoint::{CheckpointError, SettlementCheckpoint};
pub use engine::{SettlementEngine, SettlementError, SettlementOutcome};
pub use graph::DebtGraph;
pub use path::{NeighborSource, PathFinder};
pub use plan::{Edge, SettlementPhase, SettlementPlan, SettlementStep};

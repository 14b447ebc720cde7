//! IOU Ledger Core
//!
//! Pairwise IOU ledger whose only ground truth is an append-only chain of
//! contract calls, with cycle-canceling settlement of new debts.
//!
//! # Architecture
//!
//! - **chain**: Chain Reader, debt contract interface, payload codec, in-memory ledger
//! - **scanner**: Log Scanner (backward chain walk, reverse chronological)
//! - **views**: Derived-View Builder (users, total owed, last active)
//! - **settlement**: Debt Graph Oracle, Cycle Finder, Settlement Engine
//! - **models**: Domain types (Address, Block, CallRecord, events)
//!
//! # Critical Invariants
//!
//! 1. All amounts are exact unsigned integers; no edge goes below zero
//! 2. Addresses compare case-insensitively (normalized to lower case)
//! 3. Every query is derived by replaying the log; no off-log state is authoritative
//!
//! # Example
//!
//! ```rust
//! use iou_ledger_core::{Address, EngineConfig, MemoryLedger, SettlementEngine};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let ledger = Arc::new(MemoryLedger::default());
//! let engine = SettlementEngine::new(ledger, &EngineConfig::default());
//!
//! let a: Address = "0x000000000000000000000000000000000000000a".parse().unwrap();
//! let b: Address = "0x000000000000000000000000000000000000000b".parse().unwrap();
//!
//! engine.issue_iou(&a, &b, 10).await.unwrap();
//! // b owing a 4 closes the cycle b -> a -> b: netted, nothing recorded
//! let outcome = engine.issue_iou(&b, &a, 4).await.unwrap();
//! assert_eq!(outcome.netted, 4);
//! assert_eq!(outcome.residual, 0);
//! assert_eq!(engine.views().get_total_owed(&a).await.unwrap(), 6);
//! # });
//! ```

// Module declarations
pub mod chain;
pub mod config;
pub mod error;
pub mod models;
pub mod scanner;
pub mod settlement;
pub mod views;

// Re-exports for convenience
pub use chain::{ChainReader, DebtLedger, DecodeError, LedgerClient, MemoryLedger};
pub use config::{ChainConfig, EngineConfig, PathSearchConfig, ViewConfig};
pub use error::LedgerError;
pub use models::{
    address::{Address, AddressError},
    block::{Block, BlockId, Transaction},
    call::{CallArg, CallRecord, FunctionName, LedgerCall},
    event::{EventLog, SettlementEvent},
};
pub use scanner::LogScanner;
pub use settlement::{
    CheckpointError, Edge, NeighborSource, PathFinder, SettlementCheckpoint, SettlementEngine,
    SettlementError, SettlementOutcome, SettlementPhase, SettlementPlan,
};
pub use views::DerivedViews;

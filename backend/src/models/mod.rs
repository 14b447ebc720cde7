//! Domain models for the IOU ledger

pub mod address;
pub mod block;
pub mod call;
pub mod event;

// Re-exports
pub use address::{Address, AddressError};
pub use block::{Block, BlockId, Transaction};
pub use call::{CallArg, CallRecord, FunctionName, LedgerCall};
pub use event::{EventLog, SettlementEvent};

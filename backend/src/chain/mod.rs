//! External ledger boundary
//!
//! - **reader**: Chain Reader (head, blocks, payload decoding)
//! - **contract**: canonical debt contract calls
//! - **codec**: call payload wire format
//! - **memory**: in-memory chain + contract used by tests and the CLI

pub mod codec;
pub mod contract;
pub mod memory;
pub mod reader;

pub use codec::{decode_call, encode_call, DecodeError};
pub use contract::{DebtLedger, LedgerClient};
pub use memory::MemoryLedger;
pub use reader::ChainReader;

//! Decoded contract calls
//!
//! The decoder produces a closed set of typed variants, one per function the
//! debt contract exposes. Anything else is a [`DecodeError`](crate::chain::codec::DecodeError)
//! and is never surfaced past the scanner.

use crate::models::address::Address;
use crate::models::block::BlockId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Functions exposed by the debt contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionName {
    RecordDebt,
    ReduceDebt,
    Lookup,
}

impl FunctionName {
    pub const ALL: [FunctionName; 3] = [
        FunctionName::RecordDebt,
        FunctionName::ReduceDebt,
        FunctionName::Lookup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionName::RecordDebt => "record_debt",
            FunctionName::ReduceDebt => "reduce_debt",
            FunctionName::Lookup => "lookup",
        }
    }

    /// Canonical signature hashed into the call selector
    pub fn signature(&self) -> &'static str {
        match self {
            FunctionName::RecordDebt => "record_debt(address,uint32)",
            FunctionName::ReduceDebt => "reduce_debt(address,uint32)",
            FunctionName::Lookup => "lookup(address,address)",
        }
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single decoded argument value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallArg {
    Address(Address),
    Uint(u32),
}

impl CallArg {
    pub fn as_address(&self) -> Option<&Address> {
        match self {
            CallArg::Address(addr) => Some(addr),
            CallArg::Uint(_) => None,
        }
    }
}

/// A typed call against the debt contract
///
/// The caller is not part of the call; it is the sending account of the
/// transaction that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "snake_case")]
pub enum LedgerCall {
    /// Caller now owes `creditor` an additional `amount`
    RecordDebt { creditor: Address, amount: u32 },

    /// Caller (a creditor) forgives `amount` of what `debtor` owes them
    ReduceDebt { debtor: Address, amount: u32 },

    /// Read of `amount(debtor, creditor)`
    Lookup { debtor: Address, creditor: Address },
}

impl LedgerCall {
    pub fn function(&self) -> FunctionName {
        match self {
            LedgerCall::RecordDebt { .. } => FunctionName::RecordDebt,
            LedgerCall::ReduceDebt { .. } => FunctionName::ReduceDebt,
            LedgerCall::Lookup { .. } => FunctionName::Lookup,
        }
    }

    /// Decoded arguments in declaration order
    pub fn args(&self) -> Vec<CallArg> {
        match self {
            LedgerCall::RecordDebt { creditor, amount } => {
                vec![CallArg::Address(creditor.clone()), CallArg::Uint(*amount)]
            }
            LedgerCall::ReduceDebt { debtor, amount } => {
                vec![CallArg::Address(debtor.clone()), CallArg::Uint(*amount)]
            }
            LedgerCall::Lookup { debtor, creditor } => vec![
                CallArg::Address(debtor.clone()),
                CallArg::Address(creditor.clone()),
            ],
        }
    }

    /// First decoded argument if it is an address
    pub fn first_address(&self) -> Option<&Address> {
        match self {
            LedgerCall::RecordDebt { creditor, .. } => Some(creditor),
            LedgerCall::ReduceDebt { debtor, .. } => Some(debtor),
            LedgerCall::Lookup { debtor, .. } => Some(debtor),
        }
    }

    /// Whether any address argument equals `account`
    pub fn mentions(&self, account: &Address) -> bool {
        self.args()
            .iter()
            .filter_map(CallArg::as_address)
            .any(|addr| addr == account)
    }
}

/// A decoded call stamped with where and when it happened
///
/// Produced transiently by the scanner and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub call: LedgerCall,
    pub sender: Address,
    /// Timestamp of the containing block
    pub timestamp: u64,
    pub block: BlockId,
}

impl CallRecord {
    pub fn function(&self) -> FunctionName {
        self.call.function()
    }

    /// Sender or any address argument equals `account`
    pub fn involves(&self, account: &Address) -> bool {
        &self.sender == account || self.call.mentions(account)
    }
}

//! Call payload codec
//!
//! Wire format of a contract call payload:
//!
//! ```text
//! [selector: 4 bytes][arg 0: 32 bytes][arg 1: 32 bytes]
//! ```
//!
//! - Selector: first 4 bytes of SHA-256 over the function signature
//!   (e.g. `record_debt(address,uint32)`)
//! - `address` words: 12 zero bytes then the 20 address bytes
//! - `uint32` words: 28 zero bytes then the big-endian value
//!
//! Decoding is strict: unknown selectors, short payloads, trailing bytes and
//! non-zero padding are all rejected.

use crate::models::address::{Address, ADDRESS_LEN};
use crate::models::call::{FunctionName, LedgerCall};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const SELECTOR_LEN: usize = 4;
pub const WORD_LEN: usize = 32;

/// Errors produced while decoding a payload
///
/// Always recovered locally: the transaction is treated as "not a
/// recognized call".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Payload truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Unknown selector: 0x{0}")]
    UnknownSelector(String),

    #[error("Payload has {0} trailing bytes")]
    TrailingBytes(usize),

    #[error("Invalid argument {index}: {reason}")]
    InvalidArgument { index: usize, reason: String },
}

/// Selector for a function
pub fn selector(function: FunctionName) -> [u8; SELECTOR_LEN] {
    let digest = Sha256::digest(function.signature().as_bytes());
    let mut out = [0u8; SELECTOR_LEN];
    out.copy_from_slice(&digest[..SELECTOR_LEN]);
    out
}

fn address_word(address: &Address) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    word[WORD_LEN - ADDRESS_LEN..].copy_from_slice(&address.to_bytes());
    word
}

fn uint_word(value: u32) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    word[WORD_LEN - 4..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Encode a call into its payload
pub fn encode_call(call: &LedgerCall) -> Vec<u8> {
    let mut payload = Vec::with_capacity(SELECTOR_LEN + 2 * WORD_LEN);
    payload.extend_from_slice(&selector(call.function()));
    match call {
        LedgerCall::RecordDebt { creditor, amount } => {
            payload.extend_from_slice(&address_word(creditor));
            payload.extend_from_slice(&uint_word(*amount));
        }
        LedgerCall::ReduceDebt { debtor, amount } => {
            payload.extend_from_slice(&address_word(debtor));
            payload.extend_from_slice(&uint_word(*amount));
        }
        LedgerCall::Lookup { debtor, creditor } => {
            payload.extend_from_slice(&address_word(debtor));
            payload.extend_from_slice(&address_word(creditor));
        }
    }
    payload
}

fn read_address(word: &[u8], index: usize) -> Result<Address, DecodeError> {
    let (padding, body) = word.split_at(WORD_LEN - ADDRESS_LEN);
    if padding.iter().any(|b| *b != 0) {
        return Err(DecodeError::InvalidArgument {
            index,
            reason: "address word has non-zero padding".to_string(),
        });
    }
    let mut raw = [0u8; ADDRESS_LEN];
    raw.copy_from_slice(body);
    Ok(Address::from_bytes(raw))
}

fn read_uint(word: &[u8], index: usize) -> Result<u32, DecodeError> {
    let (padding, body) = word.split_at(WORD_LEN - 4);
    if padding.iter().any(|b| *b != 0) {
        return Err(DecodeError::InvalidArgument {
            index,
            reason: "uint32 overflow".to_string(),
        });
    }
    let mut raw = [0u8; 4];
    raw.copy_from_slice(body);
    Ok(u32::from_be_bytes(raw))
}

/// Decode a payload into a typed call
pub fn decode_call(payload: &[u8]) -> Result<LedgerCall, DecodeError> {
    let expected = SELECTOR_LEN + 2 * WORD_LEN;
    if payload.len() < SELECTOR_LEN {
        return Err(DecodeError::Truncated {
            expected,
            actual: payload.len(),
        });
    }

    let (head, body) = payload.split_at(SELECTOR_LEN);
    let function = FunctionName::ALL
        .into_iter()
        .find(|f| selector(*f) == head)
        .ok_or_else(|| DecodeError::UnknownSelector(hex::encode(head)))?;

    // Every known function takes exactly two words
    if body.len() < 2 * WORD_LEN {
        return Err(DecodeError::Truncated {
            expected,
            actual: payload.len(),
        });
    }
    if body.len() > 2 * WORD_LEN {
        return Err(DecodeError::TrailingBytes(body.len() - 2 * WORD_LEN));
    }
    let (first, second) = body.split_at(WORD_LEN);

    let call = match function {
        FunctionName::RecordDebt => LedgerCall::RecordDebt {
            creditor: read_address(first, 0)?,
            amount: read_uint(second, 1)?,
        },
        FunctionName::ReduceDebt => LedgerCall::ReduceDebt {
            debtor: read_address(first, 0)?,
            amount: read_uint(second, 1)?,
        },
        FunctionName::Lookup => LedgerCall::Lookup {
            debtor: read_address(first, 0)?,
            creditor: read_address(second, 1)?,
        },
    };
    Ok(call)
}

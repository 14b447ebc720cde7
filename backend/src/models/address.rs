//! Account addresses
//!
//! Every address in the system is compared in a single normalized form:
//! lower-case, `0x`-prefixed, 40 hex digits (20 bytes). Mixed-case input is
//! accepted everywhere and folded on construction, so `==` on [`Address`]
//! is the case-insensitive equality the ledger requires.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of raw bytes in an account address
pub const ADDRESS_LEN: usize = 20;

/// Errors that can occur while parsing an address
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AddressError {
    #[error("Address must start with 0x: {0}")]
    MissingPrefix(String),

    #[error("Address must be {expected} hex digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Address contains non-hex characters: {0}")]
    InvalidHex(String),
}

/// Normalized account identifier
///
/// # Example
/// ```
/// use iou_ledger_core::Address;
///
/// let a: Address = "0xAbCdEf0000000000000000000000000000000001".parse().unwrap();
/// let b: Address = "0xabcdef0000000000000000000000000000000001".parse().unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "0xabcdef0000000000000000000000000000000001");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Build an address from its raw 20 bytes
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// Raw 20 bytes of the address
    pub fn to_bytes(&self) -> [u8; ADDRESS_LEN] {
        let mut out = [0u8; ADDRESS_LEN];
        // Body was validated on construction
        if let Ok(decoded) = hex::decode(&self.0[2..]) {
            out.copy_from_slice(&decoded);
        }
        out
    }

    /// Normalized string form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against an unparsed string
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(trimmed.to_string()))?;

        if body.len() != ADDRESS_LEN * 2 {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LEN * 2,
                actual: body.len(),
            });
        }
        if !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidHex(trimmed.to_string()));
        }

        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

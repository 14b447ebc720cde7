//! Configuration
//!
//! All configuration is plain serde data with defaults, so a scenario file
//! only has to name what it changes.

use crate::models::address::Address;
use serde::{Deserialize, Serialize};

/// Address the debt contract is deployed at unless configured otherwise
pub const DEFAULT_CONTRACT: [u8; 20] = [
    0x01, 0x65, 0x87, 0x8a, 0x59, 0x4c, 0xa2, 0x55, 0x33, 0x8a, 0xdf, 0xa4, 0xd4, 0x84, 0x49,
    0xf6, 0x92, 0x42, 0xeb, 0x8f,
];

/// In-memory chain parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub contract_address: Address,

    /// Timestamp of the genesis block (seconds)
    pub genesis_timestamp: u64,

    /// Seconds between consecutive blocks
    pub block_interval_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            contract_address: Address::from_bytes(DEFAULT_CONTRACT),
            genesis_timestamp: 1_700_000_000,
            block_interval_secs: 12,
        }
    }
}

/// Derived-view behavior
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Keep an incremental index of scanned calls instead of re-walking
    /// the whole chain on every query
    pub use_index: bool,
}

/// Cycle Finder behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSearchConfig {
    /// Skip any node already reached by a shorter path
    pub prune_visited: bool,

    /// Maximum number of edges in a returned path
    pub max_depth: Option<usize>,
}

impl Default for PathSearchConfig {
    fn default() -> Self {
        Self {
            prune_visited: true,
            max_depth: None,
        }
    }
}

/// Everything the settlement engine and views need
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub search: PathSearchConfig,
    pub views: ViewConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "search": { "max_depth": 4 } }"#).unwrap();
        assert!(config.search.prune_visited);
        assert_eq!(config.search.max_depth, Some(4));
        assert!(!config.views.use_index);
    }

    #[test]
    fn test_default_contract_address() {
        let config = ChainConfig::default();
        assert!(config
            .contract_address
            .matches("0x0165878A594ca255338adfa4d48449f69242Eb8F"));
    }
}

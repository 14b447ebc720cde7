//! Checkpoint - Save/Load Interrupted Settlements
//!
//! An interrupted settlement hands back its [`SettlementPlan`]. A checkpoint
//! is that plan serialized to JSON together with a SHA-256 digest of its
//! canonical form, so a plan read back from disk can be trusted before it
//! drives further canonical writes.
//!
//! # Critical Invariants
//!
//! - **Integrity**: a checkpoint only loads if its digest matches
//! - **Resumption Point**: the remaining edges and residual are exactly
//!   what the interrupted run had not yet written

use crate::settlement::plan::SettlementPlan;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported checkpoint version {0}")]
    UnsupportedVersion(u32),

    #[error("Checkpoint digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },
}

/// Persisted form of an in-flight settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementCheckpoint {
    pub version: u32,

    /// SHA256 of the canonical JSON of `plan`
    pub digest: String,

    pub plan: SettlementPlan,
}

impl SettlementCheckpoint {
    pub fn new(plan: SettlementPlan) -> Result<Self, CheckpointError> {
        let digest = plan_digest(&plan)?;
        Ok(Self {
            version: CHECKPOINT_VERSION,
            digest,
            plan,
        })
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            CheckpointError::Serialization(format!("Checkpoint serialization failed: {}", e))
        })
    }

    /// Parse and verify a checkpoint, returning the plan it holds
    pub fn from_json(json: &str) -> Result<SettlementPlan, CheckpointError> {
        let checkpoint: SettlementCheckpoint = serde_json::from_str(json).map_err(|e| {
            CheckpointError::Serialization(format!("Checkpoint parse failed: {}", e))
        })?;
        checkpoint.verify()?;
        Ok(checkpoint.plan)
    }

    pub fn verify(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion(self.version));
        }
        let actual = plan_digest(&self.plan)?;
        if actual != self.digest {
            return Err(CheckpointError::DigestMismatch {
                expected: self.digest.clone(),
                actual,
            });
        }
        Ok(())
    }
}

/// Hex SHA-256 of a plan's JSON
///
/// Goes through `serde_json::Value`, whose object map keeps keys sorted, so
/// field order in the stored file never changes the digest.
pub fn plan_digest(plan: &SettlementPlan) -> Result<String, CheckpointError> {
    let bytes = serde_json::to_value(plan)
        .and_then(|value| serde_json::to_vec(&value))
        .map_err(|e| CheckpointError::Serialization(format!("Plan digest failed: {}", e)))?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::address::Address;

    fn addr(n: u8) -> Address {
        let mut raw = [0u8; 20];
        raw[19] = n;
        Address::from_bytes(raw)
    }

    fn sample_plan() -> SettlementPlan {
        let mut plan =
            SettlementPlan::netting(addr(1), addr(2), 10, vec![addr(2), addr(3), addr(1)], 5);
        plan.advance();
        plan
    }

    #[test]
    fn test_checkpoint_restores_resumption_point() {
        let plan = sample_plan();
        let json = SettlementCheckpoint::new(plan.clone())
            .unwrap()
            .to_json()
            .unwrap();

        let restored = SettlementCheckpoint::from_json(&json).unwrap();
        assert_eq!(restored, plan);
        assert_eq!(restored.remaining_edges().len(), 1);
        assert_eq!(restored.writes_done, 1);
    }

    #[test]
    fn test_tampered_checkpoint_rejected() {
        let mut checkpoint = SettlementCheckpoint::new(sample_plan()).unwrap();
        checkpoint.plan.residual = 10;
        let json = checkpoint.to_json().unwrap();

        assert!(matches!(
            SettlementCheckpoint::from_json(&json),
            Err(CheckpointError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn test_digest_deterministic() {
        let plan = sample_plan();
        assert_eq!(plan_digest(&plan).unwrap(), plan_digest(&plan).unwrap());
    }
}

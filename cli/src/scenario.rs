//! Scenario files
//!
//! A scenario is a JSON document naming the chain and engine configuration
//! and an ordered list of steps to run against a fresh in-memory ledger.
//!
//! ```json
//! {
//!   "engine": { "search": { "prune_visited": true } },
//!   "steps": [
//!     { "op": "issue", "debtor": "0x..01", "creditor": "0x..02", "amount": 10 },
//!     { "op": "users" },
//!     { "op": "total_owed", "account": "0x..01" }
//!   ]
//! }
//! ```

use crate::CliError;
use iou_ledger_core::{
    Address, ChainConfig, DebtLedger, EngineConfig, MemoryLedger, SettlementCheckpoint,
    SettlementEngine, SettlementError, SettlementOutcome,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub chain: ChainConfig,
    pub engine: EngineConfig,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Issue {
        debtor: Address,
        creditor: Address,
        amount: u32,
    },
    Users,
    TotalOwed {
        account: Address,
    },
    LastActive {
        account: Address,
    },
    Lookup {
        debtor: Address,
        creditor: Address,
    },
}

/// One line of scenario output
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepResult {
    Issue(SettlementOutcome),
    Users {
        users: BTreeSet<Address>,
    },
    TotalOwed {
        account: Address,
        total: u64,
    },
    LastActive {
        account: Address,
        timestamp: Option<u64>,
    },
    Lookup {
        debtor: Address,
        creditor: Address,
        amount: u32,
    },
}

pub struct ScenarioRunner {
    engine: SettlementEngine<MemoryLedger>,
    checkpoint_out: Option<PathBuf>,
}

impl ScenarioRunner {
    pub fn new(scenario: &Scenario, checkpoint_out: Option<PathBuf>) -> Self {
        let ledger = Arc::new(MemoryLedger::new(scenario.chain.clone()));
        Self {
            engine: SettlementEngine::new(ledger, &scenario.engine),
            checkpoint_out,
        }
    }

    pub async fn run_step(&self, step: &Step) -> Result<StepResult, CliError> {
        let views = self.engine.views();
        let result = match step {
            Step::Issue {
                debtor,
                creditor,
                amount,
            } => {
                match self.engine.issue_iou(debtor, creditor, *amount).await {
                    Ok(outcome) => StepResult::Issue(outcome),
                    Err(error) => return Err(self.save_checkpoint(error).await),
                }
            }
            Step::Users => StepResult::Users {
                users: views.get_users().await?,
            },
            Step::TotalOwed { account } => StepResult::TotalOwed {
                account: account.clone(),
                total: views.get_total_owed(account).await?,
            },
            Step::LastActive { account } => StepResult::LastActive {
                account: account.clone(),
                timestamp: views.get_last_active(account).await?,
            },
            Step::Lookup { debtor, creditor } => StepResult::Lookup {
                debtor: debtor.clone(),
                creditor: creditor.clone(),
                amount: self.engine.client().lookup(debtor, creditor).await?,
            },
        };
        Ok(result)
    }

    /// Persist the resumption point of an interrupted settlement
    async fn save_checkpoint(&self, error: SettlementError) -> CliError {
        let plan = error.plan().cloned();
        let (path, plan) = match (&self.checkpoint_out, plan) {
            (Some(path), Some(plan)) => (path, plan),
            _ => return error.into(),
        };
        let json = match SettlementCheckpoint::new(plan).and_then(|c| c.to_json()) {
            Ok(json) => json,
            Err(checkpoint_error) => return checkpoint_error.into(),
        };
        match tokio::fs::write(path, json).await {
            Ok(()) => info!(path = %path.display(), "checkpoint written"),
            Err(io_error) => warn!(path = %path.display(), %io_error, "checkpoint not written"),
        }
        error.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iou_ledger_core::LedgerError;

    const THREE_PARTY: &str = include_str!("../scenarios/three_party_cycle.json");

    fn addr(n: u8) -> Address {
        format!("0x{:040x}", n).parse().unwrap()
    }

    fn issue(debtor: u8, creditor: u8, amount: u32) -> Step {
        Step::Issue {
            debtor: addr(debtor),
            creditor: addr(creditor),
            amount,
        }
    }

    #[tokio::test]
    async fn test_three_party_scenario() {
        let scenario: Scenario = serde_json::from_str(THREE_PARTY).unwrap();
        assert!(scenario.engine.views.use_index);
        assert_eq!(scenario.steps.len(), 7);

        let runner = ScenarioRunner::new(&scenario, None);
        let mut results = Vec::new();
        for step in &scenario.steps {
            results.push(runner.run_step(step).await.unwrap());
        }

        match &results[2] {
            StepResult::Issue(outcome) => {
                assert_eq!(outcome.netted, 5);
                assert_eq!(outcome.residual, 5);
                assert_eq!(outcome.path.as_ref().map(Vec::len), Some(3));
            }
            other => panic!("expected issue result, got {:?}", other),
        }
        assert!(matches!(results[3], StepResult::Lookup { amount: 5, .. }));
        assert!(matches!(&results[4], StepResult::Users { users } if users.len() == 3));
        assert!(matches!(results[5], StepResult::TotalOwed { total: 5, .. }));
        assert!(matches!(
            results[6],
            StepResult::LastActive {
                timestamp: Some(1_700_000_060),
                ..
            }
        ));

        let line: serde_json::Value = serde_json::to_value(&results[2]).unwrap();
        assert_eq!(line["op"], "issue");
        assert_eq!(line["netted"], 5);
        assert_eq!(line["events"][0]["type"], "cycle_detected");
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let scenario: Scenario =
            serde_json::from_str(r#"{ "steps": [{ "op": "users" }] }"#).unwrap();
        assert_eq!(scenario.chain, ChainConfig::default());
        assert!(!scenario.engine.views.use_index);
        assert!(matches!(scenario.steps[..], [Step::Users]));
    }

    #[tokio::test]
    async fn test_interrupted_issue_writes_checkpoint() {
        let path = std::env::temp_dir().join(format!(
            "iou-ledger-checkpoint-{}.json",
            std::process::id()
        ));
        let runner = ScenarioRunner::new(&Scenario::default(), Some(path.clone()));
        runner.run_step(&issue(1, 2, 5)).await.unwrap();
        runner.run_step(&issue(2, 3, 5)).await.unwrap();
        runner.engine.client().fail_writes_after(1).unwrap();

        let error = runner.run_step(&issue(3, 1, 10)).await.unwrap_err();
        assert!(matches!(
            error,
            CliError::Settlement(SettlementError::Incomplete {
                source: LedgerError::Transport(_),
                ..
            })
        ));

        let json = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let plan = SettlementCheckpoint::from_json(&json).unwrap();
        assert_eq!(plan.writes_done, 1);
        assert_eq!(plan.remaining_edges().len(), 1);
        assert_eq!(plan.residual, 5);
    }
}

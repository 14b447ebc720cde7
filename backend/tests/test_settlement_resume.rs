//! Tests for interrupted settlements
//!
//! A settlement is several canonical writes with no rollback. These tests
//! inject transport failures between writes and check that the error hands
//! back an exact resumption point.

use iou_ledger_core::{
    Address, CheckpointError, Edge, EngineConfig, LedgerError, MemoryLedger, SettlementCheckpoint,
    SettlementEngine, SettlementError, SettlementPlan,
};
use std::collections::BTreeMap;
use std::sync::Arc;

fn addr(n: u8) -> Address {
    format!("0x{:040x}", n).parse().unwrap()
}

/// Ledger with 1 -> 2 and 2 -> 3, five each
async fn two_hop_chain() -> (Arc<MemoryLedger>, SettlementEngine<MemoryLedger>) {
    let ledger = Arc::new(MemoryLedger::default());
    let engine = SettlementEngine::new(ledger.clone(), &EngineConfig::default());
    engine.issue_iou(&addr(1), &addr(2), 5).await.unwrap();
    engine.issue_iou(&addr(2), &addr(3), 5).await.unwrap();
    (ledger, engine)
}

fn interrupted_plan(error: SettlementError) -> SettlementPlan {
    match error {
        SettlementError::Incomplete { plan, .. } => *plan,
        other => panic!("expected incomplete settlement, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failure_mid_netting_reports_resumption_point() {
    let (ledger, engine) = two_hop_chain().await;
    ledger.fail_writes_after(1).unwrap();

    let error = engine.issue_iou(&addr(3), &addr(1), 10).await.unwrap_err();

    assert!(error.to_string().starts_with("Settlement interrupted"));
    let plan = interrupted_plan(error);
    assert_eq!(plan.writes_done, 1);
    assert_eq!(
        plan.remaining_edges(),
        vec![Edge {
            debtor: addr(2),
            creditor: addr(3)
        }]
    );
    assert_eq!(plan.residual, 5);

    // First edge is already gone on chain; nothing was rolled back
    let expected: BTreeMap<_, _> = [((addr(2), addr(3)), 5)].into_iter().collect();
    assert_eq!(ledger.debts().unwrap(), expected);
}

#[tokio::test]
async fn test_resume_after_checkpoint_round_trip() {
    let (ledger, engine) = two_hop_chain().await;
    ledger.fail_writes_after(1).unwrap();
    let plan = interrupted_plan(engine.issue_iou(&addr(3), &addr(1), 10).await.unwrap_err());
    let id = plan.id;

    let json = SettlementCheckpoint::new(plan).unwrap().to_json().unwrap();
    ledger.clear_faults().unwrap();
    let restored = SettlementCheckpoint::from_json(&json).unwrap();

    let outcome = engine.resume(restored).await.unwrap();

    assert_eq!(outcome.id, id);
    assert_eq!(outcome.writes, 3);
    assert_eq!(outcome.netted, 5);
    assert_eq!(outcome.residual, 5);
    let expected: BTreeMap<_, _> = [((addr(3), addr(1)), 5)].into_iter().collect();
    assert_eq!(ledger.debts().unwrap(), expected);
}

#[tokio::test]
async fn test_failure_during_recording_resumes_with_record_only() {
    let (ledger, engine) = two_hop_chain().await;
    // Both reductions land, the residual write does not
    ledger.fail_writes_after(2).unwrap();

    let plan = interrupted_plan(engine.issue_iou(&addr(3), &addr(1), 10).await.unwrap_err());
    assert_eq!(plan.writes_done, 2);
    assert!(plan.remaining_edges().is_empty());
    assert!(ledger.debts().unwrap().is_empty());

    ledger.clear_faults().unwrap();
    let outcome = engine.resume(plan).await.unwrap();

    assert_eq!(outcome.writes, 3);
    let expected: BTreeMap<_, _> = [((addr(3), addr(1)), 5)].into_iter().collect();
    assert_eq!(ledger.debts().unwrap(), expected);
}

#[tokio::test]
async fn test_failure_before_first_write_leaves_ledger_unchanged() {
    let (ledger, engine) = two_hop_chain().await;
    let before = ledger.debts().unwrap();
    let height = ledger.height().unwrap();
    ledger.fail_writes_after(0).unwrap();

    let result = engine.issue_iou(&addr(3), &addr(1), 10).await;

    assert!(matches!(
        result,
        Err(SettlementError::Ledger(LedgerError::Transport(_)))
    ));
    assert_eq!(ledger.debts().unwrap(), before);
    assert_eq!(ledger.height().unwrap(), height);
}

#[tokio::test]
async fn test_offline_ledger_fails_probe() {
    let (ledger, engine) = two_hop_chain().await;
    ledger.set_offline(true).unwrap();

    let result = engine.issue_iou(&addr(3), &addr(1), 10).await;

    match result {
        Err(error @ SettlementError::Ledger(_)) => assert!(error.plan().is_none()),
        other => panic!("expected ledger error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_resume_complete_plan_rejected() {
    let (_ledger, engine) = two_hop_chain().await;
    let plan = engine.plan(&addr(1), &addr(2), 0).await.unwrap();
    assert!(plan.is_complete());

    assert_eq!(
        engine.resume(plan).await,
        Err(SettlementError::AlreadyComplete)
    );
}

#[tokio::test]
async fn test_tampered_checkpoint_cannot_resume() {
    let (ledger, engine) = two_hop_chain().await;
    ledger.fail_writes_after(1).unwrap();
    let plan = interrupted_plan(engine.issue_iou(&addr(3), &addr(1), 10).await.unwrap_err());

    let mut checkpoint = SettlementCheckpoint::new(plan).unwrap();
    checkpoint.plan.netted = 50;
    let json = checkpoint.to_json().unwrap();

    assert!(matches!(
        SettlementCheckpoint::from_json(&json),
        Err(CheckpointError::DigestMismatch { .. })
    ));
}

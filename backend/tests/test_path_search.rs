//! Tests for the Cycle Finder
//!
//! Uses static adjacency maps as the neighbor relation so each test pins
//! down search behavior independent of the ledger.

use async_trait::async_trait;
use iou_ledger_core::{Address, LedgerError, NeighborSource, PathFinder, PathSearchConfig};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

fn addr(n: u8) -> Address {
    format!("0x{:040x}", n).parse().unwrap()
}

fn graph(edges: &[(u8, u8)]) -> BTreeMap<Address, Vec<Address>> {
    let mut adj: BTreeMap<Address, Vec<Address>> = BTreeMap::new();
    for (from, to) in edges {
        adj.entry(addr(*from)).or_default().push(addr(*to));
    }
    adj
}

/// Neighbor source that counts expansions
struct Counting {
    inner: BTreeMap<Address, Vec<Address>>,
    calls: AtomicUsize,
}

impl Counting {
    fn new(inner: BTreeMap<Address, Vec<Address>>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl NeighborSource for Counting {
    async fn neighbors(&self, account: &Address) -> Result<Vec<Address>, LedgerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.neighbors(account).await
    }
}

fn finder(prune_visited: bool) -> PathFinder {
    PathFinder::new(PathSearchConfig {
        prune_visited,
        max_depth: None,
    })
}

#[tokio::test]
async fn test_finds_shortest_path() {
    // 1 -> 2 -> 3 -> 4 and 1 -> 5 -> 4
    let adj = graph(&[(1, 2), (1, 5), (2, 3), (3, 4), (5, 4)]);

    for prune in [true, false] {
        let path = finder(prune)
            .find_path(&addr(1), &addr(4), &adj)
            .await
            .unwrap();
        assert_eq!(path, Some(vec![addr(1), addr(5), addr(4)]));
    }
}

#[tokio::test]
async fn test_no_outgoing_edges_returns_none() {
    let adj = graph(&[(2, 1)]);

    for prune in [true, false] {
        let source = Counting::new(adj.clone());
        let path = finder(prune)
            .find_path(&addr(1), &addr(2), &source)
            .await
            .unwrap();
        assert_eq!(path, None);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_terminates_on_cycle_without_target() {
    let adj = graph(&[(1, 2), (2, 3), (3, 1)]);

    for prune in [true, false] {
        let path = finder(prune)
            .find_path(&addr(1), &addr(9), &adj)
            .await
            .unwrap();
        assert_eq!(path, None);
    }
}

#[tokio::test]
async fn test_start_equal_to_target() {
    let source = Counting::new(graph(&[(1, 2)]));
    let path = finder(true)
        .find_path(&addr(1), &addr(1), &source)
        .await
        .unwrap();

    assert_eq!(path, Some(vec![addr(1)]));
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_pruning_bounds_expansions() {
    // Diamond 1 -> {2, 3} -> 4 -> 5, target unreachable
    let adj = graph(&[(1, 2), (1, 3), (2, 4), (3, 4), (4, 5)]);

    let pruned = Counting::new(adj.clone());
    finder(true)
        .find_path(&addr(1), &addr(9), &pruned)
        .await
        .unwrap();

    let unpruned = Counting::new(adj);
    finder(false)
        .find_path(&addr(1), &addr(9), &unpruned)
        .await
        .unwrap();

    // Every node once vs. 4 and 5 reached along both branches
    assert_eq!(pruned.calls.load(Ordering::SeqCst), 5);
    assert_eq!(unpruned.calls.load(Ordering::SeqCst), 7);
}

#[tokio::test]
async fn test_max_depth_limits_path_length() {
    let adj = graph(&[(1, 2), (2, 3)]);

    let short = PathFinder::new(PathSearchConfig {
        prune_visited: true,
        max_depth: Some(1),
    });
    assert_eq!(
        short.find_path(&addr(1), &addr(3), &adj).await.unwrap(),
        None
    );

    let long = PathFinder::new(PathSearchConfig {
        prune_visited: true,
        max_depth: Some(2),
    });
    assert_eq!(
        long.find_path(&addr(1), &addr(3), &adj).await.unwrap(),
        Some(vec![addr(1), addr(2), addr(3)])
    );
}

#[tokio::test]
async fn test_neighbor_errors_propagate() {
    struct Broken;

    #[async_trait]
    impl NeighborSource for Broken {
        async fn neighbors(&self, _account: &Address) -> Result<Vec<Address>, LedgerError> {
            Err(LedgerError::Transport("timeout".to_string()))
        }
    }

    let result = finder(true).find_path(&addr(1), &addr(2), &Broken).await;
    assert_eq!(result, Err(LedgerError::Transport("timeout".to_string())));
}

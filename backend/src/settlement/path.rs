//! Cycle Finder
//!
//! Breadth-first search over a caller-supplied neighbor relation. The
//! frontier holds whole paths, so the first path that ends at the target is
//! a shortest one in edge count.
//!
//! # Pruning
//!
//! - `prune_visited = true`: a node is enqueued at most once, the first
//!   time any path reaches it. Queue growth is bounded by the node count.
//! - `prune_visited = false`: a path may not revisit a node it already
//!   contains, but different paths may reach the same node at different
//!   depths. Still terminates for a finite node set.
//!
//! Either way the returned path is a shortest one.

use crate::config::PathSearchConfig;
use crate::error::LedgerError;
use crate::models::address::Address;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::trace;

/// Directed neighbor relation searched by [`PathFinder`]
#[async_trait]
pub trait NeighborSource: Send + Sync {
    async fn neighbors(&self, account: &Address) -> Result<Vec<Address>, LedgerError>;
}

#[async_trait]
impl NeighborSource for BTreeMap<Address, Vec<Address>> {
    async fn neighbors(&self, account: &Address) -> Result<Vec<Address>, LedgerError> {
        Ok(self.get(account).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl NeighborSource for HashMap<Address, Vec<Address>> {
    async fn neighbors(&self, account: &Address) -> Result<Vec<Address>, LedgerError> {
        Ok(self.get(account).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathFinder {
    config: PathSearchConfig,
}

impl PathFinder {
    pub fn new(config: PathSearchConfig) -> Self {
        Self { config }
    }

    /// Shortest path `[start, .., target]`, or `None` if target is unreachable
    pub async fn find_path<N: NeighborSource + ?Sized>(
        &self,
        start: &Address,
        target: &Address,
        source: &N,
    ) -> Result<Option<Vec<Address>>, LedgerError> {
        let mut queue: VecDeque<Vec<Address>> = VecDeque::new();
        queue.push_back(vec![start.clone()]);

        let mut visited: HashSet<Address> = HashSet::new();
        visited.insert(start.clone());

        let mut expanded = 0usize;
        while let Some(path) = queue.pop_front() {
            let last = match path.last() {
                Some(last) => last,
                None => continue,
            };
            if last == target {
                trace!(expanded, edges = path.len() - 1, "path found");
                return Ok(Some(path));
            }
            if let Some(max_depth) = self.config.max_depth {
                if path.len() > max_depth {
                    continue;
                }
            }

            expanded += 1;
            for neighbor in source.neighbors(last).await? {
                if self.config.prune_visited {
                    if !visited.insert(neighbor.clone()) {
                        continue;
                    }
                } else if path.contains(&neighbor) {
                    continue;
                }
                let mut next = path.clone();
                next.push(neighbor);
                queue.push_back(next);
            }
        }

        trace!(expanded, "no path");
        Ok(None)
    }
}

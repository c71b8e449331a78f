//! Wait-for graph construction

use std::collections::{BTreeMap, BTreeSet};

use dlsim_coordinator::SystemSnapshot;
use dlsim_types::ProcessId;

/// Directed graph with an edge `p -> q` when waiting process `p` is blocked
/// on a resource type that `q` currently holds
///
/// Purely derived from a snapshot; never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitForGraph {
    nodes: BTreeSet<ProcessId>,
    edges: BTreeMap<ProcessId, BTreeSet<ProcessId>>,
}

impl WaitForGraph {
    /// Build the graph from a coordinator snapshot
    ///
    /// Every process becomes a node. For each waiting process `p` with a
    /// non-zero request, and each resource type `r` where the request
    /// exceeds what is available, `p` waits on every other non-terminal
    /// process holding some of `r`.
    #[must_use]
    pub fn from_snapshot(snapshot: &SystemSnapshot) -> Self {
        let mut graph = Self {
            nodes: (0..snapshot.processes()).map(ProcessId).collect(),
            edges: BTreeMap::new(),
        };
        let available = &snapshot.ledger.available;
        let allocation = &snapshot.ledger.allocation;

        for p in snapshot.waiting() {
            let Some(Some(request)) = snapshot.requests.get(p.index()) else {
                continue;
            };
            if request.is_zero() {
                continue;
            }

            for (r, wanted) in request.iter().enumerate() {
                if wanted <= available.as_slice().get(r).copied().unwrap_or(0) {
                    continue;
                }
                for (q, held) in allocation.iter().enumerate() {
                    let q = ProcessId(q);
                    let holds = held.as_slice().get(r).is_some_and(|&units| units > 0);
                    let live = snapshot.states.get(q.index()).is_some_and(|s| !s.is_terminal());
                    if q != p && holds && live {
                        graph.add_edge(p, q);
                    }
                }
            }
        }
        graph
    }

    /// Add `from -> to`, inserting both nodes
    pub fn add_edge(&mut self, from: ProcessId, to: ProcessId) {
        self.nodes.insert(from);
        self.nodes.insert(to);
        self.edges.entry(from).or_default().insert(to);
    }

    pub fn add_node(&mut self, node: ProcessId) {
        self.nodes.insert(node);
    }

    /// Nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.nodes.iter().copied()
    }

    /// Successors of `node` in ascending id order
    pub fn successors(&self, node: ProcessId) -> impl Iterator<Item = ProcessId> + '_ {
        self.edges
            .get(&node)
            .into_iter()
            .flat_map(|targets| targets.iter().copied())
    }

    #[must_use]
    pub fn has_edge(&self, from: ProcessId, to: ProcessId) -> bool {
        self.edges.get(&from).is_some_and(|t| t.contains(&to))
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlsim_resources::LedgerSnapshot;
    use dlsim_types::{Mode, ProcessState, ResourceVector};

    fn v<const N: usize>(c: [u32; N]) -> ResourceVector {
        ResourceVector::from(c)
    }

    /// P0 holds r0 and wants r1; P1 holds r1 and wants r0; P2 idle.
    fn circular() -> SystemSnapshot {
        SystemSnapshot {
            mode: Mode::Detection,
            ledger: LedgerSnapshot {
                total: v([1, 1]),
                available: v([0, 0]),
                allocation: vec![v([1, 0]), v([0, 1]), v([0, 0])],
            },
            max_demand: vec![v([1, 1]), v([1, 1]), v([1, 1])],
            states: vec![
                ProcessState::Waiting,
                ProcessState::Waiting,
                ProcessState::Running,
            ],
            requests: vec![Some(v([0, 1])), Some(v([1, 0])), None],
            grants: vec![1, 1, 0],
            waits: vec![1, 1, 0],
        }
    }

    #[test]
    fn test_circular_wait_edges() {
        let graph = WaitForGraph::from_snapshot(&circular());
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.has_edge(ProcessId(0), ProcessId(1)));
        assert!(graph.has_edge(ProcessId(1), ProcessId(0)));
        assert_eq!(graph.successors(ProcessId(2)).count(), 0);
    }

    #[test]
    fn test_satisfiable_component_adds_no_edge() {
        let mut snapshot = circular();
        snapshot.ledger.available = v([0, 1]);
        snapshot.ledger.total = v([1, 2]);
        let graph = WaitForGraph::from_snapshot(&snapshot);
        // P0 wants r1, which is available now.
        assert!(!graph.has_edge(ProcessId(0), ProcessId(1)));
        assert!(graph.has_edge(ProcessId(1), ProcessId(0)));
    }

    #[test]
    fn test_terminal_holders_are_ignored() {
        let mut snapshot = circular();
        snapshot.states[1] = ProcessState::Aborted;
        let graph = WaitForGraph::from_snapshot(&snapshot);
        assert!(!graph.has_edge(ProcessId(0), ProcessId(1)));
    }
}

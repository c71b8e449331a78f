//! Cycle search over a wait-for graph

use std::collections::BTreeMap;

use dlsim_types::ProcessId;

use crate::graph::WaitForGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    Unvisited,
    OnStack,
    Done,
}

/// Find one cycle, if any
///
/// Depth-first search in ascending id order over both roots and
/// successors. The first back-edge found closes the cycle; the result runs
/// from the back-edge target along the active path, without repeating the
/// closing node.
#[must_use]
pub fn find_cycle(graph: &WaitForGraph) -> Option<Vec<ProcessId>> {
    let mut colour: BTreeMap<ProcessId, Colour> =
        graph.nodes().map(|n| (n, Colour::Unvisited)).collect();
    let mut path = Vec::new();

    for root in graph.nodes() {
        if colour.get(&root) == Some(&Colour::Unvisited) {
            if let Some(cycle) = visit(graph, root, &mut colour, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

/// Whether the graph contains any cycle
#[must_use]
pub fn has_cycle(graph: &WaitForGraph) -> bool {
    find_cycle(graph).is_some()
}

fn visit(
    graph: &WaitForGraph,
    node: ProcessId,
    colour: &mut BTreeMap<ProcessId, Colour>,
    path: &mut Vec<ProcessId>,
) -> Option<Vec<ProcessId>> {
    colour.insert(node, Colour::OnStack);
    path.push(node);

    for next in graph.successors(node) {
        match colour.get(&next).copied().unwrap_or(Colour::Unvisited) {
            Colour::OnStack => {
                let start = path.iter().position(|&p| p == next)?;
                return Some(path[start..].to_vec());
            }
            Colour::Unvisited => {
                if let Some(cycle) = visit(graph, next, colour, path) {
                    return Some(cycle);
                }
            }
            Colour::Done => {}
        }
    }

    path.pop();
    colour.insert(node, Colour::Done);
    None
}

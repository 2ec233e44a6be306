use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;

use super::types::ProcessGraph;

/// Breadth-first visitation order over every node of `graph`.
///
/// Seeds are the nodes without an incoming flow, in declaration order. A graph
/// where every node has a predecessor (a pure cycle, say) is seeded from its
/// first declared node instead. Nodes the traversal never reaches follow in
/// declaration order, so the result is always a permutation of the node ids.
pub fn bfs_order(graph: &ProcessGraph) -> Vec<&str> {
    let mut successors: IndexMap<&str, Vec<&str>> = graph
        .nodes
        .keys()
        .map(|id| (id.as_str(), Vec::new()))
        .collect();
    let mut has_incoming: HashSet<&str> = HashSet::new();

    for flow in graph.connected_flows() {
        if let Some(next) = successors.get_mut(flow.source.as_str()) {
            next.push(flow.target.as_str());
        }
        has_incoming.insert(flow.target.as_str());
    }

    let mut seeds: Vec<&str> = successors
        .keys()
        .copied()
        .filter(|id| !has_incoming.contains(id))
        .collect();
    if seeds.is_empty() {
        seeds.extend(successors.keys().next().copied());
    }

    let mut order: Vec<&str> = Vec::with_capacity(successors.len());
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    for seed in seeds {
        visited.insert(seed);
        queue.push_back(seed);
    }

    while let Some(node) = queue.pop_front() {
        order.push(node);
        if let Some(next) = successors.get(node) {
            for &target in next {
                if visited.insert(target) {
                    queue.push_back(target);
                }
            }
        }
    }

    for &id in successors.keys() {
        if visited.insert(id) {
            order.push(id);
        }
    }

    order
}

/// Column index per node: its position in the visitation order.
pub fn assign_columns<'a>(order: &[&'a str]) -> HashMap<&'a str, usize> {
    order
        .iter()
        .enumerate()
        .map(|(column, &id)| (id, column))
        .collect()
}

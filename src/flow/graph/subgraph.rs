//! Closures and induced subgraphs for partial re-execution

use std::collections::{HashSet, VecDeque};

use super::types::{Edge, FlowGraph, Node};

#[derive(Clone, Copy)]
enum Direction {
    Upstream,
    Downstream,
}

fn closure(node_id: &str, edges: &[Edge], direction: Direction) -> HashSet<String> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::from([node_id.to_string()]);

    while let Some(current) = queue.pop_front() {
        for edge in edges {
            let (from, to) = match direction {
                Direction::Upstream => (&edge.target, &edge.source),
                Direction::Downstream => (&edge.source, &edge.target),
            };
            if *from == current && visited.insert(to.clone()) {
                queue.push_back(to.clone());
            }
        }
    }

    visited
}

/// Every node reachable by following edges backward from `node_id`
pub fn upstream_closure(node_id: &str, edges: &[Edge]) -> HashSet<String> {
    closure(node_id, edges, Direction::Upstream)
}

/// Every node reachable by following edges forward from `node_id`
pub fn downstream_closure(node_id: &str, edges: &[Edge]) -> HashSet<String> {
    closure(node_id, edges, Direction::Downstream)
}

/// The start node together with its upstream and downstream closures
///
/// Node order follows the input; only edges with both endpoints inside
/// the set are kept.
pub fn induced_subgraph(start_id: &str, nodes: &[Node], edges: &[Edge]) -> FlowGraph {
    let mut members = upstream_closure(start_id, edges);
    members.extend(downstream_closure(start_id, edges));
    members.insert(start_id.to_string());

    let sub_nodes: Vec<Node> = nodes
        .iter()
        .filter(|n| members.contains(&n.id))
        .cloned()
        .collect();
    let sub_edges: Vec<Edge> = edges
        .iter()
        .filter(|e| members.contains(&e.source) && members.contains(&e.target))
        .cloned()
        .collect();

    FlowGraph::new(sub_nodes, sub_edges)
}

//! Execution ordering (Kahn's algorithm)

use std::collections::{HashMap, HashSet, VecDeque};

use super::types::{Edge, Node};
use crate::adk::error::FlowError;

/// Order nodes so that every edge source precedes its target
///
/// Zero in-degree nodes are seeded in node-list order. Edges with an
/// endpoint outside `nodes` are ignored. Fails with `DuplicateNodeId` if
/// two nodes share an id, and with `CycleDetected`, carrying the ids that
/// could not be ordered, if the graph is not a DAG.
pub fn topological_sort<'a>(nodes: &'a [Node], edges: &[Edge]) -> Result<Vec<&'a Node>, FlowError> {
    let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::with_capacity(nodes.len());

    for node in nodes {
        if in_degree.insert(node.id.as_str(), 0).is_some() {
            return Err(FlowError::DuplicateNodeId(node.id.clone()));
        }
        adjacency.insert(node.id.as_str(), Vec::new());
    }

    for edge in edges {
        if !in_degree.contains_key(edge.target.as_str()) {
            log::warn!("Ignoring edge {} with unknown target {}", edge.id, edge.target);
            continue;
        }
        let Some(successors) = adjacency.get_mut(edge.source.as_str()) else {
            log::warn!("Ignoring edge {} with unknown source {}", edge.id, edge.source);
            continue;
        };
        successors.push(edge.target.as_str());
        if let Some(degree) = in_degree.get_mut(edge.target.as_str()) {
            *degree += 1;
        }
    }

    let mut seeded: HashSet<&str> = HashSet::with_capacity(nodes.len());
    let mut queue: VecDeque<&str> = nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree.get(id) == Some(&0) && seeded.insert(*id))
        .collect();

    let mut sorted: Vec<&str> = Vec::with_capacity(nodes.len());
    while let Some(current) = queue.pop_front() {
        sorted.push(current);
        for &next in adjacency.get(current).map(Vec::as_slice).unwrap_or_default() {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    if sorted.len() != nodes.len() {
        let stuck: Vec<String> = nodes
            .iter()
            .filter(|n| in_degree.get(n.id.as_str()).is_some_and(|d| *d > 0))
            .map(|n| n.id.clone())
            .collect();
        return Err(FlowError::CycleDetected(stuck));
    }

    let by_id: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    Ok(sorted.into_iter().filter_map(|id| by_id.get(id).copied()).collect())
}

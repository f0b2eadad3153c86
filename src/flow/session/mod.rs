// SPDX-License-Identifier: MIT

//! Interactive flow session
//!
//! Owns the live graph and the state that surrounds the engine: edit
//! history, run history and pricing. The engine only ever sees cloned
//! snapshots; results are written back here once a run completes.

pub mod history;

use std::sync::Arc;

use uuid::Uuid;

use crate::adk::error::FlowError;
use crate::adk::model::TextGenerator;
use crate::flow::engine::types::{
    ExecutionRun, NodeExecutionLog, NodeExecutionStatus, PricingTable,
};
use crate::flow::engine::FlowEngine;
use crate::flow::graph::{
    validate_connection, Connection, ConnectionError, Edge, FlowGraph, Node, NodeKind, NodeType,
};

pub use history::{EditHistory, RunHistory};

/// Copy the output of every completed textOutput log into its node
///
/// Returns the number of nodes updated.
pub fn apply_run_outputs(graph: &mut FlowGraph, run: &ExecutionRun) -> usize {
    let mut updated = 0;
    for entry in &run.logs {
        if entry.node_type != NodeType::TextOutput.as_str()
            || entry.status != NodeExecutionStatus::Completed
        {
            continue;
        }
        let Some(output) = entry.output.as_ref() else {
            continue;
        };
        if let Some(node) = graph.node_mut(&entry.node_id) {
            if let NodeKind::TextOutput(data) = &mut node.kind {
                data.text = output.clone();
                updated += 1;
            }
        }
    }
    updated
}

pub struct FlowSession {
    graph: FlowGraph,
    edits: EditHistory,
    runs: RunHistory,
    pricing: Option<PricingTable>,
    engine: FlowEngine,
}

impl FlowSession {
    pub fn new(graph: FlowGraph, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            graph,
            edits: EditHistory::new(),
            runs: RunHistory::new(),
            pricing: None,
            engine: FlowEngine::new(generator),
        }
    }

    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = Some(pricing);
        self
    }

    pub fn set_pricing(&mut self, pricing: Option<PricingTable>) {
        self.pricing = pricing;
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn edits(&self) -> &EditHistory {
        &self.edits
    }

    pub fn runs(&self) -> &RunHistory {
        &self.runs
    }

    /// Replace the whole graph, e.g. when a template is loaded
    pub fn replace_graph(&mut self, graph: FlowGraph) {
        self.edits.record(self.graph.clone());
        self.graph = graph;
    }

    pub fn add_node(&mut self, node: Node) {
        self.edits.record(self.graph.clone());
        self.graph.nodes.push(node);
    }

    /// Remove a node together with every edge touching it
    pub fn remove_node(&mut self, node_id: &str) -> Result<Node, FlowError> {
        let pos = self
            .graph
            .nodes
            .iter()
            .position(|n| n.id == node_id)
            .ok_or_else(|| FlowError::NodeNotFound(node_id.to_string()))?;

        self.edits.record(self.graph.clone());
        self.graph
            .edges
            .retain(|e| e.source != node_id && e.target != node_id);
        Ok(self.graph.nodes.remove(pos))
    }

    /// Edit a node's payload in place
    pub fn update_node<F>(&mut self, node_id: &str, update: F) -> Result<(), FlowError>
    where
        F: FnOnce(&mut NodeKind),
    {
        if self.graph.node(node_id).is_none() {
            return Err(FlowError::NodeNotFound(node_id.to_string()));
        }
        self.edits.record(self.graph.clone());
        if let Some(node) = self.graph.node_mut(node_id) {
            update(&mut node.kind);
        }
        Ok(())
    }

    /// Validate and add an edge
    pub fn connect(&mut self, connection: Connection) -> Result<&Edge, ConnectionError> {
        validate_connection(&self.graph.nodes, &self.graph.edges, &connection)?;

        self.edits.record(self.graph.clone());
        let edge = Edge {
            id: format!("edge-{}", Uuid::new_v4()),
            source: connection.source,
            target: connection.target,
            source_handle: None,
            target_handle: connection.target_handle,
        };
        log::debug!("Connected {} -> {}", edge.source, edge.target);
        self.graph.edges.push(edge);
        Ok(&self.graph.edges[self.graph.edges.len() - 1])
    }

    pub fn disconnect(&mut self, edge_id: &str) -> bool {
        if !self.graph.edges.iter().any(|e| e.id == edge_id) {
            return false;
        }
        self.edits.record(self.graph.clone());
        self.graph.edges.retain(|e| e.id != edge_id);
        true
    }

    pub fn undo(&mut self) -> bool {
        match self.edits.undo(self.graph.clone()) {
            Some(previous) => {
                self.graph = previous;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.edits.redo(self.graph.clone()) {
            Some(next) => {
                self.graph = next;
                true
            }
            None => false,
        }
    }

    /// Execute the whole graph
    pub async fn run<F>(&mut self, on_log_update: F) -> ExecutionRun
    where
        F: FnMut(Vec<NodeExecutionLog>) + Send,
    {
        let snapshot = self.graph.clone();
        let run = self
            .engine
            .execute_flow(
                &snapshot.nodes,
                &snapshot.edges,
                on_log_update,
                self.pricing.as_ref(),
            )
            .await;
        self.finish_run(run)
    }

    /// Execute `start_node_id` with its upstream and downstream closure
    pub async fn run_from<F>(&mut self, start_node_id: &str, on_log_update: F) -> ExecutionRun
    where
        F: FnMut(Vec<NodeExecutionLog>) + Send,
    {
        let snapshot = self.graph.clone();
        let run = self
            .engine
            .execute_from_node(
                start_node_id,
                &snapshot.nodes,
                &snapshot.edges,
                on_log_update,
                self.pricing.as_ref(),
            )
            .await;
        self.finish_run(run)
    }

    fn finish_run(&mut self, run: ExecutionRun) -> ExecutionRun {
        let written = apply_run_outputs(&mut self.graph, &run);
        log::debug!("Run {} wrote {} outputs back", run.id, written);
        self.runs.push(run.clone());
        run
    }
}

// SPDX-License-Identifier: MIT

//! Run orchestration
//!
//! Drives the sorter and the node executor over a graph snapshot, one
//! node at a time, and streams log snapshots to the caller.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::adk::error::FlowError;
use crate::adk::model::{TextGenerator, Usage};
use crate::flow::graph::types::{index_nodes, Edge, Node};
use crate::flow::graph::{induced_subgraph, topological_sort};

use super::executor::{ExecutionContext, NodeExecutor};
use super::types::{
    ExecutionRun, ExecutionRunStatus, NodeExecutionLog, NodeExecutionStatus, PricingTable,
    SYSTEM_NODE_TYPE,
};

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Running totals for a single run
#[derive(Default)]
struct Telemetry {
    cost_usd: f64,
    input_tokens: u64,
    output_tokens: u64,
    models: Vec<String>,
    seen: HashSet<String>,
}

impl Telemetry {
    fn record(&mut self, model_id: &str, usage: Option<&Usage>, cost: Option<f64>) {
        if self.seen.insert(model_id.to_string()) {
            self.models.push(model_id.to_string());
        }
        if let Some(usage) = usage {
            self.input_tokens += usage.input_tokens;
            self.output_tokens += usage.output_tokens;
        }
        if let Some(cost) = cost {
            self.cost_usd += cost;
        }
    }
}

/// Sequential flow execution engine
pub struct FlowEngine {
    executor: NodeExecutor,
}

impl FlowEngine {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            executor: NodeExecutor::new(generator),
        }
    }

    /// Execute every node of the graph in dependency order
    ///
    /// `on_log_update` receives a fresh copy of the log list after each
    /// node starts and after it finishes. Node failures are recorded on
    /// that node's log and never stop the run; only a cycle does, before
    /// any node executes.
    pub async fn execute_flow<F>(
        &self,
        nodes: &[Node],
        edges: &[Edge],
        mut on_log_update: F,
        pricing: Option<&PricingTable>,
    ) -> ExecutionRun
    where
        F: FnMut(Vec<NodeExecutionLog>) + Send,
    {
        let run_id = Uuid::new_v4().to_string();
        let started_at = now_millis();

        let sorted = match topological_sort(nodes, edges) {
            Ok(sorted) => sorted,
            Err(e) => {
                log::error!("Run {} aborted: {}", run_id, e);
                return Self::validation_failure(run_id, started_at, &e);
            }
        };

        log::info!("Run {} executing {} nodes", run_id, sorted.len());

        let index = index_nodes(nodes);
        let mut outputs: HashMap<String, String> = HashMap::new();
        let mut logs: Vec<NodeExecutionLog> = Vec::with_capacity(sorted.len());
        let mut telemetry = Telemetry::default();

        for node in sorted {
            logs.push(NodeExecutionLog::running(
                node.id.clone(),
                node.node_type().as_str(),
                node.label(),
                now_millis(),
            ));
            on_log_update(logs.clone());

            let result = {
                let ctx = ExecutionContext {
                    edges,
                    index: &index,
                    outputs: &outputs,
                    pricing,
                };
                self.executor.execute(node, &ctx).await
            };

            let status = match result {
                Ok(outcome) => {
                    if let Some(model_id) = outcome.model_id.as_deref() {
                        telemetry.record(model_id, outcome.usage.as_ref(), outcome.cost_usd);
                    }
                    if let Some(value) = outcome.value {
                        outputs.insert(node.id.clone(), value);
                    }
                    if let Some(entry) = logs.last_mut() {
                        entry.output = outcome.display;
                        entry.usage = outcome.usage;
                        entry.model_id = outcome.model_id;
                        entry.cost_usd = outcome.cost_usd;
                    }
                    log::info!("Node {} completed", node.id);
                    NodeExecutionStatus::Completed
                }
                Err(e) => {
                    log::error!("Node {} failed: {}", node.id, e);
                    if let Some(entry) = logs.last_mut() {
                        entry.error = Some(e.to_string());
                    }
                    NodeExecutionStatus::Error
                }
            };

            if let Some(entry) = logs.last_mut() {
                entry.finish(status, now_millis());
            }
            on_log_update(logs.clone());
        }

        let completed_at = now_millis();
        let status = if logs.iter().any(|l| l.status == NodeExecutionStatus::Error) {
            ExecutionRunStatus::Error
        } else {
            ExecutionRunStatus::Completed
        };

        log::info!(
            "Run {} finished with status {:?} in {}ms",
            run_id,
            status,
            completed_at - started_at
        );

        ExecutionRun {
            id: run_id,
            status,
            started_at,
            completed_at: Some(completed_at),
            total_duration_ms: Some(completed_at - started_at),
            logs,
            total_cost_usd: Some(telemetry.cost_usd),
            total_input_tokens: Some(telemetry.input_tokens),
            total_output_tokens: Some(telemetry.output_tokens),
            models: Some(telemetry.models),
        }
    }

    /// Re-run `start_node_id` together with everything upstream and downstream of it
    pub async fn execute_from_node<F>(
        &self,
        start_node_id: &str,
        nodes: &[Node],
        edges: &[Edge],
        on_log_update: F,
        pricing: Option<&PricingTable>,
    ) -> ExecutionRun
    where
        F: FnMut(Vec<NodeExecutionLog>) + Send,
    {
        let sub = induced_subgraph(start_node_id, nodes, edges);
        log::info!(
            "Partial run from {}: {} of {} nodes",
            start_node_id,
            sub.nodes.len(),
            nodes.len()
        );
        self.execute_flow(&sub.nodes, &sub.edges, on_log_update, pricing)
            .await
    }

    /// An errored run holding a single synthetic validation entry
    fn validation_failure(run_id: String, started_at: i64, error: &FlowError) -> ExecutionRun {
        let completed_at = now_millis();
        let mut entry = NodeExecutionLog::running("graph", SYSTEM_NODE_TYPE, "Graph Validation", started_at);
        entry.error = Some(error.to_string());
        entry.finish(NodeExecutionStatus::Error, completed_at);
        entry.duration_ms = Some(0);

        ExecutionRun {
            id: run_id,
            status: ExecutionRunStatus::Error,
            started_at,
            completed_at: Some(completed_at),
            total_duration_ms: Some(completed_at - started_at),
            logs: vec![entry],
            total_cost_usd: Some(0.0),
            total_input_tokens: None,
            total_output_tokens: None,
            models: None,
        }
    }
}

//! Execution record types
//!
//! These are the wire shapes streamed to callers while a run is in
//! progress and returned once it finishes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::adk::model::Usage;

/// Node type recorded for the synthetic graph-validation entry
pub const SYSTEM_NODE_TYPE: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeExecutionStatus {
    Pending,
    Running,
    Completed,
    Error,
}

impl NodeExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// One node's record within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecutionLog {
    pub node_id: String,
    pub node_type: String,
    pub node_label: String,
    pub status: NodeExecutionStatus,
    /// Unix epoch milliseconds
    pub started_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, rename = "costUSD", skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

impl NodeExecutionLog {
    /// A fresh `running` entry
    pub fn running(
        node_id: impl Into<String>,
        node_type: impl Into<String>,
        node_label: impl Into<String>,
        started_at: i64,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            node_type: node_type.into(),
            node_label: node_label.into(),
            status: NodeExecutionStatus::Running,
            started_at,
            completed_at: None,
            duration_ms: None,
            output: None,
            error: None,
            usage: None,
            model_id: None,
            cost_usd: None,
        }
    }

    /// Move to a terminal state; a terminal entry is never touched again
    pub fn finish(&mut self, status: NodeExecutionStatus, completed_at: i64) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.completed_at = Some(completed_at);
        self.duration_ms = Some((completed_at - self.started_at).max(0));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionRunStatus {
    Running,
    Completed,
    Error,
}

/// Aggregate record of one full or partial run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRun {
    pub id: String,
    pub status: ExecutionRunStatus,
    pub started_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<i64>,
    pub logs: Vec<NodeExecutionLog>,
    #[serde(default, rename = "totalCostUSD", skip_serializing_if = "Option::is_none")]
    pub total_cost_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_output_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,
}

impl ExecutionRun {
    /// Log entry for `node_id`, if the node took part in the run
    pub fn log_for(&self, node_id: &str) -> Option<&NodeExecutionLog> {
        self.logs.iter().find(|l| l.node_id == node_id)
    }

    pub fn has_errors(&self) -> bool {
        self.logs
            .iter()
            .any(|l| l.status == NodeExecutionStatus::Error)
    }
}

/// Per-token prices for one model, as decimal strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input: String,
    pub output: String,
}

impl ModelPricing {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Cost of a call, or `None` if either price does not parse
    pub fn cost(&self, usage: &Usage) -> Option<f64> {
        let input = self.input.trim().parse::<f64>().ok()?;
        let output = self.output.trim().parse::<f64>().ok()?;
        Some(usage.input_tokens as f64 * input + usage.output_tokens as f64 * output)
    }
}

/// Model id to pricing lookup supplied by the caller
pub type PricingTable = HashMap<String, ModelPricing>;

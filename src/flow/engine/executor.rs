// SPDX-License-Identifier: MIT

//! Per-node evaluation
//!
//! One exhaustive match over [`NodeKind`]. Only LLM nodes suspend; every
//! other node type is evaluated from its own payload and the outputs of
//! nodes that already ran.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adk::error::FlowError;
use crate::adk::model::{GenerateRequest, TextGenerator, Usage};
use crate::flow::graph::types::{
    Edge, LlmData, Node, NodeKind, NodeType, LLM_MODEL_HANDLE, LLM_PROMPT_HANDLE,
};
use crate::flow::graph::{resolve_input, upstream_output};

use super::types::PricingTable;

pub const AGENT_PLACEHOLDER: &str = "Agent execution not yet supported";
pub const CONDITION_PLACEHOLDER: &str = "Condition evaluation not yet supported";
pub const TOOL_PLACEHOLDER: &str = "Tool execution not yet supported";

/// Read-only view of the run a node executes in
pub struct ExecutionContext<'a> {
    pub edges: &'a [Edge],
    pub index: &'a HashMap<&'a str, &'a Node>,
    pub outputs: &'a HashMap<String, String>,
    pub pricing: Option<&'a PricingTable>,
}

/// What a node produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeOutcome {
    /// Value made available to downstream nodes
    pub value: Option<String>,
    /// Text shown in the node's log entry
    pub display: Option<String>,
    pub usage: Option<Usage>,
    pub model_id: Option<String>,
    pub cost_usd: Option<f64>,
}

impl NodeOutcome {
    fn value(text: String) -> Self {
        Self {
            display: Some(text.clone()),
            value: Some(text),
            ..Default::default()
        }
    }

    fn display_only(text: &str) -> Self {
        Self {
            display: Some(text.to_string()),
            ..Default::default()
        }
    }
}

/// Evaluates single nodes
pub struct NodeExecutor {
    generator: Arc<dyn TextGenerator>,
}

impl NodeExecutor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Evaluate `node`; failures are returned, never panicked
    pub async fn execute(
        &self,
        node: &Node,
        ctx: &ExecutionContext<'_>,
    ) -> Result<NodeOutcome, FlowError> {
        match &node.kind {
            NodeKind::TextInput(data) => Ok(NodeOutcome::value(data.text.clone())),
            NodeKind::Document(data) => Ok(NodeOutcome::value(data.content.clone())),
            NodeKind::Model(data) => Ok(NodeOutcome {
                value: Some(data.model_id.clone()),
                display: Some(format!("Model: {}", data.model_id)),
                ..Default::default()
            }),
            NodeKind::Llm(data) => self.execute_llm(node, data, ctx).await,
            NodeKind::TextOutput(_) => Ok(upstream_output(&node.id, ctx.edges, ctx.outputs)
                .map(|v| NodeOutcome::value(v.to_string()))
                .unwrap_or_default()),
            NodeKind::Agent(_) => Ok(NodeOutcome::display_only(AGENT_PLACEHOLDER)),
            NodeKind::Condition(_) => Ok(NodeOutcome::display_only(CONDITION_PLACEHOLDER)),
            NodeKind::Tool(_) => Ok(NodeOutcome::display_only(TOOL_PLACEHOLDER)),
        }
    }

    /// Build the generation request for an LLM node
    ///
    /// The model comes from a connected model node, then the node's own id.
    /// The prompt must be a non-empty upstream output.
    pub fn build_llm_request(
        node: &Node,
        data: &LlmData,
        ctx: &ExecutionContext<'_>,
    ) -> Result<GenerateRequest, FlowError> {
        let connected_model = resolve_input(
            &node.id,
            Some(LLM_MODEL_HANDLE),
            NodeType::Model,
            ctx.edges,
            ctx.index,
        )
        .and_then(|m| match &m.kind {
            NodeKind::Model(model) => Some(model.model_id.clone()),
            _ => None,
        });

        let model_id = match connected_model {
            Some(id) => id,
            None => data.model_id.clone(),
        };
        if model_id.is_empty() {
            return Err(FlowError::NoModelConfigured);
        }

        let user_prompt = resolve_input(
            &node.id,
            Some(LLM_PROMPT_HANDLE),
            NodeType::TextInput,
            ctx.edges,
            ctx.index,
        )
        .and_then(|p| ctx.outputs.get(&p.id))
        .cloned()
        .unwrap_or_default();
        if user_prompt.is_empty() {
            return Err(FlowError::NoPromptConnected);
        }

        Ok(GenerateRequest {
            model_id,
            system_prompt: Some(data.system_prompt.clone()).filter(|s| !s.is_empty()),
            user_prompt,
            temperature: data.temperature,
            max_tokens: data.max_tokens,
        })
    }

    async fn execute_llm(
        &self,
        node: &Node,
        data: &LlmData,
        ctx: &ExecutionContext<'_>,
    ) -> Result<NodeOutcome, FlowError> {
        let request = Self::build_llm_request(node, data, ctx)?;

        log::info!("Node {} calling model {}", node.id, request.model_id);
        let response = self.generator.generate(&request).await?;

        let cost_usd = match (response.usage.as_ref(), ctx.pricing) {
            (Some(usage), Some(table)) => match table.get(&request.model_id) {
                Some(pricing) => {
                    let cost = pricing.cost(usage);
                    if cost.is_none() {
                        log::warn!("Unparsable pricing for model {}", request.model_id);
                    }
                    cost
                }
                None => None,
            },
            _ => None,
        };

        Ok(NodeOutcome {
            display: Some(response.text.clone()),
            value: Some(response.text),
            usage: response.usage,
            model_id: Some(request.model_id),
            cost_usd,
        })
    }
}

//! Connection validation for edges drawn between nodes

use thiserror::Error;

use super::types::{
    Edge, Node, NodeType, AGENT_CONTEXT_HANDLE, AGENT_MODEL_HANDLE, AGENT_PROMPT_HANDLE,
    LLM_MODEL_HANDLE, LLM_PROMPT_HANDLE,
};

/// A proposed edge, before it has an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub source: String,
    pub target: String,
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            target_handle: None,
        }
    }

    pub fn with_target_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("A node cannot connect to itself")]
    SelfLoop,

    #[error("Node '{0}' not found")]
    UnknownNode(String),

    #[error("Handle '{handle}' on {target} does not accept {source_type} nodes")]
    HandleMismatch {
        handle: String,
        target: NodeType,
        source_type: NodeType,
    },

    #[error("Connection already exists")]
    Duplicate,
}

const MODEL_SOURCES: &[NodeType] = &[NodeType::Model];
const PROMPT_SOURCES: &[NodeType] = &[NodeType::TextInput];
const CONTEXT_SOURCES: &[NodeType] = &[NodeType::Document, NodeType::TextInput];

/// Source types accepted by a typed handle; `None` means unconstrained
fn accepted_sources(target: NodeType, handle: &str) -> Option<&'static [NodeType]> {
    match (target, handle) {
        (NodeType::Llm, LLM_MODEL_HANDLE) | (NodeType::Agent, AGENT_MODEL_HANDLE) => {
            Some(MODEL_SOURCES)
        }
        (NodeType::Llm, LLM_PROMPT_HANDLE) | (NodeType::Agent, AGENT_PROMPT_HANDLE) => {
            Some(PROMPT_SOURCES)
        }
        (NodeType::Agent, AGENT_CONTEXT_HANDLE) => Some(CONTEXT_SOURCES),
        _ => None,
    }
}

/// Check whether `connection` may be added to the graph
pub fn validate_connection(
    nodes: &[Node],
    edges: &[Edge],
    connection: &Connection,
) -> Result<(), ConnectionError> {
    if connection.source == connection.target {
        return Err(ConnectionError::SelfLoop);
    }

    let find = |id: &str| {
        nodes
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| ConnectionError::UnknownNode(id.to_string()))
    };
    let source = find(&connection.source)?;
    let target = find(&connection.target)?;

    if let Some(handle) = connection.target_handle.as_deref() {
        if let Some(allowed) = accepted_sources(target.node_type(), handle) {
            if !allowed.contains(&source.node_type()) {
                return Err(ConnectionError::HandleMismatch {
                    handle: handle.to_string(),
                    target: target.node_type(),
                    source_type: source.node_type(),
                });
            }
        }
    }

    let duplicate = edges.iter().any(|e| {
        e.source == connection.source
            && e.target == connection.target
            && e.target_handle == connection.target_handle
    });
    if duplicate {
        return Err(ConnectionError::Duplicate);
    }

    Ok(())
}

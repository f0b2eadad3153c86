// SPDX-License-Identifier: MIT

//! Typed error handling for kinetic-flow
//!
//! `FlowError` covers graph validation, node execution and loading.
//! `ModelError` covers the text-generation layer and is folded into
//! `FlowError::RemoteCallFailed` at the node boundary.

use thiserror::Error;

/// Top-level error type for kinetic-flow
#[derive(Debug, Error)]
pub enum FlowError {
    /// The graph is not a DAG; fatal to the whole run
    #[error("Cycle detected in the flow graph: {}", .0.join(", "))]
    CycleDetected(Vec<String>),

    /// Two nodes share an id; the graph cannot be ordered
    #[error("Duplicate node id in the flow graph: {0}")]
    DuplicateNodeId(String),

    /// LLM node has neither a connected model node nor its own model id
    #[error("No model connected or configured")]
    NoModelConfigured,

    /// LLM node has no upstream prompt, or the prompt is empty
    #[error("No prompt connected or prompt is empty")]
    NoPromptConnected,

    /// The generation endpoint rejected the request or failed
    #[error("{0}")]
    RemoteCallFailed(String),

    /// A session edit named a node that is not in the graph
    #[error("Node '{0}' not found")]
    NodeNotFound(String),

    /// Configuration errors (missing env vars, invalid config)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Server-reported failure; the message is surfaced verbatim
    #[error("{message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),

    /// Transport-level failure
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl FlowError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl ModelError {
    /// Create a remote error carrying the server's message
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// HTTP status reported by the endpoint, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => *status,
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<ModelError> for FlowError {
    fn from(err: ModelError) -> Self {
        Self::RemoteCallFailed(err.to_string())
    }
}

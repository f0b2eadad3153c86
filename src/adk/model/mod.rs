// SPDX-License-Identifier: MIT

//! Model module - text-generation trait and implementations
//!
//! This module provides the core `TextGenerator` trait and its wire types.
//! Implementations are in their own submodules:
//! - [remote] - POSTs to a flow execute endpoint
//! - [openai] - OpenAI-compatible chat completions (AI gateway)
//! - [gateway] - model catalogue and credit balance

pub mod gateway;
pub mod openai;
pub mod remote;

use crate::adk::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default sampling temperature when a node leaves it unset
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default output token cap when a node leaves it unset
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// A single text-generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub model_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_prompt: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

/// Token usage reported by the endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// Successful generation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub finish_reason: String,
}

/// Core trait for text-generation backends
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ModelError>;
}

/// Pick a backend: the remote execute endpoint if configured, else the gateway
pub fn generator_from_config(
    config: &crate::flow::config::FlowConfig,
) -> Result<Arc<dyn TextGenerator>, ModelError> {
    match config.execute_url.as_deref() {
        Some(url) => {
            log::info!("Using remote execute endpoint: {}", url);
            Ok(Arc::new(remote::RemoteGenerator::new(url)))
        }
        None => {
            log::info!("Using AI gateway at {}", config.gateway_base_url);
            Ok(Arc::new(openai::OpenAIModel::from_config(config)?))
        }
    }
}

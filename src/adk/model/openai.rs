// SPDX-License-Identifier: MIT

//! OpenAI-compatible chat completions, as served by the AI gateway

use super::{GenerateRequest, GenerateResponse, TextGenerator, Usage};
use crate::adk::error::ModelError;
use crate::flow::config::FlowConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// Chat-completions backend; the model is chosen per request
pub struct OpenAIModel {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIModel {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Create from configuration
    ///
    /// Requires `AI_GATEWAY_API_KEY` to be set.
    pub fn from_config(config: &FlowConfig) -> Result<Self, ModelError> {
        let api_key = config
            .gateway_api_key
            .clone()
            .ok_or_else(|| ModelError::ApiKeyMissing("AI gateway".to_string()))?;
        Ok(Self::new(api_key, config.gateway_base_url.clone()))
    }

    /// Build the chat-completions body for a generation request
    fn request_body(request: &GenerateRequest) -> serde_json::Value {
        let mut messages = Vec::new();
        if let Some(system) = request.system_prompt.as_deref().filter(|s| !s.is_empty()) {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.user_prompt }));

        json!({
            "model": request.model_id,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }

    /// Parse a chat-completions response
    fn parse_openai_response(response: &serde_json::Value) -> Result<GenerateResponse, ModelError> {
        let choice = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ModelError::InvalidResponse("No choices in response".to_string()))?;

        let text = choice["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("unknown")
            .to_string();

        let usage = response.get("usage").filter(|u| u.is_object()).map(|u| Usage {
            input_tokens: u["prompt_tokens"].as_u64().unwrap_or(0),
            output_tokens: u["completion_tokens"].as_u64().unwrap_or(0),
        });

        Ok(GenerateResponse {
            text,
            usage,
            finish_reason,
        })
    }

    /// Extract a readable message from an error body
    fn error_message(status: u16, body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v["error"]["message"]
                    .as_str()
                    .or_else(|| v["error"].as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("API error: {}", status))
    }
}

#[async_trait]
impl TextGenerator for OpenAIModel {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(request);

        log::debug!(
            "Chat completions request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await?;
            return Err(ModelError::remote(
                Some(status.as_u16()),
                Self::error_message(status.as_u16(), &text),
            ));
        }

        let resp_json: serde_json::Value = resp.json().await?;
        log::info!("Generation finished for model {}", request.model_id);

        Self::parse_openai_response(&resp_json)
    }
}

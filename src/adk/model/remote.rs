// SPDX-License-Identifier: MIT

//! Remote generator - POSTs requests to a flow execute endpoint

use super::{GenerateRequest, GenerateResponse, TextGenerator};
use crate::adk::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

/// Text generator backed by an `/api/flow/execute`-style HTTP endpoint
pub struct RemoteGenerator {
    client: Client,
    endpoint: String,
}

impl RemoteGenerator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Map a status and raw body onto a result
    ///
    /// A non-success status or an `error` field is a failure; the server's
    /// message wins over the generic status message.
    fn interpret(status: u16, success: bool, body: &str) -> Result<GenerateResponse, ModelError> {
        let envelope = serde_json::from_str::<Value>(body).ok();

        if let Some(message) = envelope
            .as_ref()
            .and_then(|v| v.get("error"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
        {
            return Err(ModelError::remote(Some(status), message));
        }
        if !success {
            return Err(ModelError::remote(
                Some(status),
                format!("API error: {}", status),
            ));
        }

        envelope
            .and_then(|v| serde_json::from_value::<GenerateResponse>(v).ok())
            .ok_or_else(|| ModelError::InvalidResponse(body.chars().take(200).collect()))
    }
}

#[async_trait]
impl TextGenerator for RemoteGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ModelError> {
        log::debug!(
            "Remote execute request: {}",
            serde_json::to_string(request).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        Self::interpret(status.as_u16(), status.is_success(), &body)
    }
}

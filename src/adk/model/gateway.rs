// SPDX-License-Identifier: MIT

//! AI gateway catalogue - available models, their pricing, and credit balance

use crate::adk::error::ModelError;
use crate::flow::config::FlowConfig;
use crate::flow::engine::types::{ModelPricing, PricingTable};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A model advertised by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayModel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "owned_by")]
    pub provider: String,
    #[serde(default, alias = "context_window", skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<ModelPricing>,
}

/// Client for the gateway's catalogue endpoints
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GatewayClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &FlowConfig) -> Result<Self, ModelError> {
        let api_key = config
            .gateway_api_key
            .clone()
            .ok_or_else(|| ModelError::ApiKeyMissing("AI gateway".to_string()))?;
        Ok(Self::new(api_key, config.gateway_base_url.clone()))
    }

    async fn get_json(&self, path: &str) -> Result<Value, ModelError> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ModelError::remote(
                Some(status.as_u16()),
                format!(
                    "Gateway {} error: {}",
                    path,
                    status.canonical_reason().unwrap_or("request failed")
                ),
            ));
        }

        Ok(resp.json().await?)
    }

    /// Fetch the model catalogue
    pub async fn list_models(&self) -> Result<Vec<GatewayModel>, ModelError> {
        let body = self.get_json("models").await?;
        let models = parse_model_list(body)?;
        log::info!("Fetched {} models from gateway", models.len());
        Ok(models)
    }

    /// Fetch the raw credit balance document
    pub async fn credits(&self) -> Result<Value, ModelError> {
        self.get_json("credits").await
    }
}

/// Accepts `{data: [...]}`, `{models: [...]}` or a bare array
fn parse_model_list(body: Value) -> Result<Vec<GatewayModel>, ModelError> {
    let list = match body {
        Value::Object(mut obj) => obj
            .remove("data")
            .or_else(|| obj.remove("models"))
            .ok_or_else(|| ModelError::InvalidResponse("model list missing".to_string()))?,
        other => other,
    };

    serde_json::from_value(list).map_err(|e| ModelError::InvalidResponse(e.to_string()))
}

/// Build a pricing table from the models that advertise prices
pub fn pricing_from_models(models: &[GatewayModel]) -> PricingTable {
    models
        .iter()
        .filter_map(|m| m.pricing.clone().map(|p| (m.id.clone(), p)))
        .collect()
}

// SPDX-License-Identifier: MIT

//! Environment-driven configuration

use std::env;

use crate::adk::error::FlowError;

pub const DEFAULT_GATEWAY_BASE_URL: &str = "https://ai-gateway.vercel.sh/v1";
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Runtime configuration shared by the CLI and the server
#[derive(Debug, Clone, PartialEq)]
pub struct FlowConfig {
    /// Base URL of the OpenAI-compatible AI gateway
    pub gateway_base_url: String,
    /// API key for the gateway (`AI_GATEWAY_API_KEY`)
    pub gateway_api_key: Option<String>,
    /// Remote execute endpoint; when unset the gateway is called directly
    pub execute_url: Option<String>,
    /// Port for `serve`
    pub server_port: u16,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            gateway_base_url: DEFAULT_GATEWAY_BASE_URL.to_string(),
            gateway_api_key: None,
            execute_url: None,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl FlowConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, FlowError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FlowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server_port = match non_empty("FLOW_SERVER_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| FlowError::config(format!("invalid FLOW_SERVER_PORT: {}", raw)))?,
            None => DEFAULT_SERVER_PORT,
        };

        Ok(Self {
            gateway_base_url: non_empty("AI_GATEWAY_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GATEWAY_BASE_URL.to_string()),
            gateway_api_key: non_empty("AI_GATEWAY_API_KEY"),
            execute_url: non_empty("FLOW_EXECUTE_URL"),
            server_port,
        })
    }
}

// SPDX-License-Identifier: MIT

//! HTTP surface for flow execution
//!
//! `/api/flow/execute` is the generation endpoint a `RemoteGenerator`
//! talks to. The run routes execute whole graphs server-side, either
//! returning the finished run or streaming log snapshots over SSE.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::adk::error::FlowError;
use crate::adk::model::gateway::{pricing_from_models, GatewayClient};
use crate::adk::model::openai::OpenAIModel;
use crate::adk::model::{GenerateRequest, TextGenerator};
use crate::flow::config::FlowConfig;
use crate::flow::engine::types::{ExecutionRun, NodeExecutionLog, PricingTable};
use crate::flow::engine::FlowEngine;
use crate::flow::graph::{Edge, Node};
use crate::flow::templates::{find_template, templates};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub gateway: Option<Arc<GatewayClient>>,
    pub pricing: Option<Arc<PricingTable>>,
}

impl AppState {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            gateway: None,
            pricing: None,
        }
    }

    pub fn with_gateway(mut self, gateway: Arc<GatewayClient>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = Some(Arc::new(pricing));
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/flow/execute", post(execute))
        .route("/api/flow/credits", get(credits))
        .route("/api/flow/templates", get(list_templates))
        .route("/api/flow/templates/{id}", get(get_template))
        .route("/api/flow/run", post(run_flow))
        .route("/api/flow/run/stream", post(stream_flow))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Build state from configuration and serve until shutdown
pub async fn serve(config: &FlowConfig) -> Result<(), FlowError> {
    let generator = OpenAIModel::from_config(config).map_err(|e| FlowError::config(e.to_string()))?;
    let gateway = Arc::new(
        GatewayClient::from_config(config).map_err(|e| FlowError::config(e.to_string()))?,
    );

    let mut state = AppState::new(Arc::new(generator)).with_gateway(gateway.clone());
    match gateway.list_models().await {
        Ok(models) => {
            let pricing = pricing_from_models(&models);
            log::info!("Loaded pricing for {} models", pricing.len());
            state = state.with_pricing(pricing);
        }
        Err(e) => log::warn!("Failed to load model pricing, costs will be omitted: {}", e),
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server_port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn execute(State(state): State<AppState>, Json(request): Json<GenerateRequest>) -> Response {
    if request.model_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "modelId is required");
    }
    if request.user_prompt.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "userPrompt is required");
    }

    match state.generator.generate(&request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            log::error!("Generation failed for {}: {}", request.model_id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn credits(State(state): State<AppState>) -> Response {
    let Some(gateway) = state.gateway.as_ref() else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "AI Gateway API key not configured",
        );
    };

    match gateway.credits().await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            let status = e
                .status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_response(status, e.to_string())
        }
    }
}

async fn list_templates() -> Json<Value> {
    let summaries: Vec<Value> = templates()
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "name": t.name,
                "description": t.description,
            })
        })
        .collect();
    Json(json!(summaries))
}

async fn get_template(Path(id): Path<String>) -> Response {
    match find_template(&id) {
        Some(template) => Json(template).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "Template not found"),
    }
}

/// Body of the run routes
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub start_node_id: Option<String>,
    /// Overrides the server's pricing table for this run
    #[serde(default)]
    pub pricing: Option<PricingTable>,
}

/// Server-sent event payloads of the streaming run route
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RunEvent {
    Logs { logs: Vec<NodeExecutionLog> },
    Run { run: ExecutionRun },
}

async fn execute_request<F>(state: &AppState, request: &RunRequest, on_log_update: F) -> ExecutionRun
where
    F: FnMut(Vec<NodeExecutionLog>) + Send,
{
    let engine = FlowEngine::new(state.generator.clone());
    let pricing = request
        .pricing
        .as_ref()
        .or(state.pricing.as_deref());

    match request.start_node_id.as_deref() {
        Some(start) => {
            engine
                .execute_from_node(start, &request.nodes, &request.edges, on_log_update, pricing)
                .await
        }
        None => {
            engine
                .execute_flow(&request.nodes, &request.edges, on_log_update, pricing)
                .await
        }
    }
}

async fn run_flow(State(state): State<AppState>, Json(request): Json<RunRequest>) -> Json<ExecutionRun> {
    Json(execute_request(&state, &request, |_| {}).await)
}

async fn stream_flow(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let log_tx = tx.clone();
        let run = execute_request(&state, &request, move |logs| {
            let _ = log_tx.send(RunEvent::Logs { logs });
        })
        .await;
        log::info!("Streamed run {} finished", run.id);
        let _ = tx.send(RunEvent::Run { run });
    });

    let stream = UnboundedReceiverStream::new(rx).map(|event| Event::default().json_data(event));

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(1)))
}

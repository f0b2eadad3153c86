//! Integration tests for flow execution
//!
//! These tests drive the engine, session and HTTP server end-to-end using
//! mock generators.

use async_trait::async_trait;
use kinetic_flow::adk::error::ModelError;
use kinetic_flow::adk::model::remote::RemoteGenerator;
use kinetic_flow::adk::model::{GenerateRequest, GenerateResponse, TextGenerator, Usage};
use kinetic_flow::flow::engine::{
    ExecutionRun, ExecutionRunStatus, FlowEngine, ModelPricing, NodeExecutionStatus, PricingTable,
};
use kinetic_flow::flow::graph::types::{
    LlmData, ModelData, TextInputData, LLM_MODEL_HANDLE, LLM_PROMPT_HANDLE,
};
use kinetic_flow::flow::graph::{topological_sort, Edge, FlowGraph, Node, NodeKind, NodeType};
use kinetic_flow::flow::loader::GraphLoader;
use kinetic_flow::flow::server::{router, AppState};
use kinetic_flow::flow::session::FlowSession;
use kinetic_flow::flow::templates::find_template;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Mock Components
// ============================================================================

/// Mock generator with canned replies keyed by prompt
struct MockGenerator {
    replies: HashMap<String, Result<GenerateResponse, String>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    fn new() -> Self {
        Self {
            replies: HashMap::new(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn reply(mut self, prompt: &str, text: &str, input: u64, output: u64) -> Self {
        self.replies.insert(
            prompt.to_string(),
            Ok(GenerateResponse {
                text: text.to_string(),
                usage: Some(Usage {
                    input_tokens: input,
                    output_tokens: output,
                }),
                finish_reason: "stop".to_string(),
            }),
        );
        self
    }

    fn fail(mut self, prompt: &str, message: &str) -> Self {
        self.replies
            .insert(prompt.to_string(), Err(message.to_string()));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.user_prompt.clone());
        match self.replies.get(&request.user_prompt) {
            Some(Ok(resp)) => Ok(resp.clone()),
            Some(Err(msg)) => Err(ModelError::remote(Some(500), msg.clone())),
            None => Ok(GenerateResponse {
                text: format!("echo: {}", request.user_prompt),
                usage: None,
                finish_reason: "stop".to_string(),
            }),
        }
    }
}

// ============================================================================
// Graph Helpers
// ============================================================================

fn text_input(id: &str, text: &str) -> Node {
    Node::new(
        id,
        NodeKind::TextInput(TextInputData {
            label: id.to_string(),
            text: text.to_string(),
        }),
    )
}

fn model(id: &str, model_id: &str) -> Node {
    Node::new(
        id,
        NodeKind::Model(ModelData {
            model_id: model_id.to_string(),
            ..Default::default()
        }),
    )
}

fn llm(id: &str) -> Node {
    Node::new(id, NodeKind::Llm(LlmData::default()))
}

fn llm_with_model(id: &str, model_id: &str) -> Node {
    Node::new(
        id,
        NodeKind::Llm(LlmData {
            model_id: model_id.to_string(),
            ..Default::default()
        }),
    )
}

fn text_output(id: &str) -> Node {
    Node::new(id, NodeKind::default_for(NodeType::TextOutput))
}

fn edge(source: &str, target: &str) -> Edge {
    Edge::new(format!("e-{}-{}", source, target), source, target)
}

fn prompt_edge(source: &str, target: &str) -> Edge {
    edge(source, target).with_target_handle(LLM_PROMPT_HANDLE)
}

fn model_edge(source: &str, target: &str) -> Edge {
    edge(source, target).with_target_handle(LLM_MODEL_HANDLE)
}

/// textInput("hello") -> llm(test/model) -> textOutput
fn hello_graph() -> (Vec<Node>, Vec<Edge>) {
    (
        vec![
            text_input("in", "hello"),
            llm_with_model("llm", "test/model"),
            text_output("out"),
        ],
        vec![prompt_edge("in", "llm"), edge("llm", "out")],
    )
}

fn pricing() -> PricingTable {
    let mut table = PricingTable::new();
    table.insert(
        "test/model".to_string(),
        ModelPricing::new("0.000003", "0.000015"),
    );
    table
}

async fn run(
    generator: Arc<MockGenerator>,
    nodes: &[Node],
    edges: &[Edge],
    pricing: Option<&PricingTable>,
) -> ExecutionRun {
    FlowEngine::new(generator)
        .execute_flow(nodes, edges, |_| {}, pricing)
        .await
}

// ============================================================================
// Engine Tests
// ============================================================================

#[tokio::test]
async fn test_hello_world_pipeline() {
    let generator = Arc::new(MockGenerator::new().reply("hello", "world", 5, 1));
    let (nodes, edges) = hello_graph();

    let run = run(generator.clone(), &nodes, &edges, None).await;

    assert_eq!(run.status, ExecutionRunStatus::Completed);
    assert_eq!(run.log_for("out").unwrap().output.as_deref(), Some("world"));
    assert_eq!(run.total_input_tokens, Some(5));
    assert_eq!(run.total_output_tokens, Some(1));
    assert_eq!(run.models, Some(vec!["test/model".to_string()]));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_order_respects_every_edge() {
    // Two interleaved chains sharing a sink, declared out of order
    let nodes = vec![
        text_output("sink"),
        llm_with_model("l2", "m"),
        text_input("t2", "second"),
        llm_with_model("l1", "m"),
        text_input("t1", "first"),
    ];
    let edges = vec![
        prompt_edge("t1", "l1"),
        prompt_edge("t2", "l2"),
        edge("l1", "sink"),
        edge("l2", "sink"),
    ];

    let sorted = topological_sort(&nodes, &edges).unwrap();
    let pos: HashMap<&str, usize> = sorted
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();
    for e in &edges {
        assert!(pos[e.source.as_str()] < pos[e.target.as_str()], "{:?}", e);
    }

    let generator = Arc::new(MockGenerator::new());
    let run = run(generator.clone(), &nodes, &edges, None).await;
    let order: Vec<&str> = run.logs.iter().map(|l| l.node_id.as_str()).collect();
    let run_pos = |id: &str| order.iter().position(|n| *n == id).unwrap();
    for e in &edges {
        assert!(run_pos(&e.source) < run_pos(&e.target));
    }
    assert_eq!(generator.calls(), 2);
}

#[tokio::test]
async fn test_cycle_aborts_before_any_node() {
    let generator = Arc::new(MockGenerator::new());
    let nodes = vec![text_input("a", "x"), llm_with_model("b", "m"), llm_with_model("c", "m")];
    let edges = vec![prompt_edge("a", "b"), prompt_edge("b", "c"), edge("c", "b")];

    let run = run(generator.clone(), &nodes, &edges, None).await;

    assert_eq!(run.status, ExecutionRunStatus::Error);
    assert_eq!(run.logs.len(), 1);
    assert_eq!(run.logs[0].node_type, "system");
    assert_eq!(run.logs[0].node_id, "graph");
    assert_eq!(run.total_cost_usd, Some(0.0));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_unconfigured_llm_never_calls_endpoint() {
    let generator = Arc::new(MockGenerator::new());
    let nodes = vec![text_input("in", "hello"), llm("llm"), text_output("out")];
    let edges = vec![prompt_edge("in", "llm"), edge("llm", "out")];

    let run = run(generator.clone(), &nodes, &edges, None).await;

    let entry = run.log_for("llm").unwrap();
    assert_eq!(entry.status, NodeExecutionStatus::Error);
    assert_eq!(entry.error.as_deref(), Some("No model connected or configured"));
    assert_eq!(generator.calls(), 0);
    assert_eq!(run.status, ExecutionRunStatus::Error);
}

#[tokio::test]
async fn test_connected_model_wins_over_own_model_id() {
    let generator = Arc::new(MockGenerator::new().reply("hello", "world", 1, 1));
    let nodes = vec![
        model("m", "connected/model"),
        text_input("in", "hello"),
        llm_with_model("llm", "own/model"),
    ];
    let edges = vec![model_edge("m", "llm"), prompt_edge("in", "llm")];

    let run = run(generator, &nodes, &edges, None).await;

    assert_eq!(
        run.log_for("llm").unwrap().model_id.as_deref(),
        Some("connected/model")
    );
}

#[tokio::test]
async fn test_identical_runs_give_identical_cost() {
    let (nodes, edges) = hello_graph();
    let table = pricing();

    let first = run(
        Arc::new(MockGenerator::new().reply("hello", "world", 1000, 500)),
        &nodes,
        &edges,
        Some(&table),
    )
    .await;
    let second = run(
        Arc::new(MockGenerator::new().reply("hello", "world", 1000, 500)),
        &nodes,
        &edges,
        Some(&table),
    )
    .await;

    let cost = first.total_cost_usd.unwrap();
    assert!((cost - (1000.0 * 0.000003 + 500.0 * 0.000015)).abs() < 1e-12);
    assert_eq!(first.total_cost_usd, second.total_cost_usd);
}

#[tokio::test]
async fn test_downstream_of_failure_reaches_terminal_state() {
    let generator = Arc::new(MockGenerator::new().fail("hello", "rate limited"));
    let nodes = vec![
        text_input("in", "hello"),
        llm_with_model("first", "m"),
        llm_with_model("second", "m"),
        text_output("out"),
    ];
    let edges = vec![
        prompt_edge("in", "first"),
        prompt_edge("first", "second"),
        edge("second", "out"),
    ];

    let run = run(generator.clone(), &nodes, &edges, None).await;

    assert_eq!(run.logs.len(), 4);
    assert!(run.logs.iter().all(|l| l.status.is_terminal()));
    assert_eq!(run.log_for("first").unwrap().error.as_deref(), Some("rate limited"));
    assert_eq!(
        run.log_for("second").unwrap().status,
        NodeExecutionStatus::Error
    );
    assert_eq!(run.log_for("out").unwrap().status, NodeExecutionStatus::Completed);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_partial_run_skips_unrelated_branch() {
    // a -> b -> c -> d, plus an unrelated x -> y
    let generator = Arc::new(MockGenerator::new());
    let nodes = vec![
        text_input("a", "start"),
        llm_with_model("b", "m"),
        llm_with_model("c", "m"),
        text_output("d"),
        text_input("x", "other"),
        llm_with_model("y", "m"),
    ];
    let edges = vec![
        prompt_edge("a", "b"),
        prompt_edge("b", "c"),
        edge("c", "d"),
        prompt_edge("x", "y"),
    ];

    let run = FlowEngine::new(generator.clone())
        .execute_from_node("c", &nodes, &edges, |_| {}, None)
        .await;

    let ran: HashSet<&str> = run.logs.iter().map(|l| l.node_id.as_str()).collect();
    assert_eq!(ran, HashSet::from(["a", "b", "c", "d"]));
    assert!(!generator.prompts.lock().unwrap().contains(&"other".to_string()));
    assert_eq!(
        run.log_for("d").unwrap().output.as_deref(),
        Some("echo: echo: start")
    );
}

#[tokio::test]
async fn test_snapshots_are_fresh_copies() {
    let generator = Arc::new(MockGenerator::new().reply("hello", "world", 5, 1));
    let (nodes, edges) = hello_graph();
    let mut snapshots = Vec::new();

    let run = FlowEngine::new(generator)
        .execute_flow(&nodes, &edges, |logs| snapshots.push(logs), None)
        .await;

    assert_eq!(snapshots.len(), 6);
    // The first snapshot still shows the node as running
    assert_eq!(snapshots[0][0].status, NodeExecutionStatus::Running);
    assert_eq!(snapshots[5], run.logs);
}

// ============================================================================
// Session and Template Tests
// ============================================================================

#[tokio::test]
async fn test_template_session_round_trip() {
    let template = find_template("simple-llm").unwrap();
    let generator = Arc::new(MockGenerator::new().reply(
        "Hi! Tell me a fun fact about space.",
        "Space is silent.",
        12,
        4,
    ));
    let mut pricing = PricingTable::new();
    pricing.insert("openai/gpt-4o-mini".to_string(), ModelPricing::new("0.01", "0.02"));

    let mut session = FlowSession::new(template.graph.clone(), generator).with_pricing(pricing);
    let run = session.run(|_| {}).await;

    assert_eq!(run.status, ExecutionRunStatus::Completed);
    assert!((run.total_cost_usd.unwrap() - 0.2).abs() < 1e-9);
    match &session.graph().node("t-output").unwrap().kind {
        NodeKind::TextOutput(data) => assert_eq!(data.text, "Space is silent."),
        other => panic!("Expected textOutput, got {:?}", other),
    }
    assert_eq!(session.runs().len(), 1);
}

#[test]
fn test_loaded_graph_matches_wire_shape() {
    let graph: FlowGraph = GraphLoader::parse_json(
        &json!({
            "nodes": [
                {"id": "in", "type": "textInput", "data": {"label": "Prompt", "text": "hello"}},
                {"id": "llm", "type": "llm", "data": {"modelId": "test/model"}},
                {"id": "out", "type": "textOutput", "data": {"label": "Output", "text": ""}}
            ],
            "edges": [
                {"id": "e1", "source": "in", "target": "llm", "targetHandle": "llm-prompt"},
                {"id": "e2", "source": "llm", "target": "out"}
            ]
        })
        .to_string(),
    )
    .unwrap();

    let (nodes, edges) = hello_graph();
    assert_eq!(graph.nodes.len(), nodes.len());
    assert_eq!(graph.edges.len(), edges.len());
    assert_eq!(graph.nodes[1].node_type(), NodeType::Llm);
}

// ============================================================================
// HTTP Tests
// ============================================================================

/// Serve the router on an ephemeral port and return its base URL
async fn spawn_server(generator: Arc<dyn TextGenerator>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(AppState::new(generator));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_remote_generator_against_server() {
    let mock = Arc::new(MockGenerator::new().reply("hello", "world", 5, 1));
    let base = spawn_server(mock.clone()).await;
    let remote = Arc::new(RemoteGenerator::new(format!("{}/api/flow/execute", base)));

    let (nodes, edges) = hello_graph();
    let run = FlowEngine::new(remote)
        .execute_flow(&nodes, &edges, |_| {}, None)
        .await;

    assert_eq!(run.status, ExecutionRunStatus::Completed);
    assert_eq!(run.log_for("out").unwrap().output.as_deref(), Some("world"));
    assert_eq!(run.total_input_tokens, Some(5));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_remote_generator_surfaces_server_errors() {
    let mock = Arc::new(MockGenerator::new().fail("hello", "model overloaded"));
    let base = spawn_server(mock).await;
    let remote = RemoteGenerator::new(format!("{}/api/flow/execute", base));

    let mut request = GenerateRequest {
        model_id: "test/model".to_string(),
        system_prompt: None,
        user_prompt: "hello".to_string(),
        temperature: 0.7,
        max_tokens: 1024,
    };
    let err = remote.generate(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "model overloaded");
    assert_eq!(err.status(), Some(500));

    request.user_prompt.clear();
    let err = remote.generate(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "userPrompt is required");
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn test_run_routes() {
    let mock = Arc::new(MockGenerator::new().reply("hello", "world", 5, 1));
    let base = spawn_server(mock).await;
    let client = reqwest::Client::new();
    let (nodes, edges) = hello_graph();
    let body = json!({ "nodes": nodes, "edges": edges });

    let run: ExecutionRun = client
        .post(format!("{}/api/flow/run", base))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(run.log_for("out").unwrap().output.as_deref(), Some("world"));

    let stream = client
        .post(format!("{}/api/flow/run/stream", base))
        .json(&body)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let events: Vec<Value> = stream
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect();
    assert_eq!(events.len(), 7);
    assert!(events[..6].iter().all(|e| e["type"] == "logs"));
    assert_eq!(events[6]["type"], "run");
    assert_eq!(events[6]["run"]["status"], "completed");
}

#[tokio::test]
async fn test_health_and_templates() {
    let base = spawn_server(Arc::new(MockGenerator::new())).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/api/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let resp = client
        .get(format!("{}/api/flow/templates/simple-llm", base))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let template: Value = resp.json().await.unwrap();
    assert_eq!(template["nodes"].as_array().unwrap().len(), 4);

    let missing = client
        .get(format!("{}/api/flow/templates/nope", base))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn test_run_route_rejects_duplicate_node_ids() {
    let mock = Arc::new(MockGenerator::new());
    let base = spawn_server(mock.clone()).await;
    let body = json!({
        "nodes": [text_input("a", "x"), text_input("a", "y"), text_output("b")],
        "edges": [edge("a", "b")]
    });

    let run: ExecutionRun = reqwest::Client::new()
        .post(format!("{}/api/flow/run", base))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(run.status, ExecutionRunStatus::Error);
    assert_eq!(run.logs.len(), 1);
    assert_eq!(run.logs[0].node_type, "system");
    assert_eq!(mock.calls(), 0);
}

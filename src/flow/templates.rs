//! Built-in starter graphs

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::flow::graph::types::{
    LlmData, ModelData, Position, TextInputData, TextOutputData, LLM_MODEL_HANDLE,
    LLM_PROMPT_HANDLE,
};
use crate::flow::graph::{Edge, FlowGraph, Node, NodeKind};

#[derive(Debug, Clone, Serialize)]
pub struct FlowTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(flatten)]
    pub graph: FlowGraph,
}

fn placed(id: &str, kind: NodeKind, x: f64, y: f64) -> Node {
    Node {
        position: Some(Position { x, y }),
        ..Node::new(id, kind)
    }
}

/// textInput + model feeding an LLM that writes to a textOutput
fn chat_graph(
    prompt: TextInputData,
    model: ModelData,
    llm: LlmData,
    output_label: &str,
    llm_x: f64,
    output_at: (f64, f64),
) -> FlowGraph {
    let nodes = vec![
        placed("t-input", NodeKind::TextInput(prompt), 50.0, 120.0),
        placed("t-model", NodeKind::Model(model), 50.0, 0.0),
        placed("t-llm", NodeKind::Llm(llm), llm_x, 60.0),
        placed(
            "t-output",
            NodeKind::TextOutput(TextOutputData {
                label: output_label.to_string(),
                ..Default::default()
            }),
            output_at.0,
            output_at.1,
        ),
    ];
    let edges = vec![
        Edge::new("e-model-llm", "t-model", "t-llm").with_target_handle(LLM_MODEL_HANDLE),
        Edge::new("e-input-llm", "t-input", "t-llm").with_target_handle(LLM_PROMPT_HANDLE),
        Edge::new("e-llm-output", "t-llm", "t-output"),
    ];
    FlowGraph::new(nodes, edges)
}

static TEMPLATES: Lazy<Vec<FlowTemplate>> = Lazy::new(|| {
    vec![
        FlowTemplate {
            id: "blank",
            name: "Blank",
            description: "Start with an empty canvas",
            graph: FlowGraph::default(),
        },
        FlowTemplate {
            id: "simple-llm",
            name: "Simple LLM",
            description: "Text Input → LLM → Output",
            graph: chat_graph(
                TextInputData {
                    label: "Prompt".to_string(),
                    text: "Hi! Tell me a fun fact about space.".to_string(),
                },
                ModelData {
                    model_id: "openai/gpt-4o-mini".to_string(),
                    ..Default::default()
                },
                LlmData {
                    system_prompt:
                        "You are a friendly and concise assistant. Keep answers short and helpful."
                            .to_string(),
                    ..Default::default()
                },
                "Output",
                350.0,
                (650.0, 80.0),
            ),
        },
        FlowTemplate {
            id: "system-prompt-llm",
            name: "System + User Prompt",
            description: "LLM with system prompt, user input, and output",
            graph: chat_graph(
                TextInputData {
                    label: "User Message".to_string(),
                    text: String::new(),
                },
                ModelData {
                    model_id: String::new(),
                    max_tokens: 2048,
                    ..Default::default()
                },
                LlmData {
                    label: "Assistant".to_string(),
                    system_prompt: "You are a helpful assistant. Be concise and clear.".to_string(),
                    max_tokens: 2048,
                    ..Default::default()
                },
                "Response",
                380.0,
                (700.0, 100.0),
            ),
        },
    ]
});

pub fn templates() -> &'static [FlowTemplate] {
    &TEMPLATES
}

pub fn find_template(id: &str) -> Option<&'static FlowTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}

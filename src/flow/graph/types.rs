//! Flow graph type definitions
//!
//! Nodes are a closed tagged union: the wire shape `{id, type, data}` maps
//! onto [`NodeKind`], one payload struct per node type.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Handle on an LLM node that receives the model
pub const LLM_MODEL_HANDLE: &str = "llm-model";
/// Handle on an LLM node that receives the user prompt
pub const LLM_PROMPT_HANDLE: &str = "llm-prompt";
/// Agent handles
pub const AGENT_MODEL_HANDLE: &str = "model";
pub const AGENT_PROMPT_HANDLE: &str = "prompt";
pub const AGENT_CONTEXT_HANDLE: &str = "context";

/// Discriminant of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    TextInput,
    TextOutput,
    Model,
    Document,
    Agent,
    Llm,
    Condition,
    Tool,
}

impl NodeType {
    pub const ALL: [NodeType; 8] = [
        NodeType::TextInput,
        NodeType::Document,
        NodeType::Model,
        NodeType::Llm,
        NodeType::Agent,
        NodeType::Condition,
        NodeType::Tool,
        NodeType::TextOutput,
    ];

    /// Wire name, e.g. `textInput`
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::TextInput => "textInput",
            NodeType::TextOutput => "textOutput",
            NodeType::Model => "model",
            NodeType::Document => "document",
            NodeType::Agent => "agent",
            NodeType::Llm => "llm",
            NodeType::Condition => "condition",
            NodeType::Tool => "tool",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextInputData {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
    File,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextOutputData {
    pub label: String,
    pub text: String,
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelData {
    pub label: String,
    pub model_id: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelData {
    fn default() -> Self {
        Self {
            label: "Model".to_string(),
            model_id: String::new(),
            temperature: crate::adk::model::DEFAULT_TEMPERATURE,
            max_tokens: crate::adk::model::DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileAttachment {
    pub id: String,
    pub filename: String,
    pub media_type: String,
    pub url: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentData {
    pub label: String,
    pub files: Vec<FileAttachment>,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentData {
    pub label: String,
    pub web_search_enabled: bool,
    pub context_nodes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmData {
    pub label: String,
    pub system_prompt: String,
    pub model_id: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmData {
    fn default() -> Self {
        Self {
            label: "LLM".to_string(),
            system_prompt: String::new(),
            model_id: String::new(),
            temperature: crate::adk::model::DEFAULT_TEMPERATURE,
            max_tokens: crate::adk::model::DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionType {
    #[default]
    IfElse,
    Switch,
    Loop,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConditionData {
    pub label: String,
    pub description: String,
    pub condition_type: ConditionType,
    pub expression: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolType {
    #[default]
    ApiCall,
    Function,
    DatabaseQuery,
    WebSearch,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolData {
    pub label: String,
    pub description: String,
    pub tool_type: ToolType,
    pub config: HashMap<String, String>,
}

/// Type-specific node payload
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    TextInput(TextInputData),
    TextOutput(TextOutputData),
    Model(ModelData),
    Document(DocumentData),
    Agent(AgentData),
    Llm(LlmData),
    Condition(ConditionData),
    Tool(ToolData),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::TextInput(_) => NodeType::TextInput,
            NodeKind::TextOutput(_) => NodeType::TextOutput,
            NodeKind::Model(_) => NodeType::Model,
            NodeKind::Document(_) => NodeType::Document,
            NodeKind::Agent(_) => NodeType::Agent,
            NodeKind::Llm(_) => NodeType::Llm,
            NodeKind::Condition(_) => NodeType::Condition,
            NodeKind::Tool(_) => NodeType::Tool,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            NodeKind::TextInput(d) => &d.label,
            NodeKind::TextOutput(d) => &d.label,
            NodeKind::Model(d) => &d.label,
            NodeKind::Document(d) => &d.label,
            NodeKind::Agent(d) => &d.label,
            NodeKind::Llm(d) => &d.label,
            NodeKind::Condition(d) => &d.label,
            NodeKind::Tool(d) => &d.label,
        }
    }

    /// Default payload for a freshly placed node
    pub fn default_for(node_type: NodeType) -> Self {
        match node_type {
            NodeType::TextInput => NodeKind::TextInput(TextInputData {
                label: "Text Input".to_string(),
                ..Default::default()
            }),
            NodeType::TextOutput => NodeKind::TextOutput(TextOutputData {
                label: "Text Output".to_string(),
                ..Default::default()
            }),
            NodeType::Model => NodeKind::Model(ModelData::default()),
            NodeType::Document => NodeKind::Document(DocumentData {
                label: "Document".to_string(),
                ..Default::default()
            }),
            NodeType::Agent => NodeKind::Agent(AgentData {
                label: "Agent".to_string(),
                ..Default::default()
            }),
            NodeType::Llm => NodeKind::Llm(LlmData::default()),
            NodeType::Condition => NodeKind::Condition(ConditionData {
                label: "Condition".to_string(),
                ..Default::default()
            }),
            NodeType::Tool => NodeKind::Tool(ToolData {
                label: "Tool".to_string(),
                ..Default::default()
            }),
        }
    }
}

/// Canvas position; ignored by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A node in the flow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode", into = "RawNode")]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub position: Option<Position>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            position: None,
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn label(&self) -> &str {
        self.kind.label()
    }
}

/// Wire form of a node
#[derive(Serialize, Deserialize)]
struct RawNode {
    id: String,
    #[serde(rename = "type")]
    node_type: NodeType,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<Position>,
}

impl TryFrom<RawNode> for Node {
    type Error = serde_json::Error;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        let data = match raw.data {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other,
        };
        let kind = match raw.node_type {
            NodeType::TextInput => NodeKind::TextInput(serde_json::from_value(data)?),
            NodeType::TextOutput => NodeKind::TextOutput(serde_json::from_value(data)?),
            NodeType::Model => NodeKind::Model(serde_json::from_value(data)?),
            NodeType::Document => NodeKind::Document(serde_json::from_value(data)?),
            NodeType::Agent => NodeKind::Agent(serde_json::from_value(data)?),
            NodeType::Llm => NodeKind::Llm(serde_json::from_value(data)?),
            NodeType::Condition => NodeKind::Condition(serde_json::from_value(data)?),
            NodeType::Tool => NodeKind::Tool(serde_json::from_value(data)?),
        };
        Ok(Node {
            id: raw.id,
            kind,
            position: raw.position,
        })
    }
}

impl From<Node> for RawNode {
    fn from(node: Node) -> Self {
        let node_type = node.node_type();
        let data = match node.kind {
            NodeKind::TextInput(d) => serde_json::to_value(d),
            NodeKind::TextOutput(d) => serde_json::to_value(d),
            NodeKind::Model(d) => serde_json::to_value(d),
            NodeKind::Document(d) => serde_json::to_value(d),
            NodeKind::Agent(d) => serde_json::to_value(d),
            NodeKind::Llm(d) => serde_json::to_value(d),
            NodeKind::Condition(d) => serde_json::to_value(d),
            NodeKind::Tool(d) => serde_json::to_value(d),
        }
        .unwrap_or(serde_json::Value::Null);
        RawNode {
            id: node.id,
            node_type,
            data,
            position: node.position,
        }
    }
}

/// A directed connection between two nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    pub fn with_target_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }
}

/// An immutable snapshot of nodes and edges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl FlowGraph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }
}

/// Index nodes by id
pub fn index_nodes(nodes: &[Node]) -> HashMap<&str, &Node> {
    nodes.iter().map(|n| (n.id.as_str(), n)).collect()
}

//! Graph loader - JSON and YAML graph files
//!
//! A graph file holds `{nodes, edges}` in the same wire shape the
//! server accepts. The format is picked from the file extension.

use std::fs;
use std::path::Path;

use crate::adk::error::FlowError;
use crate::flow::graph::FlowGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Json,
    Yaml,
}

impl GraphFormat {
    /// `.yaml`/`.yml` are YAML, anything else is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => GraphFormat::Yaml,
            _ => GraphFormat::Json,
        }
    }
}

/// Loads and saves flow graphs
pub struct GraphLoader;

impl GraphLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a graph from a JSON or YAML file
    pub fn load_graph<P: AsRef<Path>>(&self, path: P) -> Result<FlowGraph, FlowError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let graph = Self::parse(&content, GraphFormat::from_path(path))?;
        log::info!(
            "Loaded graph {:?}: {} nodes, {} edges",
            path,
            graph.nodes.len(),
            graph.edges.len()
        );
        Ok(graph)
    }

    /// Write a graph back, keeping the format of the target extension
    pub fn save_graph<P: AsRef<Path>>(&self, path: P, graph: &FlowGraph) -> Result<(), FlowError> {
        let path = path.as_ref();
        let content = match GraphFormat::from_path(path) {
            GraphFormat::Json => serde_json::to_string_pretty(graph)?,
            GraphFormat::Yaml => serde_yaml::to_string(graph)?,
        };
        fs::write(path, content)?;
        Ok(())
    }

    pub fn parse(content: &str, format: GraphFormat) -> Result<FlowGraph, FlowError> {
        match format {
            GraphFormat::Json => Self::parse_json(content),
            GraphFormat::Yaml => Self::parse_yaml(content),
        }
    }

    pub fn parse_json(content: &str) -> Result<FlowGraph, FlowError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn parse_yaml(content: &str) -> Result<FlowGraph, FlowError> {
        Ok(serde_yaml::from_str(content)?)
    }
}

impl Default for GraphLoader {
    fn default() -> Self {
        Self::new()
    }
}

//! Input resolution for multi-input nodes

use std::collections::HashMap;

use super::types::{Edge, Node, NodeType};

/// Find the upstream node feeding `handle` on `target_id`
///
/// An edge whose `targetHandle` equals `handle` wins; otherwise the first
/// incoming edge from a node of `fallback_type` is used. Returns `None`
/// when the input is not wired.
pub fn resolve_input<'a>(
    target_id: &str,
    handle: Option<&str>,
    fallback_type: NodeType,
    edges: &[Edge],
    index: &HashMap<&str, &'a Node>,
) -> Option<&'a Node> {
    let incoming = || edges.iter().filter(move |e| e.target == target_id);

    if let Some(handle) = handle.filter(|h| !h.is_empty()) {
        if let Some(edge) = incoming().find(|e| e.target_handle.as_deref() == Some(handle)) {
            return index.get(edge.source.as_str()).copied();
        }
    }

    incoming()
        .filter_map(|e| index.get(e.source.as_str()).copied())
        .find(|source| source.node_type() == fallback_type)
}

/// First value in `outputs` produced by any node feeding `target_id`
pub fn upstream_output<'a>(
    target_id: &str,
    edges: &[Edge],
    outputs: &'a HashMap<String, String>,
) -> Option<&'a str> {
    edges
        .iter()
        .filter(|e| e.target == target_id)
        .find_map(|e| outputs.get(&e.source))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::graph::types::{index_nodes, NodeKind, LLM_MODEL_HANDLE, LLM_PROMPT_HANDLE};

    fn node(id: &str, node_type: NodeType) -> Node {
        Node::new(id, NodeKind::default_for(node_type))
    }

    #[test]
    fn test_explicit_handle_preferred() {
        let nodes = vec![
            node("m1", NodeType::Model),
            node("m2", NodeType::Model),
            node("llm", NodeType::Llm),
        ];
        let edges = vec![
            Edge::new("e1", "m1", "llm"),
            Edge::new("e2", "m2", "llm").with_target_handle(LLM_MODEL_HANDLE),
        ];
        let index = index_nodes(&nodes);
        let found = resolve_input("llm", Some(LLM_MODEL_HANDLE), NodeType::Model, &edges, &index);
        assert_eq!(found.map(|n| n.id.as_str()), Some("m2"));
    }

    #[test]
    fn test_handle_match_ignores_source_type() {
        let nodes = vec![node("doc", NodeType::Document), node("llm", NodeType::Llm)];
        let edges = vec![Edge::new("e1", "doc", "llm").with_target_handle(LLM_PROMPT_HANDLE)];
        let index = index_nodes(&nodes);
        let found = resolve_input("llm", Some(LLM_PROMPT_HANDLE), NodeType::TextInput, &edges, &index);
        assert_eq!(found.map(|n| n.id.as_str()), Some("doc"));
    }

    #[test]
    fn test_fallback_by_type() {
        let nodes = vec![
            node("doc", NodeType::Document),
            node("txt", NodeType::TextInput),
            node("llm", NodeType::Llm),
        ];
        let edges = vec![Edge::new("e1", "doc", "llm"), Edge::new("e2", "txt", "llm")];
        let index = index_nodes(&nodes);
        let found = resolve_input("llm", Some(LLM_PROMPT_HANDLE), NodeType::TextInput, &edges, &index);
        assert_eq!(found.map(|n| n.id.as_str()), Some("txt"));
    }

    #[test]
    fn test_duplicates_take_first() {
        let nodes = vec![
            node("a", NodeType::TextInput),
            node("b", NodeType::TextInput),
            node("llm", NodeType::Llm),
        ];
        let edges = vec![
            Edge::new("e1", "a", "llm").with_target_handle(LLM_PROMPT_HANDLE),
            Edge::new("e2", "b", "llm").with_target_handle(LLM_PROMPT_HANDLE),
        ];
        let index = index_nodes(&nodes);
        let found = resolve_input("llm", Some(LLM_PROMPT_HANDLE), NodeType::TextInput, &edges, &index);
        assert_eq!(found.map(|n| n.id.as_str()), Some("a"));
    }

    #[test]
    fn test_unwired_returns_none() {
        let nodes = vec![node("doc", NodeType::Document), node("llm", NodeType::Llm)];
        let edges = vec![Edge::new("e1", "doc", "llm")];
        let index = index_nodes(&nodes);
        assert!(resolve_input("llm", Some(LLM_MODEL_HANDLE), NodeType::Model, &edges, &index).is_none());
    }

    #[test]
    fn test_upstream_output_skips_missing_values() {
        let edges = vec![Edge::new("e1", "failed", "out"), Edge::new("e2", "ok", "out")];
        let mut outputs = HashMap::new();
        outputs.insert("ok".to_string(), "value".to_string());
        assert_eq!(upstream_output("out", &edges, &outputs), Some("value"));
        assert_eq!(upstream_output("other", &edges, &outputs), None);
    }
}

// SPDX-License-Identifier: MIT

//! Flow graph model and graph algorithms
//!
//! This module provides the node/edge types plus the pure graph
//! operations the engine relies on: ordering, input resolution,
//! subgraph extraction and connection validation.

pub mod resolve;
pub mod sort;
pub mod subgraph;
pub mod types;
pub mod validate;

pub use resolve::{resolve_input, upstream_output};
pub use sort::topological_sort;
pub use subgraph::{downstream_closure, induced_subgraph, upstream_closure};
pub use types::{Edge, FlowGraph, Node, NodeKind, NodeType};
pub use validate::{validate_connection, Connection, ConnectionError};

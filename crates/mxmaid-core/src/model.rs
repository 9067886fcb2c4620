//! Structural model of one diagram page.
//!
//! All relations are weak: a node's `parent` and an edge's endpoints are plain
//! identifiers resolved through the model's node index at emission time.
//! Dangling lookups are expected (skipped), not exceptional.

use crate::style::StyleMap;
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    /// Raw style string as authored, kept alongside the parsed map because
    /// group detection substring-matches the raw text.
    pub style: String,
    #[serde(rename = "styleMap")]
    pub style_map: StyleMap,
    /// `mxGeometry` attributes, passed through unmodified.
    pub geometry: IndexMap<String, String>,
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Edge {
    pub id: String,
    pub source: Option<String>,
    pub target: Option<String>,
    pub label: String,
    pub style: String,
    #[serde(rename = "styleMap")]
    pub style_map: StyleMap,
}

/// A container node's membership record. Members are node ids in discovery
/// order; a member id that is itself a group key renders as a nested
/// subgraph.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub label: String,
    pub members: Vec<String>,
}

/// Everything the emitter needs for one page. Rebuilt from scratch on every
/// conversion call; never shared or mutated across calls.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagramModel {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Keyed by container node id; insertion order is emission order.
    pub groups: IndexMap<String, Group>,
    #[serde(skip)]
    node_index: FxHashMap<String, usize>,
}

impl DiagramModel {
    pub fn add_node(&mut self, node: Node) {
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }
}

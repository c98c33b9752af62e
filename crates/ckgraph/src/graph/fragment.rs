//! Per-file builder output.

use super::node::{Ambiguity, Edge, EdgeKey, Node};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Everything one builder extracted from one file.
///
/// Node ids are unique within a fragment and edges are unique by
/// `(source, target, edge_type)`; the `add_*` methods keep the first
/// occurrence and return whether anything was inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    pub source_file: String,
    pub file_hash: String,
    /// Builder language tag (`python`, `html`, `css`)
    pub language: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub ambiguities: Vec<Ambiguity>,
    #[serde(skip)]
    node_index: HashSet<String>,
    #[serde(skip)]
    edge_index: HashSet<EdgeKey>,
}

impl Fragment {
    pub fn new(
        source_file: impl Into<String>,
        file_hash: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            source_file: source_file.into(),
            file_hash: file_hash.into(),
            language: language.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            ambiguities: Vec::new(),
            node_index: HashSet::new(),
            edge_index: HashSet::new(),
        }
    }

    pub fn add_node(&mut self, node: Node) -> bool {
        self.sync_indexes();
        if !self.node_index.insert(node.id.clone()) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    pub fn add_edge(&mut self, edge: Edge) -> bool {
        self.sync_indexes();
        if !self.edge_index.insert(edge.key()) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    pub fn add_ambiguity(&mut self, ambiguity: Ambiguity) {
        self.ambiguities.push(ambiguity);
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains(id) || self.nodes.iter().any(|n| n.id == id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.ambiguities.is_empty()
    }

    // Indexes are not serialized; rebuild them after deserialization or
    // direct pushes to the public vectors.
    fn sync_indexes(&mut self) {
        if self.node_index.len() != self.nodes.len() {
            self.node_index = self.nodes.iter().map(|n| n.id.clone()).collect();
        }
        if self.edge_index.len() != self.edges.len() {
            self.edge_index = self.edges.iter().map(Edge::key).collect();
        }
    }
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        self.source_file == other.source_file
            && self.file_hash == other.file_hash
            && self.language == other.language
            && self.nodes == other.nodes
            && self.edges == other.edges
            && self.ambiguities == other.ambiguities
    }
}

impl Eq for Fragment {}

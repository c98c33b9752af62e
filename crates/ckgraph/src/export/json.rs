//! JSON graph document and snapshot files.
//!
//! The document is `{ "nodes": [...], "edges": [...], "ambiguities": [...] }`
//! with nodes and edges in identity order, so equal graphs serialize to
//! identical bytes.

use crate::error::{GraphError, Result};
use crate::graph::{Ambiguity, Edge, KnowledgeGraph, Node};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub ambiguities: Vec<Ambiguity>,
}

impl From<&KnowledgeGraph> for GraphDocument {
    fn from(graph: &KnowledgeGraph) -> Self {
        Self {
            nodes: graph.nodes().cloned().collect(),
            edges: graph.edges().cloned().collect(),
            ambiguities: graph.ambiguities().to_vec(),
        }
    }
}

impl GraphDocument {
    /// Rebuild a graph, rejecting duplicate nodes and orphan edges.
    pub fn into_graph(self) -> Result<KnowledgeGraph> {
        let mut graph = KnowledgeGraph::new();
        for node in self.nodes {
            graph.add_node(node)?;
        }
        for edge in self.edges {
            graph.add_edge(edge)?;
        }
        for ambiguity in self.ambiguities {
            graph.add_ambiguity(ambiguity);
        }
        Ok(graph)
    }
}

pub fn to_json(graph: &KnowledgeGraph) -> Result<String> {
    Ok(serde_json::to_string_pretty(&GraphDocument::from(graph))?)
}

pub fn from_json(json: &str) -> Result<KnowledgeGraph> {
    let document: GraphDocument = serde_json::from_str(json)?;
    document.into_graph()
}

pub fn save_snapshot(graph: &KnowledgeGraph, path: &Path) -> Result<()> {
    let json = to_json(graph)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| GraphError::io(parent, e))?;
    }
    std::fs::write(path, json).map_err(|e| GraphError::io(path, e))?;
    info!(
        "Saved snapshot {} ({} nodes, {} edges)",
        path.display(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<KnowledgeGraph> {
    if !path.exists() {
        return Err(GraphError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let json = std::fs::read_to_string(path).map_err(|e| GraphError::io(path, e))?;
    from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AmbiguityKind, EdgeType, NodeType};

    fn sample() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        graph
            .add_node(Node::new("File:a.py", NodeType::File, "a.py").with_file("a.py"))
            .unwrap();
        graph
            .add_node(Node::new("a.py::f", NodeType::Function, "f").with_file("a.py"))
            .unwrap();
        graph
            .add_edge(Edge::new("File:a.py", "a.py::f", EdgeType::Defines))
            .unwrap();
        graph.add_ambiguity(Ambiguity::new("a.py::f", "g", AmbiguityKind::UnresolvedCall));
        graph
    }

    #[test]
    fn test_document_shape() {
        let json = to_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(value["edges"][0]["edge_type"], "defines");
        assert_eq!(value["ambiguities"][0]["kind"], "unresolved_call");
    }

    #[test]
    fn test_orphan_edge_in_document_is_rejected() {
        let json = r#"{"nodes":[{"id":"m::a","node_type":"Function","name":"a"}],
                       "edges":[{"source":"m::a","target":"m::b","edge_type":"calls"}]}"#;
        assert!(matches!(from_json(json), Err(GraphError::NodeNotFound { .. })));
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("graph.json");
        let graph = sample();

        save_snapshot(&graph, &path).unwrap();
        let loaded = load_snapshot(&path).unwrap();

        assert_eq!(loaded, graph);
    }

    #[test]
    fn test_missing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_snapshot(&dir.path().join("none.json")),
            Err(GraphError::FileNotFound { .. })
        ));
    }
}

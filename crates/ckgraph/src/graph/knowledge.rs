//! The merged knowledge graph.
//!
//! Nodes are keyed by canonical id and edges by their identity triple, both
//! in ordered maps so that iteration (and therefore serialization) is
//! deterministic. Adjacency indexes are maintained on insertion.

use super::attributes::AttributeValue;
use super::node::{Ambiguity, Edge, EdgeKey, Node};
use super::types::Direction;
use crate::error::{GraphError, Result};
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeGraph {
    nodes: BTreeMap<String, Node>,
    edges: BTreeMap<EdgeKey, Edge>,
    outgoing: HashMap<String, BTreeSet<EdgeKey>>,
    incoming: HashMap<String, BTreeSet<EdgeKey>>,
    ambiguities: Vec<Ambiguity>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node under its own id.
    ///
    /// Fails with `InvalidOperation` if a node with that id already exists;
    /// reconciling two descriptions of one node is the merge engine's job.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::invalid_operation(format!(
                "node '{}' already exists",
                node.id
            )));
        }
        trace!("Adding node: id={}, type={}", node.id, node.node_type);
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    pub fn get_node(&self, id: &str) -> Result<&Node> {
        self.nodes.get(id).ok_or_else(|| GraphError::node_not_found(id))
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Add an edge between two existing nodes.
    ///
    /// Returns `Ok(false)` when an edge with the same triple already exists
    /// (the stored edge keeps its attributes). Missing endpoints are an error,
    /// so a graph can never hold an orphan edge.
    pub fn add_edge(&mut self, edge: Edge) -> Result<bool> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::node_not_found(endpoint.as_str()));
            }
        }

        let key = edge.key();
        if self.edges.contains_key(&key) {
            trace!("Skipping duplicate edge {key}");
            return Ok(false);
        }

        trace!("Adding edge {key}");
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .insert(key.clone());
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .insert(key.clone());
        self.edges.insert(key, edge);
        Ok(true)
    }

    pub fn add_ambiguity(&mut self, ambiguity: Ambiguity) {
        self.ambiguities.push(ambiguity);
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn ambiguities(&self) -> &[Ambiguity] {
        &self.ambiguities
    }

    /// File, Template and Stylesheet nodes.
    pub fn file_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| n.node_type.is_file_kind())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn ambiguity_count(&self) -> usize {
        self.ambiguities.len()
    }

    /// Edges leaving or entering `id`, ordered by edge identity.
    pub fn edges_of(&self, id: &str, direction: Direction) -> impl Iterator<Item = &Edge> {
        let index = match direction {
            Direction::Outgoing => &self.outgoing,
            Direction::Incoming => &self.incoming,
        };
        index
            .get(id)
            .into_iter()
            .flat_map(|keys| keys.iter())
            .filter_map(|key| self.edges.get(key))
    }

    pub fn outgoing(&self, id: &str) -> impl Iterator<Item = &Edge> {
        self.edges_of(id, Direction::Outgoing)
    }

    pub fn incoming(&self, id: &str) -> impl Iterator<Item = &Edge> {
        self.edges_of(id, Direction::Incoming)
    }

    /// Attach enrichment metadata to a node.
    ///
    /// Only new attribute keys may be added. Re-writing a key with the value
    /// it already holds is accepted; changing it is an `InvalidOperation`.
    pub fn annotate(
        &mut self,
        id: &str,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::node_not_found(id))?;
        let value = value.into();

        match node.attributes.get(key) {
            Some(existing) if *existing == value => Ok(()),
            Some(existing) => Err(GraphError::invalid_operation(format!(
                "attribute '{key}' on '{id}' already set to '{existing}'"
            ))),
            None => {
                debug!("Annotating {id}: {key}={value}");
                node.attributes.insert(key, value);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeType, NodeType};

    fn sample() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        graph
            .add_node(Node::new("File:a.py", NodeType::File, "a.py"))
            .unwrap();
        graph
            .add_node(Node::new("a.py::foo", NodeType::Function, "foo"))
            .unwrap();
        graph
            .add_node(Node::new("a.py::bar", NodeType::Function, "bar"))
            .unwrap();
        graph
            .add_edge(Edge::new("File:a.py", "a.py::foo", EdgeType::Defines))
            .unwrap();
        graph
            .add_edge(Edge::new("a.py::foo", "a.py::bar", EdgeType::Calls))
            .unwrap();
        graph
    }

    #[test]
    fn test_counts_and_lookup() {
        let graph = sample();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.get_node("a.py::foo").unwrap().name, "foo");
        assert!(matches!(
            graph.get_node("a.py::nope"),
            Err(GraphError::NodeNotFound { .. })
        ));
    }

    #[test]
    fn test_orphan_edge_is_refused() {
        let mut graph = sample();
        let result = graph.add_edge(Edge::new("a.py::foo", "b.py::baz", EdgeType::Calls));
        assert!(matches!(result, Err(GraphError::NodeNotFound { node_id }) if node_id == "b.py::baz"));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_duplicate_edge_collapses() {
        let mut graph = sample();
        let added = graph
            .add_edge(Edge::new("a.py::foo", "a.py::bar", EdgeType::Calls))
            .unwrap();
        assert!(!added);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_duplicate_node_is_refused() {
        let mut graph = sample();
        assert!(graph
            .add_node(Node::new("a.py::foo", NodeType::Function, "foo"))
            .is_err());
    }

    #[test]
    fn test_adjacency() {
        let graph = sample();
        let out: Vec<_> = graph.outgoing("a.py::foo").map(|e| e.target.as_str()).collect();
        assert_eq!(out, vec!["a.py::bar"]);
        let inc: Vec<_> = graph.incoming("a.py::foo").map(|e| e.source.as_str()).collect();
        assert_eq!(inc, vec!["File:a.py"]);
        assert_eq!(graph.outgoing("a.py::bar").count(), 0);
    }

    #[test]
    fn test_annotate_adds_but_never_overwrites() {
        let mut graph = sample();
        graph.annotate("a.py::foo", "role", "view").unwrap();
        graph.annotate("a.py::foo", "role", "view").unwrap();
        assert!(graph.annotate("a.py::foo", "role", "model").is_err());
        assert_eq!(
            graph.get_node("a.py::foo").unwrap().attributes.get_string("role"),
            Some("view")
        );
    }
}

//! Guard that an enriched graph kept the structure it was derived from.
//!
//! Enrichment (semantic tagging, annotations) may add attributes to existing
//! nodes and nothing else: the node set, node types and edge set must be
//! identical.

use crate::error::{GraphError, Result};
use crate::graph::{EdgeKey, KnowledgeGraph, NodeType};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EquivalenceReport {
    pub missing_nodes: Vec<String>,
    pub added_nodes: Vec<String>,
    /// `(id, base type, candidate type)`
    pub retyped_nodes: Vec<(String, NodeType, NodeType)>,
    pub missing_edges: Vec<String>,
    pub added_edges: Vec<String>,
}

impl EquivalenceReport {
    pub fn is_equivalent(&self) -> bool {
        self.missing_nodes.is_empty()
            && self.added_nodes.is_empty()
            && self.retyped_nodes.is_empty()
            && self.missing_edges.is_empty()
            && self.added_edges.is_empty()
    }

    fn summary(&self) -> String {
        format!(
            "{} node(s) missing, {} added, {} retyped; {} edge(s) missing, {} added",
            self.missing_nodes.len(),
            self.added_nodes.len(),
            self.retyped_nodes.len(),
            self.missing_edges.len(),
            self.added_edges.len()
        )
    }
}

pub fn check_equivalence(base: &KnowledgeGraph, candidate: &KnowledgeGraph) -> EquivalenceReport {
    let mut report = EquivalenceReport::default();

    for node in base.nodes() {
        match candidate.node(&node.id) {
            None => report.missing_nodes.push(node.id.clone()),
            Some(other) if other.node_type != node.node_type => {
                report
                    .retyped_nodes
                    .push((node.id.clone(), node.node_type, other.node_type))
            }
            Some(_) => {}
        }
    }
    report.added_nodes = candidate
        .nodes()
        .filter(|n| !base.contains_node(&n.id))
        .map(|n| n.id.clone())
        .collect();

    let base_edges: BTreeSet<EdgeKey> = base.edges().map(|e| e.key()).collect();
    let candidate_edges: BTreeSet<EdgeKey> = candidate.edges().map(|e| e.key()).collect();
    report.missing_edges = base_edges
        .difference(&candidate_edges)
        .map(ToString::to_string)
        .collect();
    report.added_edges = candidate_edges
        .difference(&base_edges)
        .map(ToString::to_string)
        .collect();

    report
}

pub fn ensure_equivalent(base: &KnowledgeGraph, candidate: &KnowledgeGraph) -> Result<()> {
    let report = check_equivalence(base, candidate);
    if report.is_equivalent() {
        Ok(())
    } else {
        Err(GraphError::StructuralMismatch {
            summary: report.summary(),
        })
    }
}

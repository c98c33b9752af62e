//! Fragment validation against the schema.
//!
//! Validation is a gate, not a repair step: a fragment with any violation is
//! rejected as a whole and the build stops.

use crate::error::{GraphError, Result};
use crate::graph::{Fragment, NodeType};
use crate::hash::is_content_hash;
use crate::identity;
use crate::schema::Schema;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    UnknownNodeType,
    UnknownEdgeType,
    IllegalEdge,
    DanglingEndpoint,
    DuplicateNodeId,
    InvalidFileHash,
    MalformedAmbiguity,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationKind::UnknownNodeType => "unknown_node_type",
            ViolationKind::UnknownEdgeType => "unknown_edge_type",
            ViolationKind::IllegalEdge => "illegal_edge",
            ViolationKind::DanglingEndpoint => "dangling_endpoint",
            ViolationKind::DuplicateNodeId => "duplicate_node_id",
            ViolationKind::InvalidFileHash => "invalid_file_hash",
            ViolationKind::MalformedAmbiguity => "malformed_ambiguity",
        };
        f.write_str(s)
    }
}

/// One reason a fragment was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Node id, edge or field the violation is about
    pub subject: String,
    pub detail: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.detail)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub source_file: String,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Convert into a `Result`, failing with every violation found.
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(GraphError::SchemaViolation {
                source_file: self.source_file,
                violations: self.violations,
            })
        }
    }
}

/// Check a fragment against `schema` and collect every violation.
pub fn validate(fragment: &Fragment, schema: &Schema) -> ValidationReport {
    let mut violations = Vec::new();

    if !is_content_hash(&fragment.file_hash) {
        violations.push(Violation::new(
            ViolationKind::InvalidFileHash,
            &fragment.source_file,
            format!("fragment hash '{}' is not a content hash", fragment.file_hash),
        ));
    }

    let mut local_types: HashMap<&str, NodeType> = HashMap::new();
    let mut seen = HashSet::new();
    for node in &fragment.nodes {
        if !seen.insert(node.id.as_str()) {
            violations.push(Violation::new(
                ViolationKind::DuplicateNodeId,
                &node.id,
                "node id declared more than once",
            ));
        }
        if !schema.allows_node_type(node.node_type) {
            violations.push(Violation::new(
                ViolationKind::UnknownNodeType,
                &node.id,
                format!("node type '{}' is not in the vocabulary", node.node_type),
            ));
        }
        if node.node_type.is_file_kind()
            && !node.file_hash.as_deref().is_some_and(is_content_hash)
        {
            violations.push(Violation::new(
                ViolationKind::InvalidFileHash,
                &node.id,
                format!("{} node must carry a content hash", node.node_type),
            ));
        }
        local_types.insert(node.id.as_str(), node.node_type);
    }

    let endpoint_type = |id: &str| -> Option<NodeType> {
        local_types
            .get(id)
            .copied()
            .or_else(|| identity::parse_typed(id).map(|(node_type, _)| node_type))
    };

    for edge in &fragment.edges {
        let key = edge.key();
        if !schema.allows_edge_type(edge.edge_type) {
            violations.push(Violation::new(
                ViolationKind::UnknownEdgeType,
                key.to_string(),
                format!("edge type '{}' is not in the vocabulary", edge.edge_type),
            ));
            continue;
        }

        let source_type = endpoint_type(&edge.source);
        let target_type = endpoint_type(&edge.target);
        for (endpoint, resolved) in [(&edge.source, source_type), (&edge.target, target_type)] {
            if resolved.is_none() {
                violations.push(Violation::new(
                    ViolationKind::DanglingEndpoint,
                    key.to_string(),
                    format!("endpoint '{endpoint}' is neither local nor a typed reference"),
                ));
            }
        }

        if let (Some(source_type), Some(target_type)) = (source_type, target_type) {
            if !schema.allows(source_type, edge.edge_type, target_type) {
                violations.push(Violation::new(
                    ViolationKind::IllegalEdge,
                    key.to_string(),
                    format!("{source_type} -[{}]-> {target_type} is not allowed", edge.edge_type),
                ));
            }
        }
    }

    for ambiguity in &fragment.ambiguities {
        if ambiguity.source.trim().is_empty() || ambiguity.unresolved_target.trim().is_empty() {
            violations.push(Violation::new(
                ViolationKind::MalformedAmbiguity,
                ambiguity.id.to_string(),
                format!("{} ambiguity needs a source and a target", ambiguity.kind),
            ));
        }
    }

    if violations.is_empty() {
        debug!(
            "Fragment {} valid: {} nodes, {} edges, {} ambiguities",
            fragment.source_file,
            fragment.nodes.len(),
            fragment.edges.len(),
            fragment.ambiguities.len()
        );
    } else {
        warn!(
            "Fragment {} rejected with {} violation(s)",
            fragment.source_file,
            violations.len()
        );
    }

    ValidationReport {
        source_file: fragment.source_file.clone(),
        violations,
    }
}

/// Validate and fail fast on the first rejected fragment.
pub fn ensure_valid(fragment: &Fragment, schema: &Schema) -> Result<()> {
    validate(fragment, schema).into_result()
}

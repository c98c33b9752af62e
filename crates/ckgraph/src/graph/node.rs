//! Nodes, edges and ambiguities: the records a graph is made of.

use super::attributes::{AttributeMap, AttributeValue};
use super::types::{AmbiguityKind, EdgeType, NodeType};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Callable signature extracted from a function or method header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Parameter names in declaration order (`*args`, `**kwargs` kept verbatim)
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Default value text for parameters that have one, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaults: Vec<String>,
    /// Decorators as written (`@login_required`, `@app.route(...)`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
    /// Return annotation text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    #[serde(default)]
    pub is_async: bool,
}

/// A node in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub node_type: NodeType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_end: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    /// Content hash; only file-kind nodes carry one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
    #[serde(default, skip_serializing_if = "AttributeMap::is_empty")]
    pub attributes: AttributeMap,
}

/// One field on which two descriptions of the same node disagreed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConflict {
    pub field: String,
    pub kept: String,
    pub discarded: String,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type,
            name: name.into(),
            file_path: None,
            line_start: None,
            line_end: None,
            docstring: None,
            signature: None,
            file_hash: None,
            attributes: AttributeMap::new(),
        }
    }

    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_lines(mut self, start: usize, end: usize) -> Self {
        self.line_start = Some(start);
        self.line_end = Some(end);
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line_start = Some(line);
        self
    }

    pub fn with_docstring(mut self, docstring: Option<String>) -> Self {
        self.docstring = docstring;
        self
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn with_hash(mut self, file_hash: impl Into<String>) -> Self {
        self.file_hash = Some(file_hash.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// Union another description of the same entity into this one.
    ///
    /// Fields missing here are taken from `other`; fields present on both
    /// sides with different values keep this node's value and are reported.
    pub fn absorb(&mut self, other: &Node) -> Vec<FieldConflict> {
        let mut conflicts = Vec::new();

        if self.node_type != other.node_type {
            conflicts.push(FieldConflict {
                field: "node_type".to_string(),
                kept: self.node_type.to_string(),
                discarded: other.node_type.to_string(),
            });
        }
        if self.name != other.name {
            conflicts.push(FieldConflict {
                field: "name".to_string(),
                kept: self.name.clone(),
                discarded: other.name.clone(),
            });
        }

        absorb_field(&mut self.file_path, &other.file_path, "file_path", &mut conflicts, |v| v.clone());
        absorb_field(&mut self.line_start, &other.line_start, "line_start", &mut conflicts, |v| v.to_string());
        absorb_field(&mut self.line_end, &other.line_end, "line_end", &mut conflicts, |v| v.to_string());
        absorb_field(&mut self.docstring, &other.docstring, "docstring", &mut conflicts, |v| v.clone());
        absorb_field(&mut self.file_hash, &other.file_hash, "file_hash", &mut conflicts, |v| v.clone());
        absorb_field(&mut self.signature, &other.signature, "signature", &mut conflicts, |v| {
            format!("({})", v.parameters.join(", "))
        });

        for (key, kept, discarded) in self.attributes.union_from(&other.attributes) {
            conflicts.push(FieldConflict {
                field: format!("attributes.{key}"),
                kept: kept.to_string(),
                discarded: discarded.to_string(),
            });
        }

        conflicts
    }
}

fn absorb_field<T, F>(
    mine: &mut Option<T>,
    theirs: &Option<T>,
    field: &str,
    conflicts: &mut Vec<FieldConflict>,
    render: F,
) where
    T: Clone + PartialEq,
    F: Fn(&T) -> String,
{
    match (mine.as_ref(), theirs) {
        (None, Some(value)) => *mine = Some(value.clone()),
        (Some(kept), Some(discarded)) if kept != discarded => conflicts.push(FieldConflict {
            field: field.to_string(),
            kept: render(kept),
            discarded: render(discarded),
        }),
        _ => {}
    }
}

/// Identity of an edge: the `(source, target, edge_type)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub source: String,
    pub target: String,
    pub edge_type: EdgeType,
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.source, self.edge_type, self.target)
    }
}

/// A directed, typed relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub edge_type: EdgeType,
    /// Non-identity metadata such as `call_line`
    #[serde(default, skip_serializing_if = "AttributeMap::is_empty")]
    pub attributes: AttributeMap,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, edge_type: EdgeType) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            edge_type,
            attributes: AttributeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            source: self.source.clone(),
            target: self.target.clone(),
            edge_type: self.edge_type,
        }
    }
}

const AMBIGUITY_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_8b3d_4c59_9e07_d2a1_53f8_b6c4);

/// A construct that could not be turned into a proven node or edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ambiguity {
    /// Stable id derived from the other fields
    pub id: Uuid,
    /// Node id the construct was found in
    pub source: String,
    /// What could not be resolved, as written
    pub unresolved_target: String,
    pub kind: AmbiguityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Ambiguity {
    pub fn new(source: impl Into<String>, unresolved_target: impl Into<String>, kind: AmbiguityKind) -> Self {
        let mut ambiguity = Self {
            id: Uuid::nil(),
            source: source.into(),
            unresolved_target: unresolved_target.into(),
            kind,
            reason: None,
            line: None,
        };
        ambiguity.rekey();
        ambiguity
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self.rekey();
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self.rekey();
        self
    }

    /// Point the ambiguity at a different source node.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.rekey();
    }

    fn rekey(&mut self) {
        let name = format!(
            "{}|{}|{}|{}|{}",
            self.kind,
            self.source,
            self.unresolved_target,
            self.line.map(|l| l.to_string()).unwrap_or_default(),
            self.reason.as_deref().unwrap_or_default(),
        );
        self.id = Uuid::new_v5(&AMBIGUITY_NAMESPACE, name.as_bytes());
    }
}

//! Graph data model: vocabulary, records, fragments and the merged graph.

mod attributes;
mod fragment;
mod knowledge;
mod node;
pub mod traversal;
mod types;

pub use attributes::{AttributeMap, AttributeValue};
pub use fragment::Fragment;
pub use knowledge::KnowledgeGraph;
pub use node::{Ambiguity, Edge, EdgeKey, FieldConflict, Node, Signature};
pub use types::{AmbiguityKind, Direction, EdgeType, NodeType};

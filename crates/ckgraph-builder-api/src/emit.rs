//! Schema-aware fragment assembly shared by all builders.

use ckgraph::identity;
use ckgraph::{content_hash, Ambiguity, AmbiguityKind, Edge, Fragment, Node, NodeType, Schema};
use std::collections::HashMap;
use tracing::debug;

/// Collects one file's nodes, edges and ambiguities.
///
/// Every edge is checked against the schema legality matrix before it is
/// kept. An edge whose endpoint types cannot be determined, or whose
/// `(source type, edge type, target type)` triple is not allowed, is turned
/// into a `schema_violation` ambiguity so the fragment stays valid.
pub struct EmitContext<'s> {
    fragment: Fragment,
    schema: &'s Schema,
    local_types: HashMap<String, NodeType>,
}

impl<'s> EmitContext<'s> {
    /// Start a fragment for `source_file`, hashing `source`.
    pub fn new(
        source_file: impl Into<String>,
        language: impl Into<String>,
        source: &str,
        schema: &'s Schema,
    ) -> Self {
        Self {
            fragment: Fragment::new(source_file, content_hash(source.as_bytes()), language),
            schema,
            local_types: HashMap::new(),
        }
    }

    pub fn source_file(&self) -> &str {
        &self.fragment.source_file
    }

    pub fn file_hash(&self) -> &str {
        &self.fragment.file_hash
    }

    /// Add a node; returns false when the id was already emitted.
    pub fn node(&mut self, node: Node) -> bool {
        let id = node.id.clone();
        let node_type = node.node_type;
        if self.fragment.add_node(node) {
            self.local_types.insert(id, node_type);
            true
        } else {
            false
        }
    }

    /// Add an edge after checking it against the schema.
    ///
    /// Returns true only when the edge was kept and was not a duplicate.
    pub fn edge(&mut self, edge: Edge) -> bool {
        let source_type = self.node_type(&edge.source);
        let target_type = self.node_type(&edge.target);

        let reason = match (source_type, target_type) {
            (Some(s), Some(t)) if self.schema.allows(s, edge.edge_type, t) => None,
            (Some(s), Some(t)) => Some(format!("{s} -[{}]-> {t} is not allowed", edge.edge_type)),
            (None, _) => Some(format!("{} source '{}' has no known type", edge.edge_type, edge.source)),
            (_, None) => Some(format!("{} target '{}' has no known type", edge.edge_type, edge.target)),
        };

        match reason {
            None => self.fragment.add_edge(edge),
            Some(reason) => {
                debug!(file = %self.fragment.source_file, %reason, "Edge rejected by schema");
                let mut ambiguity =
                    Ambiguity::new(&edge.source, &edge.target, AmbiguityKind::SchemaViolation)
                        .with_reason(reason);
                if let Some(line) = edge
                    .attributes
                    .get_int("call_line")
                    .or_else(|| edge.attributes.get_int("line"))
                {
                    ambiguity = ambiguity.with_line(usize::try_from(line).unwrap_or_default());
                }
                self.fragment.add_ambiguity(ambiguity);
                false
            }
        }
    }

    pub fn ambiguity(&mut self, ambiguity: Ambiguity) {
        self.fragment.add_ambiguity(ambiguity);
    }

    /// Type of a local node or of a typed cross-fragment reference.
    pub fn node_type(&self, id: &str) -> Option<NodeType> {
        self.local_types
            .get(id)
            .copied()
            .or_else(|| identity::parse_typed(id).map(|(node_type, _)| node_type))
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.local_types.contains_key(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.fragment.node_mut(id)
    }

    pub fn finish(self) -> Fragment {
        self.fragment
    }
}

//! The node vocabulary and edge legality matrix every fragment is checked against.
//!
//! The schema is process-wide and immutable once set. Call [`init`] once at
//! startup to install a custom schema; otherwise [`global`] hands out the
//! built-in one.

use crate::error::{GraphError, Result};
use crate::graph::{EdgeType, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

static GLOBAL_SCHEMA: OnceLock<Schema> = OnceLock::new();

/// Allowed endpoint types for one edge type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRule {
    pub from: BTreeSet<NodeType>,
    pub to: BTreeSet<NodeType>,
}

impl EdgeRule {
    fn new(from: &[NodeType], to: &[NodeType]) -> Self {
        Self {
            from: from.iter().copied().collect(),
            to: to.iter().copied().collect(),
        }
    }

    pub fn allows(&self, source: NodeType, target: NodeType) -> bool {
        self.from.contains(&source) && self.to.contains(&target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub node_types: BTreeSet<NodeType>,
    pub edges: BTreeMap<EdgeType, EdgeRule>,
}

impl Default for Schema {
    fn default() -> Self {
        use NodeType::*;

        let mut edges = BTreeMap::new();
        edges.insert(
            EdgeType::Defines,
            EdgeRule::new(&[File, Stylesheet], &[Class, Function, Variable, StyleClass, StyleId]),
        );
        edges.insert(EdgeType::ContainsMethod, EdgeRule::new(&[Class], &[Method]));
        edges.insert(
            EdgeType::ContainsVariable,
            EdgeRule::new(&[Class, Function, Method], &[Variable]),
        );
        edges.insert(EdgeType::Imports, EdgeRule::new(&[File, Stylesheet], &[File, Stylesheet]));
        edges.insert(
            EdgeType::Calls,
            EdgeRule::new(&[File, Class, Function, Method], &[Class, Function, Method]),
        );
        edges.insert(EdgeType::Extends, EdgeRule::new(&[Class], &[Class]));
        edges.insert(
            EdgeType::Decorates,
            EdgeRule::new(&[Class, Function, Method], &[Class, Function, Method]),
        );
        edges.insert(EdgeType::WritesTo, EdgeRule::new(&[File, Function, Method], &[Variable]));
        edges.insert(EdgeType::CallsApi, EdgeRule::new(&[Template], &[Route]));
        edges.insert(
            EdgeType::LinksStaticAsset,
            EdgeRule::new(&[Template], &[StaticAsset, Stylesheet]),
        );
        edges.insert(EdgeType::UsesStyle, EdgeRule::new(&[Template], &[StyleClass, StyleId]));

        Self {
            node_types: NodeType::ALL.iter().copied().collect(),
            edges,
        }
    }
}

impl Schema {
    /// Load a schema document.
    ///
    /// ```json
    /// { "node_types": ["File", "Function"],
    ///   "edges": { "defines": { "from": ["File"], "to": ["Function"] } } }
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.check_consistency()?;
        Ok(schema)
    }

    // Edge rules may only mention node types the schema knows.
    fn check_consistency(&self) -> Result<()> {
        for (edge_type, rule) in &self.edges {
            if let Some(unknown) = rule
                .from
                .iter()
                .chain(rule.to.iter())
                .find(|t| !self.node_types.contains(t))
            {
                return Err(GraphError::invalid_operation(format!(
                    "edge rule '{edge_type}' references node type '{unknown}' outside the vocabulary"
                )));
            }
        }
        Ok(())
    }

    pub fn allows_node_type(&self, node_type: NodeType) -> bool {
        self.node_types.contains(&node_type)
    }

    pub fn allows_edge_type(&self, edge_type: EdgeType) -> bool {
        self.edges.contains_key(&edge_type)
    }

    /// Whether `(source, edge_type, target)` is a legal triple.
    pub fn allows(&self, source: NodeType, edge_type: EdgeType, target: NodeType) -> bool {
        self.edges
            .get(&edge_type)
            .is_some_and(|rule| rule.allows(source, target))
    }
}

/// Install the process-wide schema.
///
/// Installing the same schema twice is a no-op; installing a different one
/// after the first is an error.
pub fn init(schema: Schema) -> Result<&'static Schema> {
    let installed = GLOBAL_SCHEMA.get_or_init(|| schema.clone());
    if *installed != schema {
        return Err(GraphError::invalid_operation(
            "schema already initialized with a different vocabulary",
        ));
    }
    Ok(installed)
}

/// The process-wide schema, installing the default on first use.
pub fn global() -> &'static Schema {
    GLOBAL_SCHEMA.get_or_init(Schema::default)
}

//! Core vocabulary for the knowledge graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of node the graph can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    /// A source file (Python module)
    File,
    /// Class declaration
    Class,
    /// Module-level function
    Function,
    /// Function declared inside a class
    Method,
    /// Assigned name (module, class or function scope)
    Variable,
    /// Markup template file
    Template,
    /// Stylesheet file
    Stylesheet,
    /// CSS class selector (`.btn`)
    StyleClass,
    /// CSS id selector (`#main`)
    StyleId,
    /// HTTP endpoint referenced by markup
    Route,
    /// Static asset referenced by markup (script, image, icon)
    StaticAsset,
}

impl NodeType {
    /// Every node type, in declaration order.
    pub const ALL: [NodeType; 11] = [
        NodeType::File,
        NodeType::Class,
        NodeType::Function,
        NodeType::Method,
        NodeType::Variable,
        NodeType::Template,
        NodeType::Stylesheet,
        NodeType::StyleClass,
        NodeType::StyleId,
        NodeType::Route,
        NodeType::StaticAsset,
    ];

    /// File-kind nodes are anchored to exactly one file and carry its content hash.
    pub fn is_file_kind(self) -> bool {
        matches!(self, NodeType::File | NodeType::Template | NodeType::Stylesheet)
    }

    /// Symbolic nodes name a global concept shared across files.
    pub fn is_symbolic(self) -> bool {
        matches!(
            self,
            NodeType::StyleClass | NodeType::StyleId | NodeType::Route | NodeType::StaticAsset
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::File => "File",
            NodeType::Class => "Class",
            NodeType::Function => "Function",
            NodeType::Method => "Method",
            NodeType::Variable => "Variable",
            NodeType::Template => "Template",
            NodeType::Stylesheet => "Stylesheet",
            NodeType::StyleClass => "StyleClass",
            NodeType::StyleId => "StyleId",
            NodeType::Route => "Route",
            NodeType::StaticAsset => "StaticAsset",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown node type '{s}'"))
    }
}

/// Kinds of directed relationship between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// File or stylesheet declares a top-level entity
    Defines,
    /// Class owns a method
    ContainsMethod,
    /// Class or function owns a variable
    ContainsVariable,
    /// File imports another file
    Imports,
    /// Caller invokes callee
    Calls,
    /// Class inherits from base
    Extends,
    /// Decorator applies to a definition
    Decorates,
    /// Scope assigns to a variable it does not own
    WritesTo,
    /// Template requests an HTTP route
    CallsApi,
    /// Template links a static asset or stylesheet
    LinksStaticAsset,
    /// Template uses a style selector
    UsesStyle,
}

impl EdgeType {
    /// Every edge type, in declaration order.
    pub const ALL: [EdgeType; 11] = [
        EdgeType::Defines,
        EdgeType::ContainsMethod,
        EdgeType::ContainsVariable,
        EdgeType::Imports,
        EdgeType::Calls,
        EdgeType::Extends,
        EdgeType::Decorates,
        EdgeType::WritesTo,
        EdgeType::CallsApi,
        EdgeType::LinksStaticAsset,
        EdgeType::UsesStyle,
    ];

    /// Ownership edges tie a declaration to its owning scope.
    pub fn is_ownership(self) -> bool {
        matches!(
            self,
            EdgeType::Defines | EdgeType::ContainsMethod | EdgeType::ContainsVariable
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EdgeType::Defines => "defines",
            EdgeType::ContainsMethod => "contains_method",
            EdgeType::ContainsVariable => "contains_variable",
            EdgeType::Imports => "imports",
            EdgeType::Calls => "calls",
            EdgeType::Extends => "extends",
            EdgeType::Decorates => "decorates",
            EdgeType::WritesTo => "writes_to",
            EdgeType::CallsApi => "calls_api",
            EdgeType::LinksStaticAsset => "links_static_asset",
            EdgeType::UsesStyle => "uses_style",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown edge type '{s}'"))
    }
}

/// Why a construct could not be turned into a proven node or edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityKind {
    UnresolvedCall,
    UnresolvedImport,
    UnresolvedSymbol,
    UnresolvedDecorator,
    UnresolvedBase,
    DynamicImport,
    WildcardImport,
    SymbolicReference,
    NestedDefinition,
    DynamicValue,
    ExternalReference,
    ResponsiveBreakpoint,
    AnimationDefined,
    SchemaViolation,
    RecursionLimit,
    OrphanEdgeDropped,
    AttributeConflict,
}

impl AmbiguityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AmbiguityKind::UnresolvedCall => "unresolved_call",
            AmbiguityKind::UnresolvedImport => "unresolved_import",
            AmbiguityKind::UnresolvedSymbol => "unresolved_symbol",
            AmbiguityKind::UnresolvedDecorator => "unresolved_decorator",
            AmbiguityKind::UnresolvedBase => "unresolved_base",
            AmbiguityKind::DynamicImport => "dynamic_import",
            AmbiguityKind::WildcardImport => "wildcard_import",
            AmbiguityKind::SymbolicReference => "symbolic_reference",
            AmbiguityKind::NestedDefinition => "nested_definition",
            AmbiguityKind::DynamicValue => "dynamic_value",
            AmbiguityKind::ExternalReference => "external_reference",
            AmbiguityKind::ResponsiveBreakpoint => "responsive_breakpoint",
            AmbiguityKind::AnimationDefined => "animation_defined",
            AmbiguityKind::SchemaViolation => "schema_violation",
            AmbiguityKind::RecursionLimit => "recursion_limit",
            AmbiguityKind::OrphanEdgeDropped => "orphan_edge_dropped",
            AmbiguityKind::AttributeConflict => "attribute_conflict",
        }
    }
}

impl fmt::Display for AmbiguityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction for traversing edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow edges from source to target
    Outgoing,
    /// Follow edges from target to source
    Incoming,
}

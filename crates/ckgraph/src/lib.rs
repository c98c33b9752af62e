//! # ckgraph
//!
//! A schema-bound knowledge graph of a codebase's structure: files,
//! declarations and the relationships between them, derived from static
//! parsing.
//!
//! ## Architecture
//!
//! ```text
//! Structural builders (one per language, separate crates)
//!     ↓  Fragment per file
//! Validator (vocabulary + legality matrix, fail fast)
//!     ↓
//! Merge engine (strong / scoped / loose identity)
//!     ↓  KnowledgeGraph
//! Differ (content hashes)      Query engine (search, traversal, ...)
//! ```
//!
//! Anything a builder cannot prove is kept as an [`Ambiguity`] rather than
//! dropped or guessed, so every relationship in the graph is either proven or
//! explicitly flagged.
//!
//! ## Example
//!
//! ```rust
//! use ckgraph::{merge, content_hash, Edge, EdgeType, Fragment, Node, NodeType, QueryEngine};
//!
//! let hash = content_hash(b"def foo():\n    pass\n");
//! let mut fragment = Fragment::new("a.py", &hash, "python");
//! fragment.add_node(Node::new("File:a.py", NodeType::File, "a.py").with_file("a.py").with_hash(&hash));
//! fragment.add_node(Node::new("a.py::foo", NodeType::Function, "foo").with_file("a.py").with_lines(1, 2));
//! fragment.add_edge(Edge::new("File:a.py", "a.py::foo", EdgeType::Defines));
//!
//! ckgraph::ensure_valid(&fragment, ckgraph::schema::global()).unwrap();
//! let graph = merge(vec![fragment]);
//!
//! let engine = QueryEngine::new(&graph);
//! assert_eq!(engine.search("foo", None)[0].id, "a.py::foo");
//! ```

#![deny(unsafe_code)]

pub mod diff;
pub mod equivalence;
pub mod error;
pub mod export;
pub mod graph;
pub mod hash;
pub mod identity;
pub mod merge;
pub mod query;
pub mod schema;
pub mod validate;

pub use diff::{diff, ChangeStatus, DiffReport, DiffStats};
pub use equivalence::{check_equivalence, ensure_equivalent, EquivalenceReport};
pub use error::{GraphError, Result};
pub use graph::{
    Ambiguity, AmbiguityKind, AttributeMap, AttributeValue, Direction, Edge, EdgeKey, EdgeType,
    Fragment, KnowledgeGraph, Node, NodeType, Signature,
};
pub use hash::content_hash;
pub use identity::IdentityTier;
pub use merge::{merge, merge_with, MergePolicy};
pub use query::{NodeQuery, QueryCommand, QueryEngine};
pub use schema::Schema;
pub use validate::{ensure_valid, validate, ValidationReport, Violation, ViolationKind};

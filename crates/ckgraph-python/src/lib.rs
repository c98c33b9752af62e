//! Python structural builder for ckgraph
//!
//! Turns one Python file into one [`ckgraph::Fragment`] in two passes over a
//! tree-sitter syntax tree:
//!
//! 1. **Structure**: the file, classes, functions, methods and variables,
//!    with their `defines` / `contains_*` ownership edges.
//! 2. **Relations**: `calls`, `imports`, `extends`, `decorates` and
//!    `writes_to`, resolved through lexical scopes. Anything that cannot be
//!    proven inside the file becomes an ambiguity.
//!
//! # Example
//!
//! ```rust
//! use ckgraph_builder_api::StructuralBuilder;
//! use ckgraph_python::PythonBuilder;
//!
//! let builder = PythonBuilder::new();
//! let fragment = builder.extract("def foo():\n    bar()\n", "a.py").unwrap();
//!
//! assert!(fragment.contains_node("a.py::foo"));
//! assert_eq!(fragment.ambiguities[0].unresolved_target, "bar");
//! ```

mod builder_impl;
mod extractor;
mod imports;
mod relations;
mod structure;
mod symbols;
mod syntax;

pub use builder_impl::PythonBuilder;
pub use extractor::{extract, LANGUAGE};
pub use imports::resolve_relative;

//! CSS stylesheet builder for ckgraph
//!
//! Each stylesheet becomes a `Stylesheet` node that `defines` the class and
//! id selectors of its rules as `StyleClass` / `StyleId` nodes. Those names
//! are symbolic, so a class defined here merges with the same class used by
//! an HTML template. `@import` becomes an `imports` edge between stylesheets.
//!
//! Selectors inside grouping at-rules (`@media`, `@supports`, `@layer`,
//! `@container`, `@scope`, `@starting-style`) and nested rules are extracted
//! like top-level ones. `@media` conditions, `@keyframes` and at-rule blocks
//! the scanner does not know are reported as ambiguities.
//!
//! # Example
//!
//! ```rust
//! use ckgraph_builder_api::StructuralBuilder;
//! use ckgraph_css::CssBuilder;
//!
//! let fragment = CssBuilder::new()
//!     .extract(".btn:hover, #main { color: red; }", "static/site.css")
//!     .unwrap();
//!
//! assert!(fragment.contains_node("Stylesheet:static/site.css"));
//! assert!(fragment.contains_node("StyleClass:.btn"));
//! assert!(fragment.contains_node("StyleId:#main"));
//! ```

mod builder_impl;
mod extractor;
mod scanner;

pub use builder_impl::CssBuilder;
pub use extractor::{extract, LANGUAGE};

//! HTML template builder for ckgraph
//!
//! Each template becomes a `Template` node. Elements are matched against a
//! declarative rule table and link the template to:
//!
//! - `Route` nodes through `calls_api` (htmx `hx-*` attributes, `<form action>`)
//! - stylesheets and `StaticAsset` nodes through `links_static_asset`
//! - `StyleClass` / `StyleId` nodes through `uses_style`
//!
//! Routes, assets and style names are symbolic: they merge with the same
//! names coming from other templates and stylesheets. Values holding template
//! expressions or external URLs are recorded as ambiguities.
//!
//! # Example
//!
//! ```rust
//! use ckgraph_builder_api::StructuralBuilder;
//! use ckgraph_html::HtmlBuilder;
//!
//! let fragment = HtmlBuilder::new()
//!     .extract(r#"<button class="btn" hx-post="/api/save">Save</button>"#, "index.html")
//!     .unwrap();
//!
//! assert!(fragment.contains_node("Route:/api/save"));
//! assert!(fragment.contains_node("StyleClass:.btn"));
//! ```

mod builder_impl;
mod extractor;
mod markup;
mod rules;

pub use builder_impl::HtmlBuilder;
pub use extractor::{extract, LANGUAGE};
pub use rules::{InteractionRule, MethodSource, TargetKind, RULES};

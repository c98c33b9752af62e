//! ckgraph Builder API
//!
//! Shared trait and plumbing for ckgraph structural builders.
//!
//! - **StructuralBuilder trait**: the contract every language builder implements
//! - **EmitContext**: fragment assembly that enforces the schema legality matrix
//! - **Pipeline**: discovery, (parallel) extraction, fail-fast validation, merge
//! - **Link resolution** for references written in markup and stylesheets
//! - **Configuration**, **metrics** and **error** types shared by all builders
//!
//! # Example
//!
//! ```rust,ignore
//! use ckgraph_builder_api::{Pipeline, PipelineConfig};
//! use ckgraph_python::PythonBuilder;
//!
//! let outcome = Pipeline::new(PipelineConfig::new("./my-project"))
//!     .with_builder(PythonBuilder::new())
//!     .build_project()?;
//! println!("{} nodes", outcome.report.nodes);
//! ```

pub mod config;
pub mod discovery;
pub mod emit;
pub mod errors;
pub mod links;
pub mod metrics;
pub mod pipeline;
pub mod traits;

pub use config::BuilderConfig;
pub use discovery::{discover_files, FileFilter};
pub use emit::EmitContext;
pub use errors::{BuilderError, BuilderResult};
pub use links::{is_external, resolve_link, LinkTarget};
pub use metrics::BuilderMetrics;
pub use pipeline::{BuildOutcome, BuildReport, Pipeline, PipelineConfig};
pub use traits::{read_source, StructuralBuilder};

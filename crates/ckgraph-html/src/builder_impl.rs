//! Implementation of the StructuralBuilder trait for HTML templates

use crate::extractor;
use ckgraph::{schema, Fragment};
use ckgraph_builder_api::{BuilderConfig, BuilderError, BuilderMetrics, StructuralBuilder};
use std::sync::Mutex;
use std::time::Instant;
use tracing::warn;

/// HTML template builder
pub struct HtmlBuilder {
    config: BuilderConfig,
    metrics: Mutex<BuilderMetrics>,
}

impl HtmlBuilder {
    pub fn new() -> Self {
        Self::with_config(BuilderConfig::default())
    }

    pub fn with_config(config: BuilderConfig) -> Self {
        Self {
            config,
            metrics: Mutex::new(BuilderMetrics::default()),
        }
    }
}

impl Default for HtmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralBuilder for HtmlBuilder {
    fn language(&self) -> &str {
        extractor::LANGUAGE
    }

    fn file_extensions(&self) -> &[&str] {
        &[".html", ".htm"]
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Fragment, BuilderError> {
        let start = Instant::now();
        let result = extractor::extract(source, file_path, &self.config, schema::global());

        let elapsed = start.elapsed();
        if let Ok(mut metrics) = self.metrics.lock() {
            match &result {
                Ok(fragment) => metrics.record_success(fragment, elapsed),
                Err(e) => {
                    warn!(file = file_path, error = %e, "HTML extraction failed");
                    metrics.record_failure(elapsed);
                }
            }
        }
        result
    }

    fn config(&self) -> &BuilderConfig {
        &self.config
    }

    fn metrics(&self) -> BuilderMetrics {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    fn reset_metrics(&mut self) {
        if let Ok(metrics) = self.metrics.get_mut() {
            *metrics = BuilderMetrics::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_extensions() {
        let builder = HtmlBuilder::new();
        assert_eq!(builder.language(), "html");
        assert!(builder.can_build(Path::new("templates/index.html")));
        assert!(builder.can_build(Path::new("LEGACY.HTM")));
        assert!(!builder.can_build(Path::new("static/site.css")));
    }

    #[test]
    fn test_metrics() {
        let builder = HtmlBuilder::new();
        builder.extract("<div class=\"a b\"></div>", "index.html").unwrap();

        let metrics = builder.metrics();
        assert_eq!(metrics.files_succeeded, 1);
        // template + two classes, two uses_style edges
        assert_eq!(metrics.total_nodes, 3);
        assert_eq!(metrics.total_edges, 2);
    }
}

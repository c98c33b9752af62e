//! Implementation of the StructuralBuilder trait for CSS stylesheets

use crate::extractor;
use ckgraph::{schema, Fragment};
use ckgraph_builder_api::{BuilderConfig, BuilderError, BuilderMetrics, StructuralBuilder};
use std::sync::Mutex;
use std::time::Instant;
use tracing::warn;

/// Stylesheet builder
pub struct CssBuilder {
    config: BuilderConfig,
    metrics: Mutex<BuilderMetrics>,
}

impl CssBuilder {
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

impl Default for CssBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralBuilder for CssBuilder {
    fn language(&self) -> &str {
        extractor::LANGUAGE
    }

    fn file_extensions(&self) -> &[&str] {
        &[".css"]
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Fragment, BuilderError> {
        let start = Instant::now();
        let result = extractor::extract(source, file_path, &self.config, schema::global());

        let elapsed = start.elapsed();
        if let Ok(mut metrics) = self.metrics.lock() {
            match &result {
                Ok(fragment) => metrics.record_success(fragment, elapsed),
                Err(e) => {
                    warn!(file = file_path, error = %e, "CSS extraction failed");
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
        let builder = CssBuilder::new();
        assert_eq!(builder.language(), "css");
        assert!(builder.can_build(Path::new("static/site.css")));
        assert!(!builder.can_build(Path::new("static/site.scss")));
        assert!(!builder.can_build(Path::new("index.html")));
    }

    #[test]
    fn test_metrics_and_reset() {
        let mut builder = CssBuilder::new();
        builder.extract(".a, #b { color: red; }", "site.css").unwrap();

        let metrics = builder.metrics();
        assert_eq!(metrics.files_succeeded, 1);
        assert_eq!(metrics.total_nodes, 3);
        assert_eq!(metrics.total_edges, 2);

        builder.reset_metrics();
        assert_eq!(builder.metrics().files_succeeded, 0);
    }
}

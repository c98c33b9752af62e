//! Implementation of the StructuralBuilder trait for Python

use crate::extractor;
use ckgraph::{schema, Fragment};
use ckgraph_builder_api::{BuilderConfig, BuilderError, BuilderMetrics, StructuralBuilder};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

/// Python structural builder
pub struct PythonBuilder {
    config: BuilderConfig,
    metrics: Mutex<BuilderMetrics>,
}

impl PythonBuilder {
    /// Create a new Python builder with default configuration
    pub fn new() -> Self {
        Self::with_config(BuilderConfig::default())
    }

    /// Create a new Python builder with custom configuration
    pub fn with_config(config: BuilderConfig) -> Self {
        Self {
            config,
            metrics: Mutex::new(BuilderMetrics::default()),
        }
    }

    fn update_metrics(&self, result: &Result<Fragment, BuilderError>, duration: Duration) {
        let Ok(mut metrics) = self.metrics.lock() else {
            return;
        };
        match result {
            Ok(fragment) => metrics.record_success(fragment, duration),
            Err(_) => metrics.record_failure(duration),
        }
    }
}

impl Default for PythonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuralBuilder for PythonBuilder {
    fn language(&self) -> &str {
        extractor::LANGUAGE
    }

    fn file_extensions(&self) -> &[&str] {
        &[".py", ".pyw"]
    }

    fn extract(&self, source: &str, file_path: &str) -> Result<Fragment, BuilderError> {
        let start = Instant::now();
        let result = extractor::extract(source, file_path, &self.config, schema::global());
        if let Err(e) = &result {
            warn!(file = file_path, error = %e, "Python extraction failed");
        }
        self.update_metrics(&result, start.elapsed());
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

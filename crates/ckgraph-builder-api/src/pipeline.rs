//! Project build pipeline: discover, extract, validate, merge.

use crate::config::BuilderConfig;
use crate::discovery::{discover_files, FileFilter};
use crate::errors::{BuilderError, BuilderResult};
use crate::metrics::duration_millis;
use crate::traits::StructuralBuilder;
use ckgraph::identity::normalize_path;
use ckgraph::{ensure_valid, merge_with, schema, Fragment, KnowledgeGraph, MergePolicy};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Project-level build configuration, loadable from a JSON profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub project_root: PathBuf,

    /// Active builder languages; empty means every registered builder
    pub languages: Vec<String>,

    /// Directory names pruned during discovery
    pub exclude_dirs: Vec<String>,

    /// Root-relative glob patterns skipped during discovery
    pub exclude_patterns: Vec<String>,

    pub builder: BuilderConfig,

    pub merge: MergePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            languages: Vec::new(),
            exclude_dirs: vec![
                ".git".to_string(),
                ".venv".to_string(),
                "__pycache__".to_string(),
                "node_modules".to_string(),
                "target".to_string(),
            ],
            exclude_patterns: Vec::new(),
            builder: BuilderConfig::default(),
            merge: MergePolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Default::default()
        }
    }

    pub fn from_json_file(path: &Path) -> BuilderResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| BuilderError::IoError(path.to_path_buf(), e))?;
        serde_json::from_str(&text).map_err(|e| {
            BuilderError::Pipeline(format!("invalid profile {}: {e}", path.display()))
        })
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_exclude_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    pub fn with_builder_config(mut self, builder: BuilderConfig) -> Self {
        self.builder = builder;
        self
    }

    fn language_enabled(&self, language: &str) -> bool {
        self.languages.is_empty() || self.languages.iter().any(|l| l == language)
    }

    fn file_filter(&self) -> BuilderResult<FileFilter> {
        FileFilter::new(self.exclude_dirs.clone(), &self.exclude_patterns)
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub files: usize,
    pub per_language: BTreeMap<String, usize>,
    pub nodes: usize,
    pub edges: usize,
    pub ambiguities: usize,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct BuildOutcome {
    pub graph: KnowledgeGraph,
    pub report: BuildReport,
}

/// Runs registered builders over a project and merges their fragments.
pub struct Pipeline {
    config: PipelineConfig,
    builders: Vec<Box<dyn StructuralBuilder>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            builders: Vec::new(),
        }
    }

    /// Register a builder. Earlier registrations win when extensions overlap.
    pub fn with_builder<B>(mut self, builder: B) -> Self
    where
        B: StructuralBuilder + 'static,
    {
        self.builders.push(Box::new(builder));
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// First active builder that handles `path`
    pub fn builder_for(&self, path: &Path) -> Option<&dyn StructuralBuilder> {
        self.builders
            .iter()
            .map(|b| b.as_ref())
            .filter(|b| self.config.language_enabled(b.language()))
            .find(|b| b.can_build(path))
    }

    /// Source files under the project root that some active builder handles.
    pub fn discover(&self) -> BuilderResult<Vec<PathBuf>> {
        let filter = self.config.file_filter()?;
        discover_files(&self.config.project_root, &filter, |path| {
            self.builder_for(path).is_some()
        })
    }

    /// Build the whole project rooted at `project_root`.
    #[instrument(skip(self), fields(root = %self.config.project_root.display()))]
    pub fn build_project(&self) -> BuilderResult<BuildOutcome> {
        let start = Instant::now();
        let files = self.discover()?;
        info!(files = files.len(), "Discovered source files");

        let root = self.config.project_root.as_path();
        let mut jobs = Vec::with_capacity(files.len());
        for path in &files {
            let builder = self
                .builder_for(path)
                .ok_or_else(|| BuilderError::UnsupportedFile(path.clone()))?;
            jobs.push((path.as_path(), builder));
        }

        let fragments = self.run(&jobs, |(path, builder)| builder.extract_file(root, path))?;
        self.finish(fragments, start)
    }

    /// Build from in-memory `(path, source)` pairs.
    ///
    /// Paths are project-relative; each is routed to a builder by extension.
    pub fn build_sources(&self, sources: &[(String, String)]) -> BuilderResult<BuildOutcome> {
        let start = Instant::now();
        let mut jobs = Vec::with_capacity(sources.len());
        for (path, source) in sources {
            let builder = self
                .builder_for(Path::new(path))
                .ok_or_else(|| BuilderError::UnsupportedFile(PathBuf::from(path)))?;
            jobs.push((normalize_path(path), source.as_str(), builder));
        }

        let fragments = self.run(&jobs, |(path, source, builder)| builder.extract(source, path))?;
        self.finish(fragments, start)
    }

    fn run<J, F>(&self, jobs: &[J], extract: F) -> BuilderResult<Vec<Fragment>>
    where
        J: Sync,
        F: Fn(&J) -> BuilderResult<Fragment> + Sync,
    {
        if !self.config.builder.parallel {
            return jobs.iter().map(&extract).collect();
        }

        let mut pool = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = self.config.builder.parallel_workers {
            pool = pool.num_threads(workers);
        }
        let pool = pool
            .build()
            .map_err(|e| BuilderError::Pipeline(format!("Failed to create thread pool: {e}")))?;

        // Collecting into a Result keeps input order and stops on the first error.
        pool.install(|| jobs.par_iter().map(&extract).collect())
    }

    fn finish(&self, fragments: Vec<Fragment>, start: Instant) -> BuilderResult<BuildOutcome> {
        let schema = schema::global();
        let mut per_language = BTreeMap::new();
        for fragment in &fragments {
            if let Err(err) = ensure_valid(fragment, schema) {
                warn!(file = %fragment.source_file, error = %err, "Fragment rejected, aborting build");
                return Err(err.into());
            }
            *per_language.entry(fragment.language.clone()).or_insert(0) += 1;
            debug!(
                file = %fragment.source_file,
                nodes = fragment.nodes.len(),
                edges = fragment.edges.len(),
                ambiguities = fragment.ambiguities.len(),
                "Fragment accepted"
            );
        }

        let files = fragments.len();
        let graph = merge_with(fragments, &self.config.merge);
        let report = BuildReport {
            files,
            per_language,
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            ambiguities: graph.ambiguity_count(),
            elapsed: start.elapsed(),
        };

        info!(
            files = report.files,
            nodes = report.nodes,
            edges = report.edges,
            ambiguities = report.ambiguities,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Build completed"
        );

        Ok(BuildOutcome { graph, report })
    }
}

use serde::{Deserialize, Serialize};

/// Configuration for builder behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Maximum nesting depth a builder descends into before recording a
    /// `recursion_limit` ambiguity and skipping the subtree
    pub max_depth: usize,

    /// Maximum file size to extract (in bytes)
    pub max_file_size: usize,

    /// Record docstrings on nodes
    pub include_docs: bool,

    /// Markers that make an attribute value template-dynamic (`{{`, `{%`)
    pub dynamic_markers: Vec<String>,

    /// Extract files in parallel during a project build
    pub parallel: bool,

    /// Number of parallel workers (None = rayon default)
    pub parallel_workers: Option<usize>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            max_file_size: 10 * 1024 * 1024, // 10 MB
            include_docs: true,
            dynamic_markers: vec!["{{".to_string(), "{%".to_string()],
            parallel: false,
            parallel_workers: None,
        }
    }
}

impl BuilderConfig {
    /// Parallel extraction without docstrings
    pub fn fast() -> Self {
        Self {
            include_docs: false,
            parallel: true,
            ..Default::default()
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_max_file_size(mut self, size: usize) -> Self {
        self.max_file_size = size;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Whether `value` contains a template-dynamic marker
    pub fn is_dynamic(&self, value: &str) -> bool {
        self.dynamic_markers.iter().any(|m| value.contains(m.as_str()))
    }
}

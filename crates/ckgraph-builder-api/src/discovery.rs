//! Source file discovery for project builds.

use crate::errors::{BuilderError, BuilderResult};
use ckgraph::identity::normalize_path;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory and glob filters applied while walking a project.
///
/// Patterns match `/`-separated root-relative paths: `*` and `?` stay
/// within one segment, `**` crosses segments.
#[derive(Debug, Clone)]
pub struct FileFilter {
    exclude_dirs: Vec<String>,
    exclude_globs: GlobSet,
}

impl FileFilter {
    /// Compile the exclude patterns; an invalid pattern is a pipeline error.
    pub fn new(exclude_dirs: Vec<String>, exclude_patterns: &[String]) -> BuilderResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in exclude_patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| BuilderError::Pipeline(format!("invalid exclude pattern {pattern:?}: {e}")))?;
            builder.add(glob);
        }
        let exclude_globs = builder
            .build()
            .map_err(|e| BuilderError::Pipeline(format!("invalid exclude patterns: {e}")))?;

        Ok(Self {
            exclude_dirs,
            exclude_globs,
        })
    }

    pub fn should_exclude_dir(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|dir| dir == name)
    }

    /// Whether a root-relative path matches any exclude pattern
    pub fn should_exclude_path(&self, relative: &str) -> bool {
        self.exclude_globs.is_match(relative)
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            exclude_dirs: Vec::new(),
            exclude_globs: GlobSet::empty(),
        }
    }
}

/// Walk `root` and return every file accepted by `accept`, sorted.
///
/// Excluded directories are pruned below the root; the root itself is
/// always walked. A walk error aborts discovery.
pub fn discover_files<F>(root: &Path, filter: &FileFilter, accept: F) -> BuilderResult<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool,
{
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() > 0 && entry.file_type().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    return !filter.should_exclude_dir(name);
                }
            }
            true
        });

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            BuilderError::IoError(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path
            .strip_prefix(root)
            .map(|p| normalize_path(&p.to_string_lossy()))
            .unwrap_or_default();
        if filter.should_exclude_path(&relative) || !accept(path) {
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

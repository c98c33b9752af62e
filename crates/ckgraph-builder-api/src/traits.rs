use crate::{config::BuilderConfig, errors::BuilderError, metrics::BuilderMetrics};
use ckgraph::identity::normalize_path;
use ckgraph::Fragment;
use std::path::Path;

/// Core trait that all structural builders implement
///
/// A builder turns one source file into one [`Fragment`]. It never touches
/// the merged graph: everything it cannot prove from the file alone is an
/// edge to a typed id (`File:pkg/mod.py`) or an ambiguity.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so the pipeline can extract files
/// in parallel.
///
/// # Determinism
/// `extract` must be a pure function of `(source, file_path)` and the
/// builder's configuration. Nodes, edges and ambiguities are emitted in
/// source order.
pub trait StructuralBuilder: Send + Sync {
    /// Language tag written to every fragment (`python`, `html`, `css`)
    fn language(&self) -> &str;

    /// File extensions handled by this builder, with the leading dot
    fn file_extensions(&self) -> &[&str];

    /// Extract a fragment from in-memory source.
    ///
    /// `file_path` is the project-relative path the fragment's ids are
    /// anchored to.
    fn extract(&self, source: &str, file_path: &str) -> Result<Fragment, BuilderError>;

    /// Read `path` and extract it.
    ///
    /// Ids are anchored to the path relative to `root`.
    fn extract_file(&self, root: &Path, path: &Path) -> Result<Fragment, BuilderError> {
        let (relative, source) = read_source(root, path, self.config())?;
        self.extract(&source, &relative)
    }

    /// Check if this builder handles the given file
    fn can_build(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let dotted = format!(".{ext}");
                self.file_extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(&dotted))
            })
            .unwrap_or(false)
    }

    /// Builder configuration
    fn config(&self) -> &BuilderConfig;

    /// Metrics accumulated since construction or the last reset
    fn metrics(&self) -> BuilderMetrics;

    fn reset_metrics(&mut self);
}

/// Read a source file for extraction.
///
/// Returns the normalized root-relative path and the file contents.
pub fn read_source(
    root: &Path,
    path: &Path,
    config: &BuilderConfig,
) -> Result<(String, String), BuilderError> {
    let full = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };

    let metadata =
        std::fs::metadata(&full).map_err(|e| BuilderError::IoError(full.clone(), e))?;
    if metadata.len() as usize > config.max_file_size {
        return Err(BuilderError::FileTooLarge(full, metadata.len() as usize));
    }

    let relative = full.strip_prefix(root).map_err(|_| {
        BuilderError::InvalidPath(
            full.clone(),
            format!("not under project root {}", root.display()),
        )
    })?;
    let relative = normalize_path(&relative.to_string_lossy());
    if relative.is_empty() || relative.starts_with("..") {
        return Err(BuilderError::InvalidPath(
            full,
            "path escapes the project root".to_string(),
        ));
    }

    let source =
        std::fs::read_to_string(&full).map_err(|e| BuilderError::IoError(full.clone(), e))?;
    Ok((relative, source))
}

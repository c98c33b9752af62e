//! Classification of URL-like references found in markup and stylesheets.

use ckgraph::identity::normalize_path;

/// Prefixes of references that point outside the project
const EXTERNAL_PREFIXES: &[&str] = &["http:", "https:", "//", "mailto:"];

/// Where a reference written in one file points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Another host or scheme
    External,
    /// Project-relative, normalized path
    Local(String),
    /// Climbs above the project root, or names nothing
    Unresolvable,
}

pub fn is_external(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    EXTERNAL_PREFIXES.iter().any(|p| value.starts_with(p))
}

/// Resolve `href` as written in `from_file`.
///
/// Root-absolute references (`/static/a.css`) are taken relative to the
/// project root, everything else relative to the referring file's
/// directory. Query strings and fragments are dropped.
pub fn resolve_link(from_file: &str, href: &str) -> LinkTarget {
    if is_external(href) {
        return LinkTarget::External;
    }

    let href = href.trim();
    let path = href.split(['?', '#']).next().unwrap_or_default();
    if path.is_empty() {
        return LinkTarget::Unresolvable;
    }

    let joined = match path.strip_prefix('/') {
        Some(rooted) => rooted.to_string(),
        None => match from_file.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/{path}"),
            None => path.to_string(),
        },
    };

    let normalized = normalize_path(&joined);
    if normalized.is_empty() || normalized == ".." || normalized.starts_with("../") {
        LinkTarget::Unresolvable
    } else {
        LinkTarget::Local(normalized)
    }
}

//! Canonical node identity.
//!
//! Three tiers decide which key a node is stored under once fragments meet:
//!
//! - **Strong**: file-kind nodes, `Type:normalized/path`
//! - **Scoped**: declarations, `path::name` or `path::Container.member`
//! - **Loose**: symbolic concepts shared across files, `Type:name`
//!
//! Builders use the constructors here so that raw ids already agree with
//! the canonical form in the common case; the merge still re-derives every
//! key through [`resolve`].

use crate::graph::{Node, NodeType};
use std::fmt;

const SCOPE_SEPARATOR: &str = "::";

/// Which identity rule produced a canonical id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentityTier {
    Strong,
    Scoped,
    Loose,
}

impl fmt::Display for IdentityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityTier::Strong => f.write_str("strong"),
            IdentityTier::Scoped => f.write_str("scoped"),
            IdentityTier::Loose => f.write_str("loose"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub tier: IdentityTier,
    pub id: String,
}

/// Normalize a project-relative path.
///
/// Backslashes become slashes, `.` segments and empty segments are dropped,
/// and `..` consumes the previous segment when there is one.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Strong id for a file-kind node.
pub fn file_id(node_type: NodeType, path: &str) -> String {
    format!("{}:{}", node_type, normalize_path(path))
}

/// Scoped id for a top-level declaration in `path`.
pub fn scoped_id(path: &str, name: &str) -> String {
    format!("{}{SCOPE_SEPARATOR}{}", normalize_path(path), name)
}

/// Scoped id for a member of an already scoped container.
pub fn member_id(container_id: &str, member: &str) -> String {
    format!("{container_id}.{member}")
}

/// Loose id for a symbolic concept.
pub fn symbol_id(node_type: NodeType, name: &str) -> String {
    format!("{node_type}:{name}")
}

/// Split a typed id (`File:a.py`, `StyleClass:.btn`) into its parts.
///
/// Scoped ids are never typed, even when their path contains a colon.
pub fn parse_typed(id: &str) -> Option<(NodeType, &str)> {
    if id.contains(SCOPE_SEPARATOR) {
        return None;
    }
    let (prefix, rest) = id.split_once(':')?;
    let node_type = prefix.parse::<NodeType>().ok()?;
    if rest.is_empty() {
        return None;
    }
    Some((node_type, rest))
}

/// File a node id is anchored to, if any.
pub fn file_of(id: &str) -> Option<String> {
    if let Some((path, _)) = id.split_once(SCOPE_SEPARATOR) {
        return Some(normalize_path(path));
    }
    match parse_typed(id) {
        Some((node_type, path)) if node_type.is_file_kind() => Some(normalize_path(path)),
        _ => None,
    }
}

/// Canonical identity of a node.
pub fn resolve(node: &Node) -> ResolvedIdentity {
    if node.node_type.is_file_kind() {
        let path = match (&node.file_path, parse_typed(&node.id)) {
            (Some(path), _) => path.as_str(),
            (None, Some((_, path))) => path,
            (None, None) => node.id.as_str(),
        };
        return ResolvedIdentity {
            tier: IdentityTier::Strong,
            id: file_id(node.node_type, path),
        };
    }

    if node.node_type.is_symbolic() {
        return ResolvedIdentity {
            tier: IdentityTier::Loose,
            id: symbol_id(node.node_type, &node.name),
        };
    }

    if let Some((path, rest)) = node.id.split_once(SCOPE_SEPARATOR) {
        return ResolvedIdentity {
            tier: IdentityTier::Scoped,
            id: format!("{}{SCOPE_SEPARATOR}{rest}", normalize_path(path)),
        };
    }

    match &node.file_path {
        Some(path) => ResolvedIdentity {
            tier: IdentityTier::Scoped,
            id: scoped_id(path, &node.name),
        },
        None => ResolvedIdentity {
            tier: IdentityTier::Loose,
            id: symbol_id(node.node_type, &node.name),
        },
    }
}

/// Canonical form of an edge endpoint that names a node outside its fragment.
pub fn canonicalize_reference(raw: &str) -> String {
    if let Some((path, rest)) = raw.split_once(SCOPE_SEPARATOR) {
        return format!("{}{SCOPE_SEPARATOR}{rest}", normalize_path(path));
    }
    match parse_typed(raw) {
        Some((node_type, path)) if node_type.is_file_kind() => file_id(node_type, path),
        _ => raw.to_string(),
    }
}

//! Import statement decoding.
//!
//! Modules map to files by path: `a.b` is `File:a/b.py`, relative imports
//! are resolved against the importing file's directory.

use crate::symbols::Binding;
use crate::syntax::{line, named_children, text};
use ckgraph::identity::{file_id, normalize_path, scoped_id};
use ckgraph::NodeType;
use tree_sitter::Node;

/// One imported module as written in one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub line: usize,
    /// Module as written (`app.models`, `..utils`)
    pub module: String,
    /// `File:<path>.py`, or None when a relative import climbs out of the project
    pub file: Option<String>,
    pub wildcard: bool,
    /// Names the statement binds in the current scope
    pub bindings: Vec<(String, Binding)>,
}

/// Decode an `import_statement` or `import_from_statement`.
pub fn decode(node: Node, source: &[u8], file_path: &str) -> Vec<ImportSpec> {
    match node.kind() {
        "import_statement" => decode_import(node, source),
        "import_from_statement" => decode_from(node, source, file_path),
        _ => Vec::new(),
    }
}

fn decode_import(node: Node, source: &[u8]) -> Vec<ImportSpec> {
    let mut cursor = node.walk();
    let names: Vec<Node> = node.children_by_field_name("name", &mut cursor).collect();

    names
        .into_iter()
        .filter_map(|name| {
            let (dotted, alias) = split_alias(name, source)?;
            Some(ImportSpec {
                line: line(node),
                file: Some(module_file(&module_path(&dotted.replace('.', "/")))),
                wildcard: false,
                bindings: vec![(
                    alias.unwrap_or_else(|| dotted.clone()),
                    Binding::Module {
                        dotted: dotted.clone(),
                        path: module_path(&dotted.replace('.', "/")),
                    },
                )],
                module: dotted,
            })
        })
        .collect()
}

fn decode_from(node: Node, source: &[u8], file_path: &str) -> Vec<ImportSpec> {
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return Vec::new();
    };
    let module = text(module_node, source).to_string();

    let mut cursor = node.walk();
    let names: Vec<(String, Option<String>)> = node
        .children_by_field_name("name", &mut cursor)
        .filter_map(|n| split_alias(n, source))
        .collect();
    let wildcard = named_children(node)
        .iter()
        .any(|child| child.kind() == "wildcard_import");

    let base = if module_node.kind() == "relative_import" {
        let (level, rest) = split_relative(module_node, source);
        match resolve_relative(file_path, level, rest.as_deref()) {
            Some(base) if rest.is_none() => {
                if wildcard {
                    Some(join(&base, "__init__"))
                } else {
                    // `from . import views`: every name is a sibling module
                    return names
                        .into_iter()
                        .map(|(name, alias)| {
                            let path = module_path(&join(&base, &name.replace('.', "/")));
                            ImportSpec {
                                line: line(node),
                                module: format!("{module}{name}"),
                                file: Some(module_file(&path)),
                                wildcard: false,
                                bindings: vec![(
                                    alias.unwrap_or_else(|| name.clone()),
                                    Binding::Module {
                                        dotted: format!("{module}{name}"),
                                        path,
                                    },
                                )],
                            }
                        })
                        .collect();
                }
            }
            other => other,
        }
    } else {
        Some(module.replace('.', "/"))
    };

    let bindings = match &base {
        Some(base) => {
            let path = module_path(base);
            names
                .into_iter()
                .map(|(name, alias)| {
                    let target = scoped_id(&path, &name);
                    (alias.unwrap_or(name), Binding::Imported { target })
                })
                .collect()
        }
        None => Vec::new(),
    };

    vec![ImportSpec {
        line: line(node),
        file: base.as_deref().map(|b| module_file(&module_path(b))),
        module,
        wildcard,
        bindings,
    }]
}

/// `a.b as c` -> ("a.b", Some("c")), `a.b` -> ("a.b", None)
fn split_alias(node: Node, source: &[u8]) -> Option<(String, Option<String>)> {
    match node.kind() {
        "dotted_name" => Some((text(node, source).to_string(), None)),
        "aliased_import" => {
            let name = node.child_by_field_name("name")?;
            let alias = node.child_by_field_name("alias").map(|a| text(a, source).to_string());
            Some((text(name, source).to_string(), alias))
        }
        _ => None,
    }
}

/// `..pkg.mod` -> (2, Some("pkg.mod"))
fn split_relative(node: Node, source: &[u8]) -> (usize, Option<String>) {
    let mut level = 0;
    let mut rest = None;
    for child in named_children(node) {
        match child.kind() {
            "import_prefix" => level = text(child, source).chars().filter(|c| *c == '.').count(),
            "dotted_name" => rest = Some(text(child, source).to_string()),
            _ => {}
        }
    }
    (level, rest)
}

/// Directory a relative import of `level` dots points at, plus `module`.
///
/// Level 1 is the importing file's own directory; each further dot climbs
/// one directory. The project root is the empty string; climbing above it
/// yields None.
pub fn resolve_relative(file_path: &str, level: usize, module: Option<&str>) -> Option<String> {
    let normalized = normalize_path(file_path);
    let mut dir: Vec<&str> = normalized.split('/').collect();
    dir.pop();

    let steps_up = level.saturating_sub(1);
    if steps_up > dir.len() {
        return None;
    }
    dir.truncate(dir.len() - steps_up);

    let base = dir.join("/");
    Some(match module {
        Some(module) => join(&base, &module.replace('.', "/")),
        None => base,
    })
}

fn join(dir: &str, rest: &str) -> String {
    if dir.is_empty() {
        rest.to_string()
    } else {
        format!("{dir}/{rest}")
    }
}

/// `app/models` -> `app/models.py`
fn module_path(base: &str) -> String {
    format!("{base}.py")
}

fn module_file(path: &str) -> String {
    file_id(NodeType::File, path)
}

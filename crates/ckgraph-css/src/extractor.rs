//! Fragment extraction for one stylesheet

use crate::scanner::{self, Statement, StatementKind, SKIPPED_AT_RULES};
use ckgraph::identity::{file_id, normalize_path, symbol_id};
use ckgraph::{Ambiguity, AmbiguityKind, Edge, EdgeType, Fragment, Node, NodeType, Schema};
use ckgraph_builder_api::{resolve_link, BuilderConfig, BuilderError, EmitContext, LinkTarget};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

pub const LANGUAGE: &str = "css";

/// `.name` / `#name` followed by any pseudo-classes and pseudo-elements
static RE_SELECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([.#])(-?[_a-zA-Z\x{80}-\x{10FFFF}][-_a-zA-Z0-9\x{80}-\x{10FFFF}]*)((?:::?[-a-zA-Z]+)*)")
        .unwrap()
});

/// Target of `@import "x"`, `@import url(x)` or `@import url("x")`
static RE_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^@import\s*(?:url\(\s*)?["']?([^"')\s;]+)"#).unwrap()
});

/// Extract a fragment from CSS source.
///
/// Never fails on malformed CSS: unbalanced braces and unterminated strings
/// end their construct early and scanning continues.
pub fn extract(
    source: &str,
    file_path: &str,
    config: &BuilderConfig,
    schema: &Schema,
) -> Result<Fragment, BuilderError> {
    let path = normalize_path(file_path);
    let mut ctx = EmitContext::new(&path, LANGUAGE, source, schema);

    let stylesheet = file_id(NodeType::Stylesheet, &path);
    let file_name = path.rsplit('/').next().unwrap_or(&path).to_string();
    ctx.node(
        Node::new(&stylesheet, NodeType::Stylesheet, file_name)
            .with_file(&path)
            .with_hash(ctx.file_hash().to_string())
            .with_lines(1, source.lines().count().max(1)),
    );

    let prepared = scanner::prepare(source);
    for statement in scanner::scan(&prepared, config.max_depth) {
        match statement.kind {
            StatementKind::Rule | StatementKind::NestedRule => selectors(&mut ctx, &stylesheet, &path, &statement),
            StatementKind::GroupAtRule => {
                if statement.at_keyword().as_deref() == Some("media") {
                    ctx.ambiguity(
                        Ambiguity::new(&stylesheet, statement.condensed(), AmbiguityKind::ResponsiveBreakpoint)
                            .with_reason("media query conditions are not modeled")
                            .with_line(statement.line),
                    );
                }
            }
            StatementKind::SkippedAtRule => {
                let keyword = statement.at_keyword().unwrap_or_default();
                if keyword.ends_with("keyframes") {
                    ctx.ambiguity(
                        Ambiguity::new(&stylesheet, statement.condensed(), AmbiguityKind::AnimationDefined)
                            .with_reason("animations are not modeled")
                            .with_line(statement.line),
                    );
                } else if !SKIPPED_AT_RULES.contains(&keyword.as_str()) {
                    debug!(file = %path, at_rule = %keyword, line = statement.line, "Skipping unknown at-rule block");
                    ctx.ambiguity(
                        Ambiguity::new(&stylesheet, statement.condensed(), AmbiguityKind::UnresolvedSymbol)
                            .with_reason(format!("@{keyword} blocks are not modeled; their rules are skipped"))
                            .with_line(statement.line),
                    );
                }
            }
            StatementKind::AtStatement => {
                if statement.at_keyword().as_deref() == Some("import") {
                    import(&mut ctx, &stylesheet, &path, &statement);
                }
            }
            StatementKind::TooDeep => {
                ctx.ambiguity(
                    Ambiguity::new(&stylesheet, statement.condensed(), AmbiguityKind::RecursionLimit)
                        .with_reason(format!(
                            "nesting exceeds max_depth {}; block skipped",
                            config.max_depth
                        ))
                        .with_line(statement.line),
                );
            }
        }
    }

    let fragment = ctx.finish();
    debug!(
        file = %path,
        nodes = fragment.nodes.len(),
        edges = fragment.edges.len(),
        ambiguities = fragment.ambiguities.len(),
        "Extracted CSS fragment"
    );
    Ok(fragment)
}

/// Class and id selectors of one rule prelude.
fn selectors(ctx: &mut EmitContext<'_>, stylesheet: &str, path: &str, rule: &Statement) {
    for caps in RE_SELECTOR.captures_iter(&rule.prelude) {
        let (Some(whole), Some(prefix), Some(name)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let node_type = if prefix.as_str() == "." {
            NodeType::StyleClass
        } else {
            NodeType::StyleId
        };
        let name = format!("{}{}", prefix.as_str(), name.as_str());
        let line = rule.line + rule.prelude[..whole.start()].matches('\n').count();
        let pseudo_states: Vec<&str> = caps
            .get(3)
            .map(|m| m.as_str().split(':').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let id = symbol_id(node_type, &name);
        if ctx.node(Node::new(&id, node_type, &name).with_file(path).with_line(line)) {
            ctx.edge(Edge::new(stylesheet, &id, EdgeType::Defines));
        }
        if let Some(node) = ctx.node_mut(&id) {
            for state in pseudo_states {
                node.attributes.push_unique("pseudo_states", state);
            }
        }
    }
}

fn import(ctx: &mut EmitContext<'_>, stylesheet: &str, path: &str, statement: &Statement) {
    let line = statement.line;
    let Some(target) = RE_IMPORT
        .captures(&statement.raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    else {
        ctx.ambiguity(
            Ambiguity::new(stylesheet, statement.condensed(), AmbiguityKind::UnresolvedImport)
                .with_reason("import target could not be read")
                .with_line(line),
        );
        return;
    };

    match resolve_link(path, target) {
        LinkTarget::Local(imported) => {
            ctx.edge(
                Edge::new(stylesheet, file_id(NodeType::Stylesheet, &imported), EdgeType::Imports)
                    .with_attribute("line", line),
            );
        }
        LinkTarget::External => ctx.ambiguity(
            Ambiguity::new(stylesheet, target, AmbiguityKind::ExternalReference)
                .with_reason("external stylesheets are not part of the project")
                .with_line(line),
        ),
        LinkTarget::Unresolvable => ctx.ambiguity(
            Ambiguity::new(stylesheet, target, AmbiguityKind::UnresolvedImport)
                .with_reason("import path leaves the project root")
                .with_line(line),
        ),
    }
}

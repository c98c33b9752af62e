//! Fragment extraction for one HTML template

use crate::markup::{self, Tag};
use crate::rules::{InteractionRule, TargetKind, RULES};
use ckgraph::identity::{file_id, normalize_path, symbol_id};
use ckgraph::{Ambiguity, AmbiguityKind, Edge, Fragment, Node as GraphNode, NodeType, Schema};
use ckgraph_builder_api::{resolve_link, BuilderConfig, BuilderError, EmitContext, LinkTarget};
use std::path::PathBuf;
use tracing::{debug, warn};
use tree_sitter::{Node, Parser};

pub const LANGUAGE: &str = "html";

/// Extract a fragment from an HTML template.
///
/// Markup is parsed leniently: templates interleave HTML with template
/// syntax, so a tree with error nodes is still walked and whatever elements
/// were recovered are extracted.
pub fn extract(
    source: &str,
    file_path: &str,
    config: &BuilderConfig,
    schema: &Schema,
) -> Result<Fragment, BuilderError> {
    let path = normalize_path(file_path);

    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_html::LANGUAGE.into();
    parser
        .set_language(&language)
        .map_err(|e| BuilderError::ParseError(PathBuf::from(&path), e.to_string()))?;

    let tree = parser.parse(source, None).ok_or_else(|| {
        BuilderError::ParseError(PathBuf::from(&path), "Failed to parse".to_string())
    })?;
    let root = tree.root_node();
    if root.has_error() {
        warn!(file = %path, "Template has markup errors, extracting recovered elements");
    }

    let mut ctx = EmitContext::new(&path, LANGUAGE, source, schema);
    let template = file_id(NodeType::Template, &path);
    let file_name = path.rsplit('/').next().unwrap_or(&path).to_string();
    ctx.node(
        GraphNode::new(&template, NodeType::Template, file_name)
            .with_file(&path)
            .with_hash(ctx.file_hash().to_string())
            .with_lines(1, source.lines().count().max(1)),
    );

    let mut walker = TemplateWalker {
        ctx: &mut ctx,
        source: source.as_bytes(),
        config,
        path: &path,
        template: &template,
    };
    walker.walk(root);

    let fragment = ctx.finish();
    debug!(
        file = %path,
        nodes = fragment.nodes.len(),
        edges = fragment.edges.len(),
        ambiguities = fragment.ambiguities.len(),
        "Extracted HTML fragment"
    );
    Ok(fragment)
}

struct TemplateWalker<'c, 's, 'a> {
    ctx: &'c mut EmitContext<'s>,
    source: &'a [u8],
    config: &'a BuilderConfig,
    path: &'a str,
    template: &'a str,
}

impl TemplateWalker<'_, '_, '_> {
    fn walk(&mut self, root: Node) {
        let mut stack = vec![(root, 0usize)];

        while let Some((node, depth)) = stack.pop() {
            let depth = if markup::is_element(node) {
                let depth = depth + 1;
                if depth > self.config.max_depth {
                    self.depth_exceeded(node);
                    continue;
                }
                if let Some(tag) = markup::opening_tag(node, self.source) {
                    self.element(&tag);
                }
                depth
            } else {
                depth
            };

            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            stack.extend(children.into_iter().rev().map(|child| (child, depth)));
        }
    }

    fn depth_exceeded(&mut self, element: Node) {
        let tag = markup::opening_tag(element, self.source)
            .map(|t| t.name)
            .unwrap_or_else(|| element.kind().to_string());
        self.ctx.ambiguity(
            Ambiguity::new(self.template, tag, AmbiguityKind::RecursionLimit)
                .with_reason(format!(
                    "nesting exceeds max_depth {}; element skipped",
                    self.config.max_depth
                ))
                .with_line(element.start_position().row + 1),
        );
    }

    fn element(&mut self, tag: &Tag) {
        for rule in RULES {
            if !rule.applies(&tag.name, |name| tag.attribute(name)) {
                continue;
            }
            let Some(value) = tag.attribute(rule.attribute) else {
                continue;
            };
            self.interaction(rule, tag, value);
        }
    }

    fn interaction(&mut self, rule: &InteractionRule, tag: &Tag, value: &str) {
        let line = tag.line;
        let value = value.trim();

        if self.config.is_dynamic(value) {
            self.ambiguity(AmbiguityKind::DynamicValue, value, "value contains a template expression", line);
            return;
        }

        if !rule.target.is_link() {
            self.style_references(rule, tag, value);
            return;
        }

        if value.is_empty() {
            self.ambiguity(
                AmbiguityKind::UnresolvedSymbol,
                format!("{}[{}]", tag.name, rule.attribute),
                "attribute has no value",
                line,
            );
            return;
        }

        let target = match (rule.target, resolve_link(self.path, value)) {
            (_, LinkTarget::External) => {
                self.ambiguity(
                    AmbiguityKind::ExternalReference,
                    value,
                    "external URLs are not part of the project",
                    line,
                );
                return;
            }
            (TargetKind::Stylesheet, LinkTarget::Local(path)) => file_id(NodeType::Stylesheet, &path),
            (TargetKind::Stylesheet, LinkTarget::Unresolvable) => {
                self.ambiguity(
                    AmbiguityKind::SymbolicReference,
                    value,
                    "stylesheet path leaves the project root",
                    line,
                );
                return;
            }
            (kind, _) => {
                // Routes and assets are symbolic: every template naming the
                // same URL refers to the same node
                let id = symbol_id(kind.node_type(), value);
                self.ctx.node(GraphNode::new(&id, kind.node_type(), value));
                id
            }
        };

        let mut edge = Edge::new(self.template, target, rule.edge)
            .with_attribute("line", line)
            .with_attribute("tag", tag.name.as_str());
        if let Some(method) = rule.method(tag.attribute("method")) {
            edge = edge.with_attribute("method", method);
        }
        self.ctx.edge(edge);
    }

    /// `class` tokens and `id` values become style nodes named with their
    /// selector prefix (`.btn`, `#main`).
    fn style_references(&mut self, rule: &InteractionRule, tag: &Tag, value: &str) {
        let node_type = rule.target.node_type();
        let names: Vec<String> = match rule.target {
            TargetKind::StyleClasses => value.split_whitespace().map(|c| format!(".{c}")).collect(),
            _ => {
                let value = value.trim();
                if value.chars().any(char::is_whitespace) {
                    self.ambiguity(
                        AmbiguityKind::UnresolvedSymbol,
                        value,
                        "element id contains whitespace",
                        tag.line,
                    );
                    return;
                }
                if value.is_empty() {
                    Vec::new()
                } else {
                    vec![format!("#{value}")]
                }
            }
        };

        for name in names {
            let id = symbol_id(node_type, &name);
            self.ctx.node(GraphNode::new(&id, node_type, &name));
            self.ctx.edge(
                Edge::new(self.template, id, rule.edge)
                    .with_attribute("line", tag.line)
                    .with_attribute("tag", tag.name.as_str()),
            );
        }
    }

    fn ambiguity(&mut self, kind: AmbiguityKind, target: impl Into<String>, reason: &str, line: usize) {
        self.ctx.ambiguity(
            Ambiguity::new(self.template, target, kind)
                .with_reason(reason)
                .with_line(line),
        );
    }
}

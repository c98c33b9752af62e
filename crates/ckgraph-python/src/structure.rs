//! Pass 1: declarations.
//!
//! Emits class, function, method and variable nodes with their ownership
//! edges and records every declared name in a [`ScopeTree`] for pass 2.

use crate::symbols::{Binding, ScopeKind, ScopeTree, MODULE_SCOPE};
use crate::syntax;
use ckgraph::{Ambiguity, AmbiguityKind, Edge, EdgeType, Node as GraphNode, NodeType, Signature};
use ckgraph_builder_api::{BuilderConfig, EmitContext};
use std::collections::HashMap;
use tree_sitter::Node;

/// Output of pass 1
#[derive(Debug)]
pub struct Declarations {
    pub scopes: ScopeTree,
    /// Syntax node id of each modeled definition -> the scope it opens
    pub definition_scopes: HashMap<usize, usize>,
}

/// A pending piece of the syntax tree and the scope it belongs to
#[derive(Clone, Copy)]
pub(crate) struct Frame<'t> {
    pub node: Node<'t>,
    pub scope: usize,
    /// Number of enclosing blocks
    pub depth: usize,
}

/// Push the named children of `node` so they pop in source order.
pub(crate) fn push_children<'t>(stack: &mut Vec<Frame<'t>>, node: Node<'t>, scope: usize, depth: usize) {
    let children = syntax::named_children(node);
    stack.extend(
        children
            .into_iter()
            .rev()
            .map(|node| Frame { node, scope, depth }),
    );
}

struct StructureWalker<'c, 's, 'a> {
    ctx: &'c mut EmitContext<'s>,
    source: &'a [u8],
    config: &'a BuilderConfig,
    scopes: ScopeTree,
    definition_scopes: HashMap<usize, usize>,
}

pub fn collect(
    ctx: &mut EmitContext<'_>,
    root: Node,
    source: &[u8],
    file_path: &str,
    config: &BuilderConfig,
) -> Declarations {
    let mut walker = StructureWalker {
        ctx,
        source,
        config,
        scopes: ScopeTree::new(file_path),
        definition_scopes: HashMap::new(),
    };
    walker.walk(root);

    Declarations {
        scopes: walker.scopes,
        definition_scopes: walker.definition_scopes,
    }
}

impl<'c, 's, 'a> StructureWalker<'c, 's, 'a> {
    fn walk(&mut self, root: Node) {
        let mut stack = Vec::new();
        push_children(&mut stack, root, MODULE_SCOPE, 0);

        while let Some(frame) = stack.pop() {
            match frame.node.kind() {
                "function_definition" | "class_definition" | "decorated_definition" => {
                    self.definition(frame, &mut stack)
                }
                "expression_statement" => self.assignments(frame),
                "global_statement" | "nonlocal_statement" => {
                    for name in syntax::named_children(frame.node) {
                        if name.kind() == "identifier" {
                            let name = syntax::text(name, self.source);
                            self.scopes.declare_global(frame.scope, name);
                        }
                    }
                }
                "block" => {
                    let depth = frame.depth + 1;
                    if depth > self.config.max_depth {
                        self.depth_exceeded(frame);
                    } else {
                        push_children(&mut stack, frame.node, frame.scope, depth);
                    }
                }
                _ => push_children(&mut stack, frame.node, frame.scope, frame.depth),
            }
        }
    }

    fn depth_exceeded(&mut self, frame: Frame) {
        let construct = frame
            .node
            .parent()
            .map(|p| p.kind())
            .unwrap_or("block");
        self.ctx.ambiguity(
            Ambiguity::new(self.scopes.id(frame.scope), construct, AmbiguityKind::RecursionLimit)
                .with_reason(format!(
                    "nesting exceeds max_depth {}; block skipped",
                    self.config.max_depth
                ))
                .with_line(syntax::line(frame.node)),
        );
    }

    fn definition<'t>(&mut self, frame: Frame<'t>, stack: &mut Vec<Frame<'t>>) {
        let (decorators, Some(def)) = syntax::unwrap_decorated(frame.node) else {
            return;
        };
        let Some(name) = def
            .child_by_field_name("name")
            .map(|n| syntax::text(n, self.source).to_string())
        else {
            return;
        };

        let parent_kind = self.scopes.kind(frame.scope);
        let is_class = def.kind() == "class_definition";
        let (node_type, edge_type, scope_kind) = match (parent_kind, is_class) {
            (ScopeKind::Module, true) => (NodeType::Class, EdgeType::Defines, ScopeKind::Class),
            (ScopeKind::Module, false) => (NodeType::Function, EdgeType::Defines, ScopeKind::Function),
            (ScopeKind::Class, false) => (NodeType::Method, EdgeType::ContainsMethod, ScopeKind::Method),
            _ => {
                let what = if is_class { "class" } else { "function" };
                self.ctx.ambiguity(
                    Ambiguity::new(self.scopes.id(frame.scope), &name, AmbiguityKind::NestedDefinition)
                        .with_reason(format!(
                            "{what} nested in a {} is not modeled",
                            parent_kind.as_str()
                        ))
                        .with_line(syntax::line(def)),
                );
                return;
            }
        };

        let id = self.scopes.child_id(frame.scope, &name);
        let (start, end) = syntax::line_span(def);
        let mut node = GraphNode::new(&id, node_type, &name)
            .with_file(self.scopes.file_path())
            .with_lines(start, end);

        let body = def.child_by_field_name("body");
        if self.config.include_docs {
            node = node.with_docstring(body.and_then(|b| syntax::docstring(b, self.source)));
        }

        let labels: Vec<String> = decorators
            .iter()
            .map(|d| syntax::decorator_label(*d, self.source))
            .collect();
        if is_class {
            if !labels.is_empty() {
                node = node.with_attribute("decorators", labels);
            }
            let bases = self.bases(def);
            if !bases.is_empty() {
                node = node.with_attribute("bases", bases);
            }
        } else {
            node = node.with_signature(self.signature(def, labels));
        }

        let owner = self.scopes.id(frame.scope).to_string();
        self.ctx.node(node);
        self.ctx.edge(Edge::new(owner, &id, edge_type));
        self.scopes.bind(frame.scope, &name, Binding::Local(id.clone()));

        let scope = self.scopes.push(frame.scope, id, scope_kind);
        self.definition_scopes.insert(def.id(), scope);

        if !is_class {
            if let Some(params) = def.child_by_field_name("parameters") {
                for param in self.parameters(params) {
                    let bare = param.0.trim_start_matches('*').to_string();
                    self.scopes.bind(scope, bare, Binding::Parameter);
                }
            }
        }

        if let Some(body) = body {
            stack.push(Frame {
                node: body,
                scope,
                depth: frame.depth,
            });
        }
    }

    fn bases(&self, class: Node) -> Vec<String> {
        class
            .child_by_field_name("superclasses")
            .map(|args| {
                syntax::named_children(args)
                    .into_iter()
                    .filter(|arg| !matches!(arg.kind(), "keyword_argument" | "comment"))
                    .map(|arg| syntax::text(arg, self.source).to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn signature(&self, def: Node, decorators: Vec<String>) -> Signature {
        let mut signature = Signature {
            decorators,
            is_async: syntax::is_async(def),
            returns: def
                .child_by_field_name("return_type")
                .map(|r| syntax::text(r, self.source).to_string()),
            ..Default::default()
        };

        if let Some(params) = def.child_by_field_name("parameters") {
            for (name, default) in self.parameters(params) {
                signature.parameters.push(name);
                if let Some(default) = default {
                    signature.defaults.push(default);
                }
            }
        }
        signature
    }

    /// Parameter names as written (`*args` kept) with their default text.
    fn parameters(&self, params: Node) -> Vec<(String, Option<String>)> {
        let text = |n: Node| syntax::text(n, self.source).to_string();
        let mut out = Vec::new();

        for param in syntax::named_children(params) {
            match param.kind() {
                "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                    out.push((text(param), None))
                }
                "typed_parameter" => {
                    if let Some(name) = syntax::named_children(param).into_iter().next() {
                        out.push((text(name), None));
                    }
                }
                "default_parameter" | "typed_default_parameter" => {
                    let name = param.child_by_field_name("name").map(text).unwrap_or_default();
                    let default = param.child_by_field_name("value").map(|v| default_text(v, self.source));
                    out.push((name, default));
                }
                _ => {}
            }
        }
        out
    }

    fn assignments(&mut self, frame: Frame) {
        for child in syntax::named_children(frame.node) {
            if child.kind() != "assignment" {
                continue;
            }
            // `a = b = 1` nests the second assignment as the right-hand side
            let mut current = Some(child);
            while let Some(assignment) = current {
                if let Some(left) = assignment.child_by_field_name("left") {
                    for name in syntax::bound_names(left) {
                        self.declare_variable(frame.scope, name);
                    }
                }
                current = assignment
                    .child_by_field_name("right")
                    .filter(|right| right.kind() == "assignment");
            }
        }
    }

    fn declare_variable(&mut self, scope: usize, name_node: Node) {
        let name = syntax::text(name_node, self.source);
        let kind = self.scopes.kind(scope);
        if kind.is_callable() && self.scopes.is_global(scope, name) {
            return;
        }

        let id = self.scopes.child_id(scope, name);
        let node = GraphNode::new(&id, NodeType::Variable, name)
            .with_file(self.scopes.file_path())
            .with_line(syntax::line(name_node));
        if self.ctx.node(node) {
            let edge_type = if kind == ScopeKind::Module {
                EdgeType::Defines
            } else {
                EdgeType::ContainsVariable
            };
            let owner = self.scopes.id(scope).to_string();
            self.ctx.edge(Edge::new(owner, &id, edge_type));
        }
        self.scopes.bind(scope, name, Binding::Local(id));
    }
}

/// Literal defaults are kept as written; anything else is `<complex>`.
fn default_text(value: Node, source: &[u8]) -> String {
    match value.kind() {
        "integer" | "float" | "string" | "true" | "false" | "none" | "identifier"
        | "attribute" => syntax::text(value, source).to_string(),
        "unary_operator" if syntax::named_children(value).iter().all(|c| matches!(c.kind(), "integer" | "float")) => {
            syntax::text(value, source).to_string()
        }
        _ => "<complex>".to_string(),
    }
}

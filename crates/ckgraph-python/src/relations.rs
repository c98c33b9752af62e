//! Pass 2: relations between the declarations found in pass 1.
//!
//! Only relations whose both ends are proven become edges. Everything else
//! (builtins, names imported from other files, attribute chains on unknown
//! objects) is reported as an ambiguity naming the target as written.

use crate::imports::{self, ImportSpec};
use crate::structure::{push_children, Declarations, Frame};
use crate::symbols::{Binding, ScopeKind, ScopeTree, MODULE_SCOPE};
use crate::syntax;
use ckgraph::identity::{member_id, scoped_id};
use ckgraph::{Ambiguity, AmbiguityKind, Edge, EdgeType, NodeType};
use ckgraph_builder_api::{BuilderConfig, EmitContext};
use std::collections::HashMap;
use tree_sitter::Node;

/// What an expression in callee, decorator or base position refers to
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    Local(String),
    /// Defined in another file; the target is a scoped id or dotted path
    External(String),
    Parameter(String),
    Unknown(String),
}

struct RelationWalker<'c, 's, 'a> {
    ctx: &'c mut EmitContext<'s>,
    source: &'a [u8],
    config: &'a BuilderConfig,
    scopes: ScopeTree,
    definition_scopes: HashMap<usize, usize>,
}

pub fn link(
    ctx: &mut EmitContext<'_>,
    root: Node,
    source: &[u8],
    config: &BuilderConfig,
    declarations: Declarations,
) {
    let mut walker = RelationWalker {
        ctx,
        source,
        config,
        scopes: declarations.scopes,
        definition_scopes: declarations.definition_scopes,
    };
    walker.prebind_module_imports(root);
    walker.walk(root);
}

impl<'c, 's, 'a> RelationWalker<'c, 's, 'a> {
    /// Top-level imports are visible to every function body, wherever the
    /// import statement sits in the file.
    fn prebind_module_imports(&mut self, root: Node) {
        for statement in syntax::named_children(root) {
            for decoded in imports::decode(statement, self.source, self.scopes.file_path()) {
                for (name, binding) in decoded.bindings {
                    self.scopes.bind(MODULE_SCOPE, name, binding);
                }
            }
        }
    }

    fn walk(&mut self, root: Node) {
        let mut stack = Vec::new();
        push_children(&mut stack, root, MODULE_SCOPE, 0);

        while let Some(frame) = stack.pop() {
            match frame.node.kind() {
                "function_definition" | "class_definition" | "decorated_definition" => {
                    self.definition(frame, &mut stack)
                }
                "block" => {
                    // Over-deep blocks were already reported by pass 1
                    if frame.depth < self.config.max_depth {
                        push_children(&mut stack, frame.node, frame.scope, frame.depth + 1);
                    }
                }
                "import_statement" | "import_from_statement" => self.import(frame),
                "call" => {
                    self.call(frame);
                    push_children(&mut stack, frame.node, frame.scope, frame.depth);
                }
                "assignment" | "augmented_assignment" => {
                    self.writes(frame);
                    push_children(&mut stack, frame.node, frame.scope, frame.depth);
                }
                _ => push_children(&mut stack, frame.node, frame.scope, frame.depth),
            }
        }
    }

    fn definition<'t>(&mut self, frame: Frame<'t>, stack: &mut Vec<Frame<'t>>) {
        let (decorators, Some(def)) = syntax::unwrap_decorated(frame.node) else {
            return;
        };
        // Nested definitions were reported in pass 1 and are not modeled
        let Some(&scope) = self.definition_scopes.get(&def.id()) else {
            return;
        };
        let target = self.scopes.id(scope).to_string();

        for decorator in decorators {
            self.decorator(decorator, frame.scope, &target);
            // Arguments of `@factory(...)` run in the enclosing scope
            let arguments = syntax::decorator_expression(decorator)
                .filter(|expr| expr.kind() == "call")
                .and_then(|call| call.child_by_field_name("arguments"));
            if let Some(arguments) = arguments {
                push_children(stack, arguments, frame.scope, frame.depth);
            }
        }

        if def.kind() == "class_definition" {
            if let Some(args) = def.child_by_field_name("superclasses") {
                for base in syntax::named_children(args) {
                    match base.kind() {
                        "keyword_argument" => push_children(stack, base, frame.scope, frame.depth),
                        "comment" => {}
                        _ => self.base(base, frame.scope, &target),
                    }
                }
            }
        } else if let Some(params) = def.child_by_field_name("parameters") {
            // Default values are evaluated in the enclosing scope
            push_children(stack, params, frame.scope, frame.depth);
        }

        if let Some(body) = def.child_by_field_name("body") {
            stack.push(Frame {
                node: body,
                scope,
                depth: frame.depth,
            });
        }
    }

    fn decorator(&mut self, decorator: Node, scope: usize, target: &str) {
        let line = syntax::line(decorator);
        let Some(mut expr) = syntax::decorator_expression(decorator) else {
            return;
        };
        if expr.kind() == "call" {
            if let Some(function) = expr.child_by_field_name("function") {
                expr = function;
            }
        }

        match self.resolve(expr, scope) {
            Resolution::Local(id) => {
                self.ctx
                    .edge(Edge::new(id, target, EdgeType::Decorates).with_attribute("line", line));
            }
            other => {
                let (unresolved, reason) = describe(other);
                self.ctx.ambiguity(
                    Ambiguity::new(target, unresolved, AmbiguityKind::UnresolvedDecorator)
                        .with_reason(reason)
                        .with_line(line),
                );
            }
        }
    }

    fn base(&mut self, base: Node, scope: usize, class_id: &str) {
        let line = syntax::line(base);
        match self.resolve(base, scope) {
            Resolution::Local(id) => {
                self.ctx
                    .edge(Edge::new(class_id, id, EdgeType::Extends).with_attribute("line", line));
            }
            other => {
                let (unresolved, reason) = describe(other);
                self.ctx.ambiguity(
                    Ambiguity::new(class_id, unresolved, AmbiguityKind::UnresolvedBase)
                        .with_reason(reason)
                        .with_line(line),
                );
            }
        }
    }

    fn call(&mut self, frame: Frame) {
        let Some(function) = frame.node.child_by_field_name("function") else {
            return;
        };
        let caller = self.scopes.id(frame.scope).to_string();
        let line = syntax::line(frame.node);
        let resolution = self.resolve(function, frame.scope);

        if is_dynamic_import(&resolution) {
            let module = frame
                .node
                .child_by_field_name("arguments")
                .and_then(|args| syntax::named_children(args).into_iter().next())
                .map(|arg| compact(arg, self.source))
                .unwrap_or_else(|| compact(function, self.source));
            self.ctx.ambiguity(
                Ambiguity::new(caller, module, AmbiguityKind::DynamicImport)
                    .with_reason("module name is computed at runtime")
                    .with_line(line),
            );
            return;
        }

        match resolution {
            Resolution::Local(id) => {
                self.ctx.edge(
                    Edge::new(caller, id, EdgeType::Calls).with_attribute("call_line", line),
                );
            }
            other => {
                let (unresolved, reason) = describe(other);
                self.ctx.ambiguity(
                    Ambiguity::new(caller, unresolved, AmbiguityKind::UnresolvedCall)
                        .with_reason(reason)
                        .with_line(line),
                );
            }
        }
    }

    fn import(&mut self, frame: Frame) {
        let file = self.scopes.id(MODULE_SCOPE).to_string();
        for decoded in imports::decode(frame.node, self.source, self.scopes.file_path()) {
            let ImportSpec {
                line,
                module,
                file: target,
                wildcard,
                bindings,
            } = decoded;

            match target {
                Some(target) => {
                    self.ctx
                        .edge(Edge::new(&file, target, EdgeType::Imports).with_attribute("line", line));
                }
                None => self.ctx.ambiguity(
                    Ambiguity::new(&file, &module, AmbiguityKind::UnresolvedImport)
                        .with_reason("relative import climbs above the project root")
                        .with_line(line),
                ),
            }
            if wildcard {
                self.ctx.ambiguity(
                    Ambiguity::new(&file, &module, AmbiguityKind::WildcardImport)
                        .with_reason("names bound by * are not tracked")
                        .with_line(line),
                );
            }
            for (name, binding) in bindings {
                self.scopes.bind(frame.scope, name, binding);
            }
        }
    }

    /// `writes_to` for `global` names and `self.<attr>` class variables.
    fn writes(&mut self, frame: Frame) {
        let Some(left) = frame.node.child_by_field_name("left") else {
            return;
        };
        let scope = frame.scope;
        if !self.scopes.kind(scope).is_callable() {
            return;
        }
        let writer = self.scopes.id(scope).to_string();
        let line = syntax::line(frame.node);

        for target in assignment_targets(left) {
            let variable = match target.kind() {
                "identifier" => {
                    let name = syntax::text(target, self.source);
                    if !self.scopes.is_global(scope, name) {
                        continue;
                    }
                    scoped_id(self.scopes.file_path(), name)
                }
                "attribute" => {
                    let Some(object) = target.child_by_field_name("object") else {
                        continue;
                    };
                    let Some(attr) = target.child_by_field_name("attribute") else {
                        continue;
                    };
                    if !is_receiver(object, self.source)
                        || self.scopes.kind(scope) != ScopeKind::Method
                    {
                        continue;
                    }
                    let Some(class_id) = self.scopes.enclosing_class(scope) else {
                        continue;
                    };
                    member_id(class_id, syntax::text(attr, self.source))
                }
                _ => continue,
            };

            if self.ctx.has_node(&variable)
                && self.ctx.node_type(&variable) == Some(NodeType::Variable)
            {
                self.ctx.edge(
                    Edge::new(&writer, variable, EdgeType::WritesTo).with_attribute("line", line),
                );
            }
        }
    }

    fn resolve(&self, expr: Node, scope: usize) -> Resolution {
        match expr.kind() {
            "identifier" => {
                let name = syntax::text(expr, self.source);
                match self.scopes.lookup(scope, name) {
                    Some(Binding::Local(id)) => Resolution::Local(id.clone()),
                    Some(Binding::Parameter) => Resolution::Parameter(name.to_string()),
                    Some(Binding::Module { dotted, .. }) => Resolution::External(dotted.clone()),
                    Some(Binding::Imported { target }) => Resolution::External(target.clone()),
                    None => Resolution::Unknown(name.to_string()),
                }
            }
            "attribute" => {
                let (Some(object), Some(attr)) = (
                    expr.child_by_field_name("object"),
                    expr.child_by_field_name("attribute"),
                ) else {
                    return Resolution::Unknown(compact(expr, self.source));
                };
                let attr = syntax::text(attr, self.source);

                if is_receiver(object, self.source) && self.scopes.kind(scope) == ScopeKind::Method {
                    if let Some(class_id) = self.scopes.enclosing_class(scope) {
                        let candidate = member_id(class_id, attr);
                        if self.ctx.has_node(&candidate) {
                            return Resolution::Local(candidate);
                        }
                    }
                    return Resolution::Unknown(compact(expr, self.source));
                }

                // `import a.b` binds the whole dotted path
                if let Some(Binding::Module { path, .. }) =
                    self.scopes.lookup(scope, &compact(object, self.source))
                {
                    return Resolution::External(scoped_id(path, attr));
                }

                match self.resolve(object, scope) {
                    Resolution::Local(container) => {
                        let candidate = member_id(&container, attr);
                        if self.ctx.has_node(&candidate) {
                            Resolution::Local(candidate)
                        } else {
                            Resolution::Unknown(compact(expr, self.source))
                        }
                    }
                    Resolution::External(base) => Resolution::External(format!("{base}.{attr}")),
                    _ => Resolution::Unknown(compact(expr, self.source)),
                }
            }
            _ => Resolution::Unknown(compact(expr, self.source)),
        }
    }
}

/// Identifier and attribute targets of an assignment's left-hand side.
fn assignment_targets(left: Node) -> Vec<Node> {
    let mut targets = Vec::new();
    let mut stack = vec![left];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "identifier" | "attribute" => targets.push(node),
            "pattern_list" | "tuple_pattern" | "list_pattern" | "tuple" | "list"
            | "parenthesized_expression" | "list_splat_pattern" => {
                stack.extend(syntax::named_children(node).into_iter().rev());
            }
            _ => {}
        }
    }
    targets
}

/// `self` / `cls` as the object of an attribute
fn is_receiver(object: Node, source: &[u8]) -> bool {
    object.kind() == "identifier" && matches!(syntax::text(object, source), "self" | "cls")
}

fn is_dynamic_import(resolution: &Resolution) -> bool {
    match resolution {
        Resolution::Unknown(name) => name == "__import__" || name == "importlib.import_module",
        Resolution::External(target) => {
            target == "importlib.import_module" || target == "importlib.py::import_module"
        }
        _ => false,
    }
}

fn describe(resolution: Resolution) -> (String, &'static str) {
    match resolution {
        Resolution::Local(id) => (id, "target is not a legal endpoint"),
        Resolution::External(target) => (target, "defined in another module"),
        Resolution::Parameter(name) => (name, "bound to a parameter"),
        Resolution::Unknown(text) => (text, "not defined in this file"),
    }
}

/// Expression text on one line
fn compact(node: Node, source: &[u8]) -> String {
    syntax::text(node, source)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

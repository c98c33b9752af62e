//! Small helpers over tree-sitter-python nodes.

use tree_sitter::Node;

/// Source text of a node
pub fn text<'s>(node: Node, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or("")
}

/// 1-based line of the node's first character
pub fn line(node: Node) -> usize {
    node.start_position().row + 1
}

/// 1-based inclusive line span
pub fn line_span(node: Node) -> (usize, usize) {
    (node.start_position().row + 1, node.end_position().row + 1)
}

pub fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Split a definition statement into its decorators and the definition itself.
///
/// Plain `function_definition` / `class_definition` nodes have no decorators.
pub fn unwrap_decorated(node: Node) -> (Vec<Node>, Option<Node>) {
    if node.kind() != "decorated_definition" {
        return (Vec::new(), Some(node));
    }
    let decorators = named_children(node)
        .into_iter()
        .filter(|child| child.kind() == "decorator")
        .collect();
    (decorators, node.child_by_field_name("definition"))
}

/// The expression under a `decorator` node (`@x.y(...)` -> `x.y(...)`)
pub fn decorator_expression(decorator: Node) -> Option<Node> {
    named_children(decorator)
        .into_iter()
        .find(|child| child.kind() != "comment")
}

/// Decorator as written, with call arguments collapsed (`@app.route(...)`).
pub fn decorator_label(decorator: Node, source: &[u8]) -> String {
    match decorator_expression(decorator) {
        Some(expr) if expr.kind() == "call" => {
            let callee = expr
                .child_by_field_name("function")
                .map(|f| text(f, source))
                .unwrap_or("<complex_call>");
            format!("@{callee}(...)")
        }
        Some(expr) => format!("@{}", text(expr, source)),
        None => "@<complex>".to_string(),
    }
}

pub fn is_async(definition: Node) -> bool {
    let mut cursor = definition.walk();
    let result = definition
        .children(&mut cursor)
        .take_while(|child| child.kind() != "def")
        .any(|child| child.kind() == "async");
    result
}

/// Docstring of a module or of a definition body.
///
/// Only a string literal that is the first statement counts.
pub fn docstring(body: Node, source: &[u8]) -> Option<String> {
    let first = named_children(body)
        .into_iter()
        .find(|child| child.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let literal = named_children(first).into_iter().next()?;
    if literal.kind() != "string" {
        return None;
    }
    let doc = strip_string_literal(text(literal, source));
    let doc = dedent(doc);
    if doc.is_empty() {
        None
    } else {
        Some(doc)
    }
}

fn strip_string_literal(raw: &str) -> &str {
    let body = raw.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if body.len() >= 2 * quote.len() && body.starts_with(quote) && body.ends_with(quote) {
            return &body[quote.len()..body.len() - quote.len()];
        }
    }
    body
}

/// Strip common leading indentation from all lines after the first.
fn dedent(doc: &str) -> String {
    let mut lines = doc.lines();
    let first = lines.next().unwrap_or("").trim();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = vec![first.to_string()];
    out.extend(
        rest.iter()
            .map(|l| l.get(indent..).unwrap_or("").trim_end().to_string()),
    );
    out.join("\n").trim().to_string()
}

/// Identifier nodes bound by an assignment target (`x`, `a, b`, `(a, [b, c])`).
///
/// Attribute and subscript targets bind nothing.
pub fn bound_names(target: Node) -> Vec<Node> {
    let mut names = Vec::new();
    let mut stack = vec![target];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "identifier" => names.push(node),
            "pattern_list" | "tuple_pattern" | "list_pattern" | "tuple" | "list"
            | "parenthesized_expression" | "list_splat_pattern" => {
                let mut children = named_children(node);
                children.reverse();
                stack.extend(children);
            }
            _ => {}
        }
    }
    names
}

/// Source position of the first syntax error, if any.
pub fn first_error(root: Node) -> Option<(usize, usize)> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let pos = node.start_position();
            return Some((pos.row + 1, pos.column + 1));
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let mut children: Vec<Node> = node.children(&mut cursor).collect();
            children.reverse();
            stack.extend(children);
        }
    }
    None
}

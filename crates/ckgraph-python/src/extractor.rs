//! Fragment extraction for one Python source file

use crate::{relations, structure, syntax};
use ckgraph::identity::{file_id, normalize_path};
use ckgraph::{Fragment, Node as GraphNode, NodeType, Schema};
use ckgraph_builder_api::{BuilderConfig, BuilderError, EmitContext};
use std::path::PathBuf;
use tracing::debug;
use tree_sitter::Parser;

pub const LANGUAGE: &str = "python";

/// Extract a fragment from Python source.
///
/// Source with syntax errors is rejected; a partial tree would yield
/// declarations that are not proven.
pub fn extract(
    source: &str,
    file_path: &str,
    config: &BuilderConfig,
    schema: &Schema,
) -> Result<Fragment, BuilderError> {
    let path = normalize_path(file_path);

    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
    parser
        .set_language(&language)
        .map_err(|e| BuilderError::ParseError(PathBuf::from(&path), e.to_string()))?;

    let tree = parser.parse(source, None).ok_or_else(|| {
        BuilderError::ParseError(PathBuf::from(&path), "Failed to parse".to_string())
    })?;

    let root = tree.root_node();
    if root.has_error() {
        let (line, column) = syntax::first_error(root).unwrap_or((0, 0));
        return Err(BuilderError::SyntaxError(
            PathBuf::from(&path),
            line,
            column,
            "Syntax error in source code".to_string(),
        ));
    }

    let bytes = source.as_bytes();
    let mut ctx = EmitContext::new(&path, LANGUAGE, source, schema);

    let file_name = path.rsplit('/').next().unwrap_or(&path).to_string();
    let mut file = GraphNode::new(file_id(NodeType::File, &path), NodeType::File, file_name)
        .with_file(&path)
        .with_hash(ctx.file_hash().to_string())
        .with_lines(1, source.lines().count().max(1));
    if config.include_docs {
        file = file.with_docstring(syntax::docstring(root, bytes));
    }
    ctx.node(file);

    let declarations = structure::collect(&mut ctx, root, bytes, &path, config);
    relations::link(&mut ctx, root, bytes, config, declarations);

    let fragment = ctx.finish();
    debug!(
        file = %path,
        nodes = fragment.nodes.len(),
        edges = fragment.edges.len(),
        ambiguities = fragment.ambiguities.len(),
        "Extracted Python fragment"
    );
    Ok(fragment)
}

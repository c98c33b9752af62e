//! Read-only queries over a merged graph.
//!
//! [`NodeQuery`] is the fluent filter builder used for search;
//! [`QueryEngine`] exposes the command surface (search, locate, read,
//! details, impact, dependencies, call-graph, stats, list-files).

use crate::error::{GraphError, Result};
use crate::graph::traversal::{self, Reach};
use crate::graph::{AttributeValue, Direction, EdgeType, KnowledgeGraph, Node, NodeType};
use crate::identity;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const DEFAULT_SEARCH_LIMIT: usize = 50;
pub const DEFAULT_DEPENDENCY_DEPTH: usize = 1;
pub const DEFAULT_IMPACT_DEPTH: usize = 2;

/// A filter predicate that can be applied to nodes.
type FilterFn<'q> = Box<dyn Fn(&Node) -> bool + 'q>;

/// Fluent filter builder over the graph's nodes.
///
/// ```
/// use ckgraph::{KnowledgeGraph, NodeQuery, NodeType};
///
/// let graph = KnowledgeGraph::new();
/// let views = NodeQuery::new(&graph)
///     .node_type(NodeType::Function)
///     .name_contains("login")
///     .limit(10)
///     .execute();
/// assert!(views.is_empty());
/// ```
pub struct NodeQuery<'g> {
    graph: &'g KnowledgeGraph,
    filters: Vec<FilterFn<'g>>,
    limit_value: Option<usize>,
}

impl<'g> NodeQuery<'g> {
    pub fn new(graph: &'g KnowledgeGraph) -> Self {
        Self {
            graph,
            filters: Vec::new(),
            limit_value: None,
        }
    }

    pub fn node_type(mut self, node_type: NodeType) -> Self {
        self.filters.push(Box::new(move |node| node.node_type == node_type));
        self
    }

    /// Name or id contains `substring` (case-insensitive).
    pub fn name_contains(mut self, substring: &str) -> Self {
        let substring = substring.to_lowercase();
        self.filters.push(Box::new(move |node| {
            node.name.to_lowercase().contains(&substring)
                || node.id.to_lowercase().contains(&substring)
        }));
        self
    }

    /// Match a `key:value` pair against decorators, direct fields or attributes.
    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        let key = key.to_lowercase();
        let value = value.to_lowercase();
        self.filters
            .push(Box::new(move |node| attribute_matches(node, &key, &value)));
        self
    }

    pub fn custom<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Node) -> bool + 'g,
    {
        self.filters.push(Box::new(predicate));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit_value = Some(n);
        self
    }

    /// Matching nodes in id order, up to the limit.
    pub fn execute(&self) -> Vec<&'g Node> {
        let limit = self.limit_value.unwrap_or(usize::MAX);
        self.graph
            .nodes()
            .filter(|node| self.filters.iter().all(|filter| filter(*node)))
            .take(limit)
            .collect()
    }
}

fn attribute_matches(node: &Node, key: &str, value: &str) -> bool {
    match key {
        "decorator" | "@" => node
            .signature
            .as_ref()
            .map(|sig| sig.decorators.as_slice())
            .into_iter()
            .chain(node.attributes.get_string_list("decorators"))
            .flatten()
            .any(|d| d.to_lowercase().contains(value)),
        "name" => node.name.to_lowercase() == value,
        "type" | "node_type" => node.node_type.as_str().to_lowercase() == value,
        "file" | "file_path" => node
            .file_path
            .as_deref()
            .is_some_and(|p| p.to_lowercase() == value),
        _ => match node.attributes.get(key) {
            Some(AttributeValue::String(s)) => s.to_lowercase() == value,
            Some(AttributeValue::Bool(b)) => b.to_string() == value,
            Some(AttributeValue::Int(i)) => i.to_string() == value,
            Some(AttributeValue::StringList(list)) => list.iter().any(|s| s.to_lowercase() == value),
            Some(AttributeValue::Null) | None => false,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSummary {
    pub id: String,
    pub node_type: NodeType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_start: Option<usize>,
}

impl From<&Node> for NodeSummary {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id.clone(),
            node_type: node.node_type,
            name: node.name.clone(),
            file_path: node.file_path.clone(),
            line_start: node.line_start,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub id: String,
    pub file: Option<String>,
    pub line_start: Option<usize>,
    pub line_end: Option<usize>,
    pub docstring: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    pub id: String,
    pub file: String,
    pub line_start: Option<usize>,
    pub line_end: Option<usize>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Traversal {
    pub node_id: String,
    pub depth: usize,
    pub reached: BTreeMap<String, Reach>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallSite {
    pub id: String,
    pub name: String,
    pub node_type: NodeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_line: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CallSummary {
    pub calls: usize,
    pub called_by: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallGraph {
    pub node_id: String,
    pub calls: Vec<CallSite>,
    pub called_by: Vec<CallSite>,
    pub summary: CallSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub total_ambiguities: usize,
    pub node_type_histogram: BTreeMap<NodeType, usize>,
    pub edge_type_histogram: BTreeMap<EdgeType, usize>,
}

/// Commands accepted by [`QueryEngine::execute`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum QueryCommand {
    Search {
        query: String,
        #[serde(default)]
        node_type: Option<NodeType>,
    },
    Locate {
        id: String,
    },
    Read {
        id: String,
    },
    Details {
        id: String,
    },
    Impact {
        id: String,
        #[serde(default)]
        depth: Option<usize>,
    },
    Dependencies {
        id: String,
        #[serde(default)]
        depth: Option<usize>,
    },
    CallGraph {
        id: String,
    },
    Stats,
    ListFiles,
}

/// Query surface over a borrowed graph.
pub struct QueryEngine<'g> {
    graph: &'g KnowledgeGraph,
    project_root: PathBuf,
    limit: usize,
}

impl<'g> QueryEngine<'g> {
    pub fn new(graph: &'g KnowledgeGraph) -> Self {
        Self {
            graph,
            project_root: PathBuf::from("."),
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Root that node file paths are relative to, used by [`read`](Self::read).
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Search by substring over name and id, or by `key:value`.
    ///
    /// A query with a single colon and no `::` is a `key:value` query unless
    /// the key is a node type name, in which case it is treated as an id
    /// fragment (`StyleClass:.btn`). Exact name matches are listed first.
    pub fn search(&self, query: &str, node_type: Option<NodeType>) -> Vec<NodeSummary> {
        let mut builder = NodeQuery::new(self.graph);
        if let Some(node_type) = node_type {
            builder = builder.node_type(node_type);
        }

        let key_value = match query.split_once(':') {
            Some((key, value))
                if !query.contains("::")
                    && !key.is_empty()
                    && !value.is_empty()
                    && key.parse::<NodeType>().is_err() =>
            {
                Some((key, value))
            }
            _ => None,
        };
        builder = match key_value {
            Some((key, value)) => builder.attribute(key, value),
            None => builder.name_contains(query),
        };

        let needle = query.to_lowercase();
        let mut hits = builder.execute();
        hits.sort_by_key(|node| node.name.to_lowercase() != needle);

        debug!("search '{query}' matched {} node(s)", hits.len());
        hits.into_iter()
            .take(self.limit)
            .map(NodeSummary::from)
            .collect()
    }

    pub fn locate(&self, id: &str) -> Result<Location> {
        let node = self.graph.get_node(id)?;
        Ok(Location {
            id: node.id.clone(),
            file: node_file(node),
            line_start: node.line_start,
            line_end: node.line_end,
            docstring: node.docstring.clone(),
        })
    }

    /// Source text for a node: its line span, or the whole file without one.
    pub fn read(&self, id: &str) -> Result<Snippet> {
        let node = self.graph.get_node(id)?;
        let file = node_file(node).ok_or_else(|| {
            GraphError::invalid_operation(format!("node '{id}' is not anchored to a file"))
        })?;
        let path = self.project_root.join(&file);
        let text = read_source(&path)?;

        let content = match node.line_start {
            None => text,
            Some(start) => {
                let end = node.line_end.unwrap_or(start).max(start);
                let total = text.lines().count();
                if start == 0 || start > total {
                    return Err(GraphError::invalid_operation(format!(
                        "line {start} of '{id}' is outside {file} ({total} lines)"
                    )));
                }
                text.lines()
                    .skip(start - 1)
                    .take(end.min(total) - start + 1)
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        };

        Ok(Snippet {
            id: node.id.clone(),
            file,
            line_start: node.line_start,
            line_end: node.line_end,
            content,
        })
    }

    pub fn details(&self, id: &str) -> Result<&'g Node> {
        self.graph.get_node(id)
    }

    /// What `id` depends on, following outgoing edges.
    pub fn dependencies(&self, id: &str, depth: Option<usize>) -> Result<Traversal> {
        self.traverse(id, Direction::Outgoing, depth.unwrap_or(DEFAULT_DEPENDENCY_DEPTH))
    }

    /// What depends on `id`, following incoming edges.
    pub fn impact(&self, id: &str, depth: Option<usize>) -> Result<Traversal> {
        self.traverse(id, Direction::Incoming, depth.unwrap_or(DEFAULT_IMPACT_DEPTH))
    }

    fn traverse(&self, id: &str, direction: Direction, depth: usize) -> Result<Traversal> {
        let reached = traversal::bfs(self.graph, id, direction, depth)?;
        Ok(Traversal {
            node_id: id.to_string(),
            depth,
            reached,
        })
    }

    pub fn call_graph(&self, id: &str) -> Result<CallGraph> {
        self.graph.get_node(id)?;

        let site = |other: &str, line: Option<i64>| -> Result<CallSite> {
            let node = self.graph.get_node(other)?;
            Ok(CallSite {
                id: node.id.clone(),
                name: node.name.clone(),
                node_type: node.node_type,
                call_line: line.and_then(|l| usize::try_from(l).ok()),
            })
        };

        let calls = self
            .graph
            .outgoing(id)
            .filter(|e| e.edge_type == EdgeType::Calls)
            .map(|e| site(&e.target, e.attributes.get_int("call_line")))
            .collect::<Result<Vec<_>>>()?;
        let called_by = self
            .graph
            .incoming(id)
            .filter(|e| e.edge_type == EdgeType::Calls)
            .map(|e| site(&e.source, e.attributes.get_int("call_line")))
            .collect::<Result<Vec<_>>>()?;

        let summary = CallSummary {
            calls: calls.len(),
            called_by: called_by.len(),
        };
        Ok(CallGraph {
            node_id: id.to_string(),
            calls,
            called_by,
            summary,
        })
    }

    pub fn stats(&self) -> GraphStats {
        let mut node_type_histogram = BTreeMap::new();
        for node in self.graph.nodes() {
            *node_type_histogram.entry(node.node_type).or_insert(0) += 1;
        }
        let mut edge_type_histogram = BTreeMap::new();
        for edge in self.graph.edges() {
            *edge_type_histogram.entry(edge.edge_type).or_insert(0) += 1;
        }
        GraphStats {
            total_nodes: self.graph.node_count(),
            total_edges: self.graph.edge_count(),
            total_ambiguities: self.graph.ambiguity_count(),
            node_type_histogram,
            edge_type_histogram,
        }
    }

    /// Distinct file paths referenced by nodes, sorted.
    pub fn list_files(&self) -> Vec<String> {
        self.graph
            .nodes()
            .filter_map(|n| n.file_path.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Run a command and render its result as JSON.
    pub fn execute(&self, command: &QueryCommand) -> Result<serde_json::Value> {
        let value = match command {
            QueryCommand::Search { query, node_type } => {
                serde_json::to_value(self.search(query, *node_type))?
            }
            QueryCommand::Locate { id } => serde_json::to_value(self.locate(id)?)?,
            QueryCommand::Read { id } => serde_json::to_value(self.read(id)?)?,
            QueryCommand::Details { id } => serde_json::to_value(self.details(id)?)?,
            QueryCommand::Impact { id, depth } => serde_json::to_value(self.impact(id, *depth)?)?,
            QueryCommand::Dependencies { id, depth } => {
                serde_json::to_value(self.dependencies(id, *depth)?)?
            }
            QueryCommand::CallGraph { id } => serde_json::to_value(self.call_graph(id)?)?,
            QueryCommand::Stats => serde_json::to_value(self.stats())?,
            QueryCommand::ListFiles => serde_json::to_value(self.list_files())?,
        };
        Ok(value)
    }
}

fn node_file(node: &Node) -> Option<String> {
    node.file_path
        .as_deref()
        .map(identity::normalize_path)
        .or_else(|| identity::file_of(&node.id))
}

fn read_source(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(GraphError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::read_to_string(path).map_err(|e| GraphError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Signature};

    fn sample() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        graph
            .add_node(Node::new("File:app/views.py", NodeType::File, "views.py").with_file("app/views.py"))
            .unwrap();
        graph
            .add_node(
                Node::new("app/views.py::login", NodeType::Function, "login")
                    .with_file("app/views.py")
                    .with_lines(3, 5)
                    .with_signature(Signature {
                        decorators: vec!["@login_required".to_string()],
                        ..Signature::default()
                    }),
            )
            .unwrap();
        graph
            .add_node(
                Node::new("app/views.py::render_login", NodeType::Function, "render_login")
                    .with_file("app/views.py"),
            )
            .unwrap();
        graph
            .add_node(Node::new("Route:/login", NodeType::Route, "/login").with_attribute("method", "POST"))
            .unwrap();
        graph
            .add_edge(Edge::new("File:app/views.py", "app/views.py::login", EdgeType::Defines))
            .unwrap();
        graph
            .add_edge(
                Edge::new("app/views.py::login", "app/views.py::render_login", EdgeType::Calls)
                    .with_attribute("call_line", 4usize),
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_search_substring_ranks_exact_name_first() {
        let graph = sample();
        let engine = QueryEngine::new(&graph);
        let hits = engine.search("LOGIN", None);
        assert_eq!(hits[0].id, "app/views.py::login");
        assert!(hits.iter().any(|h| h.id == "app/views.py::render_login"));
        assert!(hits.iter().any(|h| h.id == "Route:/login"));
    }

    #[test]
    fn test_search_type_filter_and_limit() {
        let graph = sample();
        let engine = QueryEngine::new(&graph).with_limit(1);
        let hits = engine.search("login", Some(NodeType::Function));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node_type, NodeType::Function);
    }

    #[test]
    fn test_search_key_value() {
        let graph = sample();
        let engine = QueryEngine::new(&graph);
        assert_eq!(engine.search("decorator:login_required", None)[0].id, "app/views.py::login");
        assert_eq!(engine.search("method:post", None)[0].id, "Route:/login");
        assert_eq!(engine.search("Route:/login", None)[0].id, "Route:/login");
        assert!(engine.search("method:get", None).is_empty());
    }

    #[test]
    fn test_locate_and_not_found() {
        let graph = sample();
        let engine = QueryEngine::new(&graph);
        let location = engine.locate("app/views.py::login").unwrap();
        assert_eq!(location.file.as_deref(), Some("app/views.py"));
        assert_eq!(location.line_end, Some(5));
        assert!(matches!(engine.locate("nope"), Err(GraphError::NodeNotFound { .. })));
    }

    #[test]
    fn test_dependencies_and_impact_defaults() {
        let graph = sample();
        let engine = QueryEngine::new(&graph);

        let deps = engine.dependencies("File:app/views.py", None).unwrap();
        assert_eq!(deps.depth, DEFAULT_DEPENDENCY_DEPTH);
        assert_eq!(deps.reached.len(), 1);

        let impact = engine.impact("app/views.py::render_login", None).unwrap();
        assert_eq!(impact.reached["app/views.py::login"].relation, EdgeType::Calls);
        assert_eq!(impact.reached["File:app/views.py"].depth, 2);

        assert!(matches!(
            engine.impact("app/views.py::login", Some(0)),
            Err(GraphError::InvalidDepth { .. })
        ));
    }

    #[test]
    fn test_call_graph() {
        let graph = sample();
        let engine = QueryEngine::new(&graph);
        let cg = engine.call_graph("app/views.py::render_login").unwrap();
        assert!(cg.calls.is_empty());
        assert_eq!(cg.called_by[0].id, "app/views.py::login");
        assert_eq!(cg.called_by[0].call_line, Some(4));
        assert_eq!(cg.summary.called_by, 1);
    }

    #[test]
    fn test_stats_and_list_files() {
        let graph = sample();
        let engine = QueryEngine::new(&graph);
        let stats = engine.stats();
        assert_eq!(stats.total_nodes, 4);
        assert_eq!(stats.node_type_histogram[&NodeType::Function], 2);
        assert_eq!(stats.edge_type_histogram[&EdgeType::Calls], 1);
        assert_eq!(engine.list_files(), vec!["app/views.py".to_string()]);
    }

    #[test]
    fn test_execute_parses_commands() {
        let graph = sample();
        let engine = QueryEngine::new(&graph);
        let command: QueryCommand =
            serde_json::from_str(r#"{"command":"call-graph","id":"app/views.py::login"}"#).unwrap();
        let value = engine.execute(&command).unwrap();
        assert_eq!(value["summary"]["calls"], 1);

        let stats: QueryCommand = serde_json::from_str(r#"{"command":"list-files"}"#).unwrap();
        assert_eq!(engine.execute(&stats).unwrap()[0], "app/views.py");
    }

    #[test]
    fn test_read_without_file_anchor() {
        let graph = sample();
        let engine = QueryEngine::new(&graph);
        assert!(matches!(
            engine.read("Route:/login"),
            Err(GraphError::InvalidOperation { .. })
        ));
    }
}

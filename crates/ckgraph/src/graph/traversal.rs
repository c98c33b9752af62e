//! Depth-bounded breadth-first traversal.
//!
//! Iterative with a visited set, so cyclic call graphs terminate and deep
//! graphs cannot exhaust the stack.

use super::knowledge::KnowledgeGraph;
use super::types::{Direction, EdgeType, NodeType};
use crate::error::{GraphError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};

/// How a node was reached during traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reach {
    /// Type of the edge that first reached the node
    pub relation: EdgeType,
    /// Number of hops from the start node
    pub depth: usize,
    pub node_type: NodeType,
}

/// Breadth-first search from `start` following edges in `direction`.
///
/// Returns every node reachable within `max_depth` hops, excluding `start`.
/// Each node is reported once, with the relation and depth of the first
/// (shortest) path found; ties break by edge identity order.
///
/// # Errors
/// `NodeNotFound` if `start` is not in the graph, `InvalidDepth` if
/// `max_depth` is zero.
pub fn bfs(
    graph: &KnowledgeGraph,
    start: &str,
    direction: Direction,
    max_depth: usize,
) -> Result<BTreeMap<String, Reach>> {
    if max_depth == 0 {
        return Err(GraphError::InvalidDepth { depth: max_depth });
    }
    graph.get_node(start)?;

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue = VecDeque::new();
    let mut result = BTreeMap::new();

    visited.insert(start);
    queue.push_back((start, 0usize));

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }

        for edge in graph.edges_of(current, direction) {
            let neighbor = match direction {
                Direction::Outgoing => edge.target.as_str(),
                Direction::Incoming => edge.source.as_str(),
            };
            if !visited.insert(neighbor) {
                continue;
            }
            let node_type = graph.get_node(neighbor)?.node_type;
            result.insert(
                neighbor.to_string(),
                Reach {
                    relation: edge.edge_type,
                    depth: depth + 1,
                    node_type,
                },
            );
            queue.push_back((neighbor, depth + 1));
        }
    }

    Ok(result)
}

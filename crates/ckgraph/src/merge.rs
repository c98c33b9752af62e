//! Deterministic merge of fragments into one knowledge graph.
//!
//! The result depends only on the fragments' contents: they are put in a
//! canonical order first, every node is re-keyed through
//! [`identity::resolve`], and every edge endpoint is rewritten through the
//! owning fragment's raw-to-canonical map.

use crate::graph::{Ambiguity, AmbiguityKind, Edge, Fragment, KnowledgeGraph};
use crate::identity;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Tie-break rules for fragments covering the same file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePolicy {
    /// Languages in priority order; unlisted languages sort after these,
    /// alphabetically.
    pub language_priority: Vec<String>,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            language_priority: vec!["python".to_string(), "html".to_string(), "css".to_string()],
        }
    }
}

impl MergePolicy {
    fn rank<'a>(&self, language: &'a str) -> (usize, &'a str) {
        let position = self
            .language_priority
            .iter()
            .position(|l| l == language)
            .unwrap_or(self.language_priority.len());
        (position, language)
    }

    fn compare(&self, a: &Fragment, b: &Fragment) -> Ordering {
        identity::normalize_path(&a.source_file)
            .cmp(&identity::normalize_path(&b.source_file))
            .then_with(|| self.rank(&a.language).cmp(&self.rank(&b.language)))
            .then_with(|| a.file_hash.cmp(&b.file_hash))
            .then_with(|| {
                // Only reached for duplicate fragments of one file and language.
                let left = serde_json::to_string(a).unwrap_or_default();
                let right = serde_json::to_string(b).unwrap_or_default();
                left.cmp(&right)
            })
    }
}

/// Merge with the default [`MergePolicy`].
pub fn merge(fragments: Vec<Fragment>) -> KnowledgeGraph {
    merge_with(fragments, &MergePolicy::default())
}

/// Merge fragments into a graph.
///
/// Never fails: node attribute disagreements and edges whose endpoints do
/// not survive the merge are recorded as ambiguities on the graph.
pub fn merge_with(mut fragments: Vec<Fragment>, policy: &MergePolicy) -> KnowledgeGraph {
    fragments.sort_by(|a, b| policy.compare(a, b));

    let mut graph = KnowledgeGraph::new();
    let mut local_maps: Vec<HashMap<&str, String>> = Vec::with_capacity(fragments.len());
    let mut conflicts = Vec::new();

    for fragment in &fragments {
        let mut local = HashMap::new();
        for node in &fragment.nodes {
            let resolved = identity::resolve(node);
            local.insert(node.id.as_str(), resolved.id.clone());

            let mut canonical = node.clone();
            canonical.id = resolved.id;
            canonical.file_path = canonical.file_path.map(|path| identity::normalize_path(&path));

            if let Some(existing) = graph.node_mut(&canonical.id) {
                for conflict in existing.absorb(&canonical) {
                    conflicts.push(
                        Ambiguity::new(
                            canonical.id.clone(),
                            format!("{}={}", conflict.field, conflict.discarded),
                            AmbiguityKind::AttributeConflict,
                        )
                        .with_reason(format!(
                            "kept '{}'; {} disagreed",
                            conflict.kept, fragment.source_file
                        )),
                    );
                }
                continue;
            }

            debug!("Node {} -> {} ({} tier)", node.id, canonical.id, resolved.tier);
            // Fresh key, so insertion cannot collide.
            let _ = graph.add_node(canonical);
        }
        local_maps.push(local);
    }

    let mut orphans = Vec::new();
    for (fragment, local) in fragments.iter().zip(&local_maps) {
        let canonical = |raw: &str| {
            local
                .get(raw)
                .cloned()
                .unwrap_or_else(|| identity::canonicalize_reference(raw))
        };

        for edge in &fragment.edges {
            let remapped = Edge {
                source: canonical(&edge.source),
                target: canonical(&edge.target),
                edge_type: edge.edge_type,
                attributes: edge.attributes.clone(),
            };
            let source = remapped.source.clone();
            let edge_type = remapped.edge_type;

            if let Err(err) = graph.add_edge(remapped) {
                let missing = match err {
                    crate::GraphError::NodeNotFound { node_id } => node_id,
                    other => other.to_string(),
                };
                debug!("Dropping orphan {edge_type} edge from {source}: {missing} missing");
                let mut ambiguity = Ambiguity::new(source, missing, AmbiguityKind::OrphanEdgeDropped)
                    .with_reason(format!(
                        "{edge_type} edge from {} has no surviving endpoint",
                        fragment.source_file
                    ));
                if let Some(line) = edge
                    .attributes
                    .get_int("call_line")
                    .or_else(|| edge.attributes.get_int("line"))
                {
                    ambiguity = ambiguity.with_line(usize::try_from(line).unwrap_or_default());
                }
                orphans.push(ambiguity);
            }
        }

        for ambiguity in &fragment.ambiguities {
            let mut ambiguity = ambiguity.clone();
            if let Some(mapped) = local.get(ambiguity.source.as_str()) {
                if *mapped != ambiguity.source {
                    ambiguity.set_source(mapped.clone());
                }
            }
            graph.add_ambiguity(ambiguity);
        }
    }

    let conflict_count = conflicts.len();
    let orphan_count = orphans.len();
    for ambiguity in conflicts.into_iter().chain(orphans) {
        graph.add_ambiguity(ambiguity);
    }

    info!(
        "Merged {} fragments: {} nodes, {} edges, {} ambiguities ({} orphan edges dropped, {} attribute conflicts)",
        fragments.len(),
        graph.node_count(),
        graph.edge_count(),
        graph.ambiguity_count(),
        orphan_count,
        conflict_count
    );

    graph
}

//! Incremental change detection between two graph snapshots.
//!
//! Files are compared by the content hash on their file-kind node. Node
//! status is derived from the owning file, found by walking ownership edges
//! (`defines`, `contains_method`, `contains_variable`) down from each file.

use crate::graph::{KnowledgeGraph, Node};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Added,
    Removed,
    Modified,
    Unchanged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
}

impl DiffStats {
    fn count<'a>(statuses: impl Iterator<Item = &'a ChangeStatus>) -> Self {
        let mut stats = DiffStats::default();
        for status in statuses {
            match status {
                ChangeStatus::Added => stats.added += 1,
                ChangeStatus::Removed => stats.removed += 1,
                ChangeStatus::Modified => stats.modified += 1,
                ChangeStatus::Unchanged => stats.unchanged += 1,
            }
        }
        stats
    }

    pub fn changed(&self) -> usize {
        self.added + self.removed + self.modified
    }
}

/// Result of comparing two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffReport {
    /// Status per file-kind node id
    pub files: BTreeMap<String, ChangeStatus>,
    /// Status per node id, file-kind nodes included
    pub nodes: BTreeMap<String, ChangeStatus>,
    pub file_stats: DiffStats,
    pub node_stats: DiffStats,
}

impl DiffReport {
    /// Report for a first build with no previous snapshot: everything is added.
    pub fn initial(current: &KnowledgeGraph) -> Self {
        let files = current
            .file_nodes()
            .map(|n| (n.id.clone(), ChangeStatus::Added))
            .collect();
        let nodes = current
            .nodes()
            .map(|n| (n.id.clone(), ChangeStatus::Added))
            .collect();
        Self::from_maps(files, nodes)
    }

    fn from_maps(files: BTreeMap<String, ChangeStatus>, nodes: BTreeMap<String, ChangeStatus>) -> Self {
        let file_stats = DiffStats::count(files.values());
        let node_stats = DiffStats::count(nodes.values());
        Self {
            files,
            nodes,
            file_stats,
            node_stats,
        }
    }

    /// File ids with the given status, in id order.
    pub fn files_with(&self, status: ChangeStatus) -> Vec<&str> {
        self.files
            .iter()
            .filter(|(_, s)| **s == status)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn has_changes(&self) -> bool {
        self.file_stats.changed() > 0 || self.node_stats.changed() > 0
    }
}

/// Compare a previous snapshot with the current one.
///
/// A file whose hash is missing on either side is reported as modified,
/// since equality cannot be proven.
pub fn diff(previous: &KnowledgeGraph, current: &KnowledgeGraph) -> DiffReport {
    let mut files = BTreeMap::new();

    for node in current.file_nodes() {
        let status = match previous.node(&node.id) {
            None => ChangeStatus::Added,
            Some(old) => file_status(old, node),
        };
        files.insert(node.id.clone(), status);
    }
    for node in previous.file_nodes() {
        if !current.contains_node(&node.id) {
            files.insert(node.id.clone(), ChangeStatus::Removed);
        }
    }

    let owners = ownership(current);
    let mut nodes = BTreeMap::new();

    for node in current.nodes() {
        let status = if node.node_type.is_file_kind() {
            files.get(&node.id).copied().unwrap_or(ChangeStatus::Modified)
        } else {
            match previous.node(&node.id) {
                None => ChangeStatus::Added,
                Some(old) => {
                    let owner_status = owners.get(node.id.as_str()).and_then(|f| files.get(*f));
                    match owner_status {
                        Some(ChangeStatus::Unchanged) => ChangeStatus::Unchanged,
                        _ if old == node => ChangeStatus::Unchanged,
                        _ => ChangeStatus::Modified,
                    }
                }
            }
        };
        nodes.insert(node.id.clone(), status);
    }
    for node in previous.nodes() {
        if !current.contains_node(&node.id) {
            nodes.insert(node.id.clone(), ChangeStatus::Removed);
        }
    }

    let report = DiffReport::from_maps(files, nodes);
    info!(
        "Diff: files +{} -{} ~{} ={}, nodes +{} -{} ~{} ={}",
        report.file_stats.added,
        report.file_stats.removed,
        report.file_stats.modified,
        report.file_stats.unchanged,
        report.node_stats.added,
        report.node_stats.removed,
        report.node_stats.modified,
        report.node_stats.unchanged,
    );
    report
}

fn file_status(old: &Node, new: &Node) -> ChangeStatus {
    match (&old.file_hash, &new.file_hash) {
        (Some(a), Some(b)) if a == b => ChangeStatus::Unchanged,
        _ => ChangeStatus::Modified,
    }
}

/// Map each owned node to the file-kind node that (transitively) owns it.
fn ownership(graph: &KnowledgeGraph) -> HashMap<&str, &str> {
    let mut owners = HashMap::new();
    for file in graph.file_nodes() {
        let mut queue = VecDeque::from([file.id.as_str()]);
        while let Some(current) = queue.pop_front() {
            for edge in graph.outgoing(current) {
                if !edge.edge_type.is_ownership() {
                    continue;
                }
                let target = edge.target.as_str();
                let is_file = graph.node(target).is_some_and(|n| n.node_type.is_file_kind());
                if is_file || owners.contains_key(target) {
                    continue;
                }
                owners.insert(target, file.id.as_str());
                queue.push_back(target);
            }
        }
    }
    owners
}

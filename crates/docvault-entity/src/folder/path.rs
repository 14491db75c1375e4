//! Materialized-path cache entries and the pure path algebra.
//!
//! The invariant the cache maintains: for every folder,
//! `path(folder) == child_path(path(parent), folder.name)`. The root
//! sentinel has the empty path, so a top-level folder's path is its bare
//! name and nested paths join with `/` (`"Reports/2024"`).
//!
//! The functions here are pure so the repository can lock a subtree, load
//! it as a snapshot, recompute every affected path in memory, and write the
//! results back inside the same transaction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use docvault_core::types::FolderId;

/// The path of the root sentinel.
pub const ROOT_PATH: &str = "";

/// A materialized-path cache row, one per folder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PathEntry {
    /// The folder this path belongs to.
    pub folder_id: FolderId,
    /// Full slash-delimited path from the root, e.g. `Reports/2024`.
    pub path: String,
}

/// The slice of a folder row needed for path recomputation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PathNode {
    /// Folder ID.
    pub id: FolderId,
    /// Parent folder ID within the snapshot (None at the snapshot root).
    pub parent_id: Option<FolderId>,
    /// Folder name.
    pub name: String,
}

/// Compute a child's full path from its parent's path and its own name.
pub fn child_path(parent_path: &str, name: &str) -> String {
    if parent_path.is_empty() {
        name.to_string()
    } else {
        format!("{parent_path}/{name}")
    }
}

/// Recompute the cached path of every folder in a subtree snapshot.
///
/// `nodes` must contain the subtree root and all of its descendants (the
/// rows the caller has locked). Paths are recomputed pre-order: the root
/// gets `new_root_path`, then each child's path is derived from its
/// parent's freshly computed path and the child's unchanged name. Returns
/// one `(folder_id, path)` pair per node.
pub fn propagate_paths(
    root: FolderId,
    new_root_path: &str,
    nodes: &[PathNode],
) -> Vec<(FolderId, String)> {
    let mut children: HashMap<FolderId, Vec<&PathNode>> = HashMap::new();
    for node in nodes {
        if let Some(parent) = node.parent_id {
            children.entry(parent).or_default().push(node);
        }
    }

    let mut updates = Vec::with_capacity(nodes.len());
    updates.push((root, new_root_path.to_string()));
    walk(root, new_root_path, &children, &mut updates);
    updates
}

fn walk(
    parent: FolderId,
    parent_path: &str,
    children: &HashMap<FolderId, Vec<&PathNode>>,
    updates: &mut Vec<(FolderId, String)>,
) {
    let Some(kids) = children.get(&parent) else {
        return;
    };
    for child in kids {
        let path = child_path(parent_path, &child.name);
        updates.push((child.id, path.clone()));
        walk(child.id, &path, children, updates);
    }
}

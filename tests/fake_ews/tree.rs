//! Test data model for the fake Exchange server
//!
//! ```ignore
//! let tree = TreeBuilder::new()
//!     .root(WellKnownFolder::MsgFolderRoot, "root", "Top of Information Store")
//!     .folder("root", "inbox", "Inbox", &[jan_1, jan_2])
//!     .folder("inbox", "projects", "Projects", &[])
//!     .build();
//! ```
//!
//! Folder ids double as the opaque EWS ids. Message counts and child
//! counts are derived from the tree when it is built.

use chrono::{DateTime, Utc};
use ews_discovery::{FolderHandle, FolderId, WellKnownFolder};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Node {
    id: String,
    parent: Option<String>,
    name: String,
    received: Vec<DateTime<Utc>>,
}

/// A built folder tree.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    roots: HashMap<WellKnownFolder, FolderHandle>,
    handles: HashMap<FolderId, FolderHandle>,
    children: HashMap<FolderId, Vec<FolderId>>,
    received: HashMap<FolderId, Vec<DateTime<Utc>>>,
}

impl Tree {
    pub fn root(&self, folder: WellKnownFolder) -> Option<&FolderHandle> {
        self.roots.get(&folder)
    }

    pub fn contains(&self, id: &FolderId) -> bool {
        self.handles.contains_key(id)
    }

    /// Children of `id` in insertion order.
    pub fn children(&self, id: &FolderId) -> Vec<FolderHandle> {
        self.children
            .get(id)
            .map(|ids| ids.iter().map(|c| self.handles[c].clone()).collect())
            .unwrap_or_default()
    }

    pub fn received(&self, id: &FolderId) -> &[DateTime<Utc>] {
        self.received.get(id).map_or(&[], Vec::as_slice)
    }
}

/// Builder for a [`Tree`].
pub struct TreeBuilder {
    roots: Vec<(WellKnownFolder, String)>,
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Add a root bindable through a well-known name.
    pub fn root(mut self, folder: WellKnownFolder, id: &str, name: &str) -> Self {
        self.roots.push((folder, id.to_string()));
        self.nodes.push(Node {
            id: id.to_string(),
            parent: None,
            name: name.to_string(),
            received: Vec::new(),
        });
        self
    }

    /// Add a folder below `parent` holding messages received at the
    /// given times.
    pub fn folder(mut self, parent: &str, id: &str, name: &str, received: &[DateTime<Utc>]) -> Self {
        self.nodes.push(Node {
            id: id.to_string(),
            parent: Some(parent.to_string()),
            name: name.to_string(),
            received: received.to_vec(),
        });
        self
    }

    /// Add a folder with `count` messages, all received at the epoch.
    pub fn folder_with(self, parent: &str, id: &str, name: &str, count: usize) -> Self {
        let received = vec![DateTime::<Utc>::UNIX_EPOCH; count];
        self.folder(parent, id, name, &received)
    }

    pub fn build(self) -> Tree {
        let mut tree = Tree::default();

        for node in &self.nodes {
            let id = FolderId::new(&node.id);
            let child_count = self
                .nodes
                .iter()
                .filter(|n| n.parent.as_deref() == Some(node.id.as_str()))
                .count();
            tree.handles.insert(
                id.clone(),
                FolderHandle {
                    id: id.clone(),
                    display_name: node.name.clone(),
                    total_count: node.received.len() as u64,
                    child_folder_count: child_count as u64,
                },
            );
            tree.received.insert(id.clone(), node.received.clone());
            if let Some(parent) = &node.parent {
                tree.children
                    .entry(FolderId::new(parent))
                    .or_default()
                    .push(id);
            }
        }

        for (folder, id) in self.roots {
            let handle = tree.handles[&FolderId::new(&id)].clone();
            tree.roots.insert(folder, handle);
        }

        tree
    }
}

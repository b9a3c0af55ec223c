//! Folder tree discovery
//!
//! Walks the remote folder hierarchy depth first and appends one
//! [`RemoteFolder`] per visited node to a caller-owned inventory. The
//! walk uses an explicit stack, and its depth is capped because the
//! shape of the tree comes from the server.

use crate::error::{Error, Result};
use crate::folder::{PUBLIC_ROOT_DISPLAY_NAME, RemoteFolder, child_path};
use crate::negotiate::Session;
use crate::service::{FolderHandle, FolderId, MailService, WellKnownFolder};
use tracing::{debug, info};

/// Deepest level below a root the walker will descend to.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Where a walk starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRoot {
    pub id: FolderId,
    /// Path prefix of every child; empty for the well-known roots.
    pub path: String,
    pub is_public: bool,
}

impl DiscoveryRoot {
    /// The user's mailbox root. Its own name never shows in paths.
    #[must_use]
    pub fn mailbox(handle: &FolderHandle) -> Self {
        Self {
            id: handle.id.clone(),
            path: String::new(),
            is_public: false,
        }
    }

    /// A public folder root. Like the mailbox root, its own name never
    /// shows in paths.
    #[must_use]
    pub fn public(handle: &FolderHandle) -> Self {
        Self {
            id: handle.id.clone(),
            path: String::new(),
            is_public: true,
        }
    }
}

/// Children of one visited folder still waiting to be processed.
struct Frame {
    path: String,
    is_public: bool,
    depth: usize,
    children: std::vec::IntoIter<FolderHandle>,
}

/// Discovers the folder tree below a root.
#[derive(Debug, Clone, Copy)]
pub struct FolderWalker {
    skip_empty: bool,
    max_depth: usize,
}

impl Default for FolderWalker {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderWalker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            skip_empty: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Leave out folders with no messages and no subfolders (default on).
    #[must_use]
    pub const fn skip_empty(mut self, skip_empty: bool) -> Self {
        self.skip_empty = skip_empty;
        self
    }

    #[must_use]
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Walk everything below `root`, appending to `inventory`.
    ///
    /// Folders are appended in pre-order: a folder comes right before
    /// its own descendants. Returns how many were appended.
    ///
    /// # Errors
    ///
    /// Propagates remote failures unchanged, and returns
    /// [`Error::TreeTooDeep`] when a folder with children sits at the
    /// depth limit.
    pub async fn walk<S: MailService>(
        &self,
        session: &Session<S>,
        root: &DiscoveryRoot,
        inventory: &mut Vec<RemoteFolder>,
    ) -> Result<usize> {
        debug!("Looking for sub folders of '{}'", root.path);
        let children = session.list_child_folders(&root.id).await?;
        let mut stack = vec![Frame {
            path: root.path.clone(),
            is_public: root.is_public,
            depth: 1,
            children: children.into_iter(),
        }];
        let mut added = 0;

        while let Some(frame) = stack.last_mut() {
            let Some(child) = frame.children.next() else {
                stack.pop();
                continue;
            };
            let is_public = frame.is_public;
            let depth = frame.depth;
            let path = child_path(&frame.path, is_public, &child.display_name);

            if self.skip_empty && child.total_count == 0 && child.child_folder_count == 0 {
                debug!("Skipping folder {}, no messages, no subfolders", path);
                continue;
            }

            debug!(
                "Found folder {}, {} messages in total",
                path, child.total_count
            );
            if is_public && child.display_name == PUBLIC_ROOT_DISPLAY_NAME {
                debug!("Not recording the public folder root itself");
            } else {
                inventory.push(RemoteFolder::new(
                    child.id.clone(),
                    path.clone(),
                    child.total_count,
                    is_public,
                ));
                added += 1;
            }

            if child.child_folder_count > 0 {
                if depth >= self.max_depth {
                    return Err(Error::TreeTooDeep {
                        path,
                        limit: self.max_depth,
                    });
                }
                debug!("Looking for sub folders of '{}'", path);
                let grandchildren = session.list_child_folders(&child.id).await?;
                stack.push(Frame {
                    path,
                    is_public,
                    depth: depth + 1,
                    children: grandchildren.into_iter(),
                });
            }
        }

        info!("Discovered {} folders below '{}'", added, root.path);
        Ok(added)
    }

    /// Bind the mailbox root and walk it.
    ///
    /// # Errors
    ///
    /// See [`FolderWalker::walk`].
    pub async fn discover_mailbox<S: MailService>(
        &self,
        session: &Session<S>,
        inventory: &mut Vec<RemoteFolder>,
    ) -> Result<usize> {
        let root = session.bind(WellKnownFolder::MsgFolderRoot).await?;
        self.walk(session, &DiscoveryRoot::mailbox(&root), inventory)
            .await
    }

    /// Bind the public folder root and walk it as a public tree.
    ///
    /// # Errors
    ///
    /// See [`FolderWalker::walk`].
    pub async fn discover_public<S: MailService>(
        &self,
        session: &Session<S>,
        inventory: &mut Vec<RemoteFolder>,
    ) -> Result<usize> {
        let root = session.bind(WellKnownFolder::PublicFoldersRoot).await?;
        self.walk(session, &DiscoveryRoot::public(&root), inventory)
            .await
    }
}

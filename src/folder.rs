//! Remote folder inventory records

use crate::service::FolderId;
use serde::Serialize;

/// Separator between the segments of a folder path.
pub const PATH_SEPARATOR: char = '\\';

/// Display name of the public folder tree's root.
///
/// Compared by exact string equality, which only holds for English
/// server installs.
pub const PUBLIC_ROOT_DISPLAY_NAME: &str = "Global Public Folder Root";

/// One discovered folder of the source mailbox.
///
/// Created by discovery, then completed once by the summary pass with
/// its destination and its message count inside the date window.
///
/// # Examples
///
/// ```
/// use ews_discovery::{FolderId, RemoteFolder};
///
/// let folder = RemoteFolder::new(FolderId::new("AAMk"), "Inbox\\Projects", 12, false);
/// assert_eq!(folder.name(), "Projects");
/// assert!(folder.mapped_destination().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteFolder {
    id: FolderId,
    path: String,
    total_count: u64,
    is_public: bool,
    mapped_destination: Option<String>,
    windowed_count: Option<u64>,
}

impl RemoteFolder {
    #[must_use]
    pub fn new(id: FolderId, path: impl Into<String>, total_count: u64, is_public: bool) -> Self {
        Self {
            id,
            path: path.into(),
            total_count,
            is_public,
            mapped_destination: None,
            windowed_count: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> &FolderId {
        &self.id
    }

    /// Full path, ancestors joined by [`PATH_SEPARATOR`].
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path
            .rsplit(PATH_SEPARATOR)
            .next()
            .unwrap_or(&self.path)
    }

    /// Message count reported at discovery time.
    #[must_use]
    pub const fn total_count(&self) -> u64 {
        self.total_count
    }

    #[must_use]
    pub const fn is_public(&self) -> bool {
        self.is_public
    }

    #[must_use]
    pub fn mapped_destination(&self) -> Option<&str> {
        self.mapped_destination.as_deref()
    }

    /// Message count inside the summary date window.
    #[must_use]
    pub const fn windowed_count(&self) -> Option<u64> {
        self.windowed_count
    }

    /// Record the destination path. Returns `false` when one was
    /// already set; the first mapping wins.
    pub(crate) fn map_to(&mut self, destination: String) -> bool {
        if self.mapped_destination.is_some() {
            return false;
        }
        self.mapped_destination = Some(destination);
        true
    }

    pub(crate) const fn set_windowed_count(&mut self, count: u64) {
        self.windowed_count = Some(count);
    }
}

/// Join a child name onto its parent's path.
///
/// Below a public folder the leading public-root segment is dropped so
/// its descendants read as top-level paths.
#[must_use]
pub fn child_path(parent: &str, parent_is_public: bool, name: &str) -> String {
    let path = if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}{PATH_SEPARATOR}{name}")
    };
    if parent_is_public {
        let prefix = format!("{PUBLIC_ROOT_DISPLAY_NAME}{PATH_SEPARATOR}");
        if let Some(stripped) = path.strip_prefix(&prefix) {
            return stripped.to_string();
        }
    }
    path
}

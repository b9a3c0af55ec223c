//! The remote mail service seam
//!
//! The EWS wire protocol lives behind [`MailService`]; this crate only
//! needs three calls from it. A [`crate::Transport`] builds one service
//! per negotiation attempt.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Opaque folder identifier assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FolderId(String);

impl FolderId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Folders the server can bind by name rather than by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownFolder {
    /// Root of the user's own mailbox ("Top of Information Store").
    MsgFolderRoot,
    /// Root of the shared public folder tree.
    PublicFoldersRoot,
}

impl WellKnownFolder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MsgFolderRoot => "msgfolderroot",
            Self::PublicFoldersRoot => "publicfoldersroot",
        }
    }
}

impl fmt::Display for WellKnownFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One folder as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderHandle {
    pub id: FolderId,
    pub display_name: String,
    pub total_count: u64,
    pub child_folder_count: u64,
}

/// Failures a [`MailService`] reports back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The server does not speak the requested schema version.
    #[error("version rejected: {0}")]
    VersionRejected(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Failed(String),
}

impl RemoteError {
    /// Whether this failure means the credentials were refused.
    ///
    /// Some transports only surface the HTTP 401 as message text.
    #[must_use]
    pub fn is_auth_rejection(&self) -> bool {
        match self {
            Self::Unauthorized(_) => true,
            Self::Failed(msg) => msg.contains("Unauthorized"),
            Self::VersionRejected(_) => false,
        }
    }
}

/// Remote mail API used by negotiation, discovery and summary.
#[async_trait]
pub trait MailService: Send + Sync {
    /// Bind a well-known folder. Also serves as the version probe.
    async fn bind(&self, folder: WellKnownFolder) -> Result<FolderHandle, RemoteError>;

    /// List the immediate children of a folder.
    async fn list_child_folders(&self, parent: &FolderId)
    -> Result<Vec<FolderHandle>, RemoteError>;

    /// Count items whose received time lies in `[start, end]`.
    ///
    /// `page_size` is the listing page the service may use to obtain
    /// the total.
    async fn count_items_in_range(
        &self,
        folder: &FolderId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page_size: u32,
    ) -> Result<u64, RemoteError>;
}

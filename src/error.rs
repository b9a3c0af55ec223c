//! Error types for ews-discovery

use crate::service::RemoteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Credentials were rejected by the server. Never retried.
    #[error("Authentication failed: {0}")]
    AuthFailure(String),

    #[error("Connection error: {message}")]
    Connection {
        message: String,
        source: Option<RemoteError>,
    },

    #[error("Remote call failed: {0}")]
    Remote(#[from] RemoteError),

    #[error("Folder tree below '{path}' is deeper than {limit} levels")]
    TreeTooDeep { path: String, limit: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    pub(crate) fn connection(message: impl Into<String>, source: Option<RemoteError>) -> Self {
        Self::Connection {
            message: message.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

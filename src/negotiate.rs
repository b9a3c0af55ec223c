//! Session negotiation against an Exchange server
//!
//! The server's schema version is unknown up front, so each candidate
//! from [`CANDIDATE_VERSIONS`] is tried newest first until a bind of the
//! mailbox root succeeds.

use crate::config::ExchangeConfig;
use crate::error::{Error, Result};
use crate::service::{FolderHandle, FolderId, MailService, RemoteError, WellKnownFolder};
use crate::trust;
use chrono::{DateTime, Utc};
use rustls::ClientConfig;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Path of the EWS endpoint below the server root.
pub const SERVICE_PATH: &str = "EWS/Exchange.asmx";

/// Per-request timeout. Enumerating large mailboxes is slow.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// An EWS schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeVersion {
    Exchange2007Sp1,
    Exchange2010,
    Exchange2010Sp1,
    Exchange2010Sp2,
    Exchange2013,
}

impl ExchangeVersion {
    /// The schema name sent in the `RequestServerVersion` header.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exchange2007Sp1 => "Exchange2007_SP1",
            Self::Exchange2010 => "Exchange2010",
            Self::Exchange2010Sp1 => "Exchange2010_SP1",
            Self::Exchange2010Sp2 => "Exchange2010_SP2",
            Self::Exchange2013 => "Exchange2013",
        }
    }
}

impl fmt::Display for ExchangeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Versions tried during negotiation, most capable first.
pub const CANDIDATE_VERSIONS: [ExchangeVersion; 5] = [
    ExchangeVersion::Exchange2013,
    ExchangeVersion::Exchange2010Sp2,
    ExchangeVersion::Exchange2010Sp1,
    ExchangeVersion::Exchange2010,
    ExchangeVersion::Exchange2007Sp1,
];

/// Username and password, passed through to the transport untouched.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything a transport needs to build one client.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: String,
    pub version: ExchangeVersion,
    pub credentials: Credentials,
    pub timeout: Duration,
    /// TLS configuration carrying the certificate trust policy.
    pub tls: Arc<ClientConfig>,
}

/// Builds a [`MailService`] for one endpoint.
pub trait Transport: Send + Sync {
    type Service: MailService;

    fn open(&self, endpoint: &Endpoint) -> Self::Service;
}

/// An authenticated service bound to one negotiated version.
pub struct Session<S> {
    endpoint: Endpoint,
    service: S,
}

impl<S: MailService> Session<S> {
    #[must_use]
    pub const fn version(&self) -> ExchangeVersion {
        self.endpoint.version
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.endpoint.url
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    #[must_use]
    pub const fn service(&self) -> &S {
        &self.service
    }

    /// Bind a well-known folder.
    ///
    /// # Errors
    ///
    /// Remote failures come back as [`Error::Remote`]; a request that
    /// outlives the session timeout as [`Error::Connection`].
    pub async fn bind(&self, folder: WellKnownFolder) -> Result<FolderHandle> {
        self.guarded(self.service.bind(folder)).await
    }

    /// List the immediate children of a folder.
    ///
    /// # Errors
    ///
    /// See [`Session::bind`].
    pub async fn list_child_folders(&self, parent: &FolderId) -> Result<Vec<FolderHandle>> {
        self.guarded(self.service.list_child_folders(parent)).await
    }

    /// Count items received in `[start, end]`.
    ///
    /// # Errors
    ///
    /// See [`Session::bind`].
    pub async fn count_items_in_range(
        &self,
        folder: &FolderId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page_size: u32,
    ) -> Result<u64> {
        self.guarded(
            self.service
                .count_items_in_range(folder, start, end, page_size),
        )
        .await
    }

    async fn guarded<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, RemoteError>> + Send,
    ) -> Result<T> {
        match timeout(self.endpoint.timeout, call).await {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::connection(
                format!(
                    "Request to {} timed out after {:?}",
                    self.endpoint.url, self.endpoint.timeout
                ),
                None,
            )),
        }
    }
}

impl<S> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("url", &self.endpoint.url)
            .field("version", &self.endpoint.version)
            .field("username", &self.endpoint.credentials.username)
            .finish_non_exhaustive()
    }
}

enum Negotiation<S> {
    Trying(usize),
    Connected(Session<S>),
    Failed(Error),
}

/// Establishes sessions by trying candidate versions in order.
pub struct Negotiator<T> {
    transport: T,
    versions: Vec<ExchangeVersion>,
    timeout: Duration,
}

impl<T: Transport> Negotiator<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            versions: CANDIDATE_VERSIONS.to_vec(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Replace the candidate list, keeping its order.
    #[must_use]
    pub fn with_versions(mut self, versions: impl Into<Vec<ExchangeVersion>>) -> Self {
        self.versions = versions.into();
        self
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Connect using an [`ExchangeConfig`].
    ///
    /// # Errors
    ///
    /// See [`Negotiator::connect`].
    pub async fn connect_with(&self, config: &ExchangeConfig) -> Result<Session<T::Service>> {
        self.connect(&config.host, &config.username, &config.password)
            .await
    }

    /// Open an authenticated session on `hostname`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthFailure`] as soon as the server refuses the
    /// credentials, and [`Error::Connection`] on any other failure or
    /// once every candidate version was rejected.
    pub async fn connect(
        &self,
        hostname: &str,
        username: &str,
        password: &str,
    ) -> Result<Session<T::Service>> {
        let tls = trust::client_config()?;
        let url = format!("https://{hostname}/{SERVICE_PATH}");
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let mut last_rejection = None;
        let mut state = Negotiation::Trying(0);

        loop {
            state = match state {
                Negotiation::Trying(attempt) => match self.versions.get(attempt) {
                    None => Negotiation::Failed(Error::connection(
                        format!("Failed to connect to {hostname} with username {username}"),
                        last_rejection.take(),
                    )),
                    Some(&version) => {
                        let endpoint = Endpoint {
                            url: url.clone(),
                            version,
                            credentials: credentials.clone(),
                            timeout: self.timeout,
                            tls: tls.clone(),
                        };
                        debug!(
                            "Binding to exchange server {} as {}, version {}",
                            url, username, version
                        );
                        let session = Session {
                            service: self.transport.open(&endpoint),
                            endpoint,
                        };
                        match session.bind(WellKnownFolder::MsgFolderRoot).await {
                            Ok(_) => Negotiation::Connected(session),
                            Err(Error::Remote(RemoteError::VersionRejected(reason))) => {
                                warn!("Failed to bind as version {}: {}", version, reason);
                                last_rejection = Some(RemoteError::VersionRejected(reason));
                                Negotiation::Trying(attempt + 1)
                            }
                            Err(err) => Negotiation::Failed(bind_failure(err)),
                        }
                    }
                },
                Negotiation::Connected(session) => {
                    info!(
                        "Connected to {} as {}, version {}",
                        session.url(),
                        username,
                        session.version()
                    );
                    return Ok(session);
                }
                Negotiation::Failed(err) => {
                    error!("Failed to bind to exchange server: {}", err);
                    return Err(err);
                }
            };
        }
    }
}

/// Map a non-version bind failure onto the negotiation error kinds.
fn bind_failure(err: Error) -> Error {
    match err {
        Error::Remote(remote) if remote.is_auth_rejection() => {
            Error::AuthFailure(remote.to_string())
        }
        Error::Remote(remote) => Error::connection(remote.to_string(), Some(remote)),
        other => other,
    }
}

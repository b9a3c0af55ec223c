//! `Transport` and `MailService` backed by a [`Tree`]
//!
//! `FakeExchange` is the transport handed to the `Negotiator`. Every
//! `open()` produces a `FakeService` bound to the endpoint's version;
//! the shared state records which versions were tried and which
//! counting queries were issued.

use super::tree::Tree;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ews_discovery::{
    Endpoint, ExchangeVersion, FolderHandle, FolderId, MailService, RemoteError, Transport,
    WellKnownFolder,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One `count_items_in_range` call as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountQuery {
    pub folder: FolderId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub page_size: u32,
}

#[derive(Debug, Default)]
struct State {
    tree: Tree,
    rejected_versions: HashSet<ExchangeVersion>,
    bind_error: Option<RemoteError>,
    bind_delay: Option<Duration>,
    failing_folders: HashSet<FolderId>,
    opened: Mutex<Vec<Endpoint>>,
    count_queries: Mutex<Vec<CountQuery>>,
}

/// Fake Exchange server acting as the negotiation transport.
#[derive(Debug, Clone)]
pub struct FakeExchange {
    state: Arc<State>,
}

impl FakeExchange {
    pub fn new(tree: Tree) -> Self {
        Self {
            state: Arc::new(State {
                tree,
                ..State::default()
            }),
        }
    }

    fn state_mut(&mut self) -> &mut State {
        Arc::get_mut(&mut self.state).expect("configure the fake before sharing it")
    }

    /// Answer binds made with these versions with a version rejection.
    pub fn reject_versions(mut self, versions: &[ExchangeVersion]) -> Self {
        self.state_mut().rejected_versions.extend(versions.iter().copied());
        self
    }

    /// Fail every accepted bind with `error`.
    pub fn fail_binds_with(mut self, error: RemoteError) -> Self {
        self.state_mut().bind_error = Some(error);
        self
    }

    /// Delay every bind, to trip request timeouts.
    pub fn delay_binds(mut self, delay: Duration) -> Self {
        self.state_mut().bind_delay = Some(delay);
        self
    }

    /// Fail listing and counting on one folder.
    pub fn fail_folder(mut self, id: &str) -> Self {
        self.state_mut().failing_folders.insert(FolderId::new(id));
        self
    }

    /// Versions the negotiator opened a service for, in order.
    pub fn attempted_versions(&self) -> Vec<ExchangeVersion> {
        self.opened().iter().map(|e| e.version).collect()
    }

    /// Endpoints the negotiator opened, in order.
    pub fn opened(&self) -> Vec<Endpoint> {
        self.state.opened.lock().unwrap().clone()
    }

    pub fn count_queries(&self) -> Vec<CountQuery> {
        self.state.count_queries.lock().unwrap().clone()
    }
}

impl Transport for FakeExchange {
    type Service = FakeService;

    fn open(&self, endpoint: &Endpoint) -> FakeService {
        self.state.opened.lock().unwrap().push(endpoint.clone());
        FakeService {
            version: endpoint.version,
            state: self.state.clone(),
        }
    }
}

/// One client bound to a single schema version.
#[derive(Debug)]
pub struct FakeService {
    version: ExchangeVersion,
    state: Arc<State>,
}

#[async_trait]
impl MailService for FakeService {
    async fn bind(&self, folder: WellKnownFolder) -> Result<FolderHandle, RemoteError> {
        if let Some(delay) = self.state.bind_delay {
            tokio::time::sleep(delay).await;
        }
        if self.state.rejected_versions.contains(&self.version) {
            return Err(RemoteError::VersionRejected(format!(
                "{} is not supported by this server",
                self.version
            )));
        }
        if let Some(error) = &self.state.bind_error {
            return Err(error.clone());
        }
        self.state
            .tree
            .root(folder)
            .cloned()
            .ok_or_else(|| RemoteError::Failed(format!("no such folder: {folder}")))
    }

    async fn list_child_folders(
        &self,
        parent: &FolderId,
    ) -> Result<Vec<FolderHandle>, RemoteError> {
        if self.state.failing_folders.contains(parent) {
            return Err(RemoteError::Failed(format!("FindFolder failed for {parent}")));
        }
        if !self.state.tree.contains(parent) {
            return Err(RemoteError::Failed(format!("no such folder: {parent}")));
        }
        Ok(self.state.tree.children(parent))
    }

    async fn count_items_in_range(
        &self,
        folder: &FolderId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page_size: u32,
    ) -> Result<u64, RemoteError> {
        self.state.count_queries.lock().unwrap().push(CountQuery {
            folder: folder.clone(),
            start,
            end,
            page_size,
        });
        if self.state.failing_folders.contains(folder) {
            return Err(RemoteError::Failed(format!("FindItem failed for {folder}")));
        }
        let count = self
            .state
            .tree
            .received(folder)
            .iter()
            .filter(|at| start <= **at && **at <= end)
            .count();
        Ok(count as u64)
    }
}

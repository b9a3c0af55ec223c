//! Exchange Web Services discovery core
//!
//! Opens an authenticated session against an on-premises Exchange
//! server by negotiating its schema version, walks the remote folder
//! tree into a flat inventory, and summarises that inventory against a
//! folder mapping and a date window before messages are migrated.
//!
//! The EWS wire protocol itself is supplied by the caller through the
//! [`Transport`] and [`MailService`] traits.

mod config;
mod discover;
mod error;
mod flag;
mod folder;
mod negotiate;
mod probe;
mod service;
mod summary;
pub mod trust;

pub use config::ExchangeConfig;
pub use discover::{DEFAULT_MAX_DEPTH, DiscoveryRoot, FolderWalker};
pub use error::{Error, Result};
pub use flag::{
    FlagIcon, FollowUpStatus, ItemFlagStatus, PID_TAG_FLAG_STATUS, PID_TAG_FOLLOWUP_ICON,
};
pub use folder::{PATH_SEPARATOR, PUBLIC_ROOT_DISPLAY_NAME, RemoteFolder, child_path};
pub use negotiate::{
    CANDIDATE_VERSIONS, Credentials, Endpoint, ExchangeVersion, Negotiator, REQUEST_TIMEOUT,
    SERVICE_PATH, Session, Transport,
};
pub use probe::{ProbeReport, probe_tls};
pub use service::{FolderHandle, FolderId, MailService, RemoteError, WellKnownFolder};
pub use summary::{
    DateWindow, FolderMapper, SUMMARY_PAGE_SIZE, SourceSystem, SummaryReport, summarize,
};

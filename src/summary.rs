//! Folder summary: destination mapping and windowed message counts

use crate::error::{Error, Result};
use crate::folder::RemoteFolder;
use crate::negotiate::Session;
use crate::service::MailService;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info};

/// Page size used when the service lists items to obtain a count.
pub const SUMMARY_PAGE_SIZE: u32 = 20;

/// Mail system a folder path comes from, as known to the mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceSystem {
    Exchange,
}

impl fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exchange => "exchange",
        })
    }
}

/// Resolves a source folder path to a destination path.
///
/// `None` or a blank string means the folder is not migrated.
pub trait FolderMapper {
    fn resolve(&self, path: &str, source: SourceSystem) -> Option<String>;
}

impl<F> FolderMapper for F
where
    F: Fn(&str, SourceSystem) -> Option<String>,
{
    fn resolve(&self, path: &str, source: SourceSystem) -> Option<String> {
        self(path, source)
    }
}

/// Receive-time window, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateWindow {
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::Config(format!(
                "Date window starts after it ends: {start} > {end}"
            )));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Totals of one summary pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryReport {
    pub mapped: usize,
    pub ignored: usize,
    pub purged: usize,
    pub windowed_total: u64,
}

/// Map every folder and count its messages inside `window`.
///
/// Folders without a destination are collected first and, when
/// `purge_ignored` is set, removed from the inventory afterwards. Removal
/// is by position, so a folder listed twice only loses the unmapped copy.
///
/// # Errors
///
/// Remote failures propagate unchanged; the inventory is then left
/// partially summarised and unpurged.
pub async fn summarize<S, M>(
    session: &Session<S>,
    mapper: &M,
    inventory: &mut Vec<RemoteFolder>,
    window: &DateWindow,
    purge_ignored: bool,
) -> Result<SummaryReport>
where
    S: MailService,
    M: FolderMapper + Sync + ?Sized,
{
    debug!("Getting mails from {} to {}", window.start, window.end);
    let mut report = SummaryReport::default();
    let mut ignored: HashSet<usize> = HashSet::new();

    for (index, folder) in inventory.iter_mut().enumerate() {
        let destination = folder.mapped_destination().map(str::to_string).or_else(|| {
            mapper
                .resolve(folder.path(), SourceSystem::Exchange)
                .filter(|d| !d.trim().is_empty())
        });
        let Some(destination) = destination else {
            debug!("No mapping for {}, ignoring", folder.path());
            ignored.insert(index);
            continue;
        };

        folder.map_to(destination);
        let count = session
            .count_items_in_range(folder.id(), window.start, window.end, SUMMARY_PAGE_SIZE)
            .await?;
        folder.set_windowed_count(count);
        debug!(
            "{} => {}, {} messages",
            folder.path(),
            folder.mapped_destination().unwrap_or_default(),
            count
        );
        report.mapped += 1;
        report.windowed_total += count;
    }

    report.ignored = ignored.len();
    if purge_ignored && !ignored.is_empty() {
        let before = inventory.len();
        let mut index = 0;
        inventory.retain(|_| {
            let keep = !ignored.contains(&index);
            index += 1;
            keep
        });
        report.purged = before - inventory.len();
    }

    info!(
        "Summary: {} mapped, {} ignored, {} purged, {} messages in window",
        report.mapped, report.ignored, report.purged, report.windowed_total
    );
    Ok(report)
}

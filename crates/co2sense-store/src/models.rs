//! Outcome types for registry operations.

use std::path::PathBuf;

use co2sense_types::DeviceId;

use crate::error::Error;

/// What [`Registry::open_all`](crate::Registry::open_all) did with the data directory.
#[derive(Debug, Default)]
pub struct OpenReport {
    /// Devices whose stores were opened and registered, sorted.
    pub opened: Vec<DeviceId>,
    /// Entries that were left alone, with the reason.
    pub skipped: Vec<SkippedEntry>,
}

impl OpenReport {
    /// Whether any entry was skipped.
    pub fn has_warnings(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// A data directory entry that was not opened as a device store.
#[derive(Debug)]
pub struct SkippedEntry {
    /// Full path of the entry.
    pub path: PathBuf,
    /// Why it was skipped. [`Error::InvalidDeviceName`] for entries not named
    /// after a device, a storage error for stores that failed to open.
    pub error: Error,
}

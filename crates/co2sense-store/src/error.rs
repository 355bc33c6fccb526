//! Error types for co2sense-store.

use std::path::PathBuf;

use co2sense_types::DeviceId;

/// Result type for co2sense-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in co2sense-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No store is registered for the device.
    #[error("No store registered for device {0}")]
    NotFound(DeviceId),

    /// The store exists but holds no readings.
    #[error("No readings stored for device {0}")]
    NoData(DeviceId),

    /// An entry in the data directory is not named after a device.
    #[error("Entry '{0}' in data directory is not a device identifier")]
    InvalidDeviceName(String),

    /// A reading was handed to the store of a different device.
    #[error("Reading from device {found} cannot be written to store of device {expected}")]
    DeviceMismatch { expected: DeviceId, found: DeviceId },

    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create a store directory.
    #[error("Failed to create store directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The store was written by a newer schema than this build understands.
    #[error("Store schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: i32, supported: i32 },

    /// IO error while reading or deleting persisted data.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// Whether the underlying storage failed (disk, corruption, permissions).
    pub fn is_storage_io(&self) -> bool {
        matches!(
            self,
            Error::Database(_)
                | Error::CreateDirectory { .. }
                | Error::Io { .. }
                | Error::UnsupportedSchema { .. }
        )
    }

    /// Whether a query layer should show "no data yet" instead of an error.
    pub fn is_no_data_yet(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::NoData(_))
    }
}

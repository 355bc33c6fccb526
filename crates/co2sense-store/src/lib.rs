//! Per-device time-series storage for CO2sense sensor readings.
//!
//! Every device gets its own SQLite table in its own directory under a
//! shared data directory, keyed by the reading's millisecond timestamp.
//! On top of that the crate serves two query shapes:
//!
//! - the most recent reading of a device ([`Registry::latest`])
//! - the readings of the last N minutes, downsampled to a bounded number of
//!   evenly spaced points ([`Registry::range`], see [`Downsample`])
//!
//! # Features
//!
//! - Independent store per device, no cross-device locking
//! - Store lifecycle (open all at startup, create, remove, shutdown)
//! - Reverse-index lookup of the latest reading
//! - Single-pass streaming decimation of ranged scans
//!
//! # Example
//!
//! ```no_run
//! use co2sense_store::{Error, Registry};
//! use co2sense_types::DeviceId;
//!
//! let registry = Registry::new(co2sense_store::default_data_dir());
//! registry.open_all()?;
//!
//! let device: DeviceId = "0f8fad5b-d9cb-469f-a165-70867728950e".parse().unwrap();
//! match registry.latest(&device) {
//!     Ok(reading) => println!("CO2: {} ppm", reading.co2),
//!     Err(e) if e.is_no_data_yet() => println!("Still waiting for sensor data..."),
//!     Err(e) => return Err(e),
//! }
//! # Ok::<(), Error>(())
//! ```

mod error;
mod models;
mod registry;
mod sampling;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::{OpenReport, SkippedEntry};
pub use registry::Registry;
pub use sampling::{
    DEFAULT_MAX_OUTPUT, DEFAULT_SAMPLES_PER_MINUTE, Downsample, MILLIS_PER_MINUTE, Sampler,
    window_start,
};
pub use store::{DeviceStore, STORE_FILE_NAME};

/// Default data directory following platform conventions.
///
/// - Linux: `~/.local/share/co2sense/db`
/// - macOS: `~/Library/Application Support/co2sense/db`
/// - Windows: `C:\Users\<user>\AppData\Local\co2sense\db`
pub fn default_data_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("co2sense")
        .join("db")
}

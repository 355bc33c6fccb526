//! Shared value types for CO2sense environmental sensor readings.
//!
//! This crate provides the types exchanged between the storage engine
//! (co2sense-store) and its collaborators (co2sense-service).
//!
//! # Features
//!
//! - [`Reading`], one timestamped CO2/temperature/humidity sample
//! - [`DeviceId`] and the shared [`is_valid_device_id`] predicate
//! - Error types for value parsing
//!
//! # Example
//!
//! ```
//! use co2sense_types::{DeviceId, Reading};
//!
//! let reading = Reading::builder(DeviceId::new_v4(), "alice")
//!     .co2(612.0)
//!     .temperature(21.4)
//!     .humidity(38.0)
//!     .build();
//! assert!(!reading.is_boot_artifact());
//! ```

pub mod device;
pub mod error;
pub mod types;

pub use device::{DEVICE_ID_LEN, DeviceId, is_valid_device_id};
pub use error::{ParseError, ParseResult};
pub use types::{Reading, ReadingBuilder, now_millis};

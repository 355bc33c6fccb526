//! Ingest and query HTTP service for CO2sense sensors.
//!
//! This crate provides a service that:
//! - Opens every device store in the data directory at startup
//! - Provisions and deprovisions devices
//! - Accepts readings from sensors and stores them per device
//! - Serves the latest reading and downsampled ranges for charting
//! - Optionally republishes stored readings over MQTT (feature `mqtt`)
//!
//! # REST API Endpoints
//!
//! - `GET /api/health` - Service health check
//! - `GET /api/devices` - List provisioned devices
//! - `POST /api/devices` - Provision a device under a fresh identifier
//! - `GET /api/devices/{id}` - Device info
//! - `DELETE /api/devices/{id}` - Deprovision a device and delete its history
//! - `POST /api/devices/{id}/readings` - Submit a reading
//! - `GET /api/devices/{id}/current` - Latest reading for device
//! - `GET /api/devices/{id}/readings?minutes=N` - Downsampled readings of the last N minutes
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/co2sense/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:3000"
//!
//! [storage]
//! path = "/var/lib/co2sense/db"
//!
//! [sampling]
//! max_output = 60
//! samples_per_minute = 6
//! default_window_minutes = 10
//! max_window_minutes = 10080
//! ```

pub mod api;
pub mod config;
pub mod ingest;
pub mod state;

pub use config::{
    Config, ConfigError, MqttConfig, SamplingConfig, ServerConfig, StorageConfig,
    ValidationError,
};
pub use ingest::{IngestError, IngestOutcome, IngestRequest, Ingestor};
pub use state::{AppState, ReadingEvent};

#[cfg(feature = "mqtt")]
pub mod mqtt;

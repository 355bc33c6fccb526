//! Application state shared across handlers.
//!
//! # Broadcast Channel Behavior
//!
//! Every stored reading is published on `readings_tx` for live consumers
//! such as the MQTT publisher.
//!
//! - **Buffer size**: Configurable via `server.broadcast_buffer` (default: 100)
//! - **Message loss**: If a subscriber falls behind and the buffer fills, old messages are dropped
//! - **No blocking**: Ingest never waits on subscribers
//!
//! ## Example Configuration
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:3000"
//! broadcast_buffer = 200  # Larger buffer for slow subscribers
//! ```

use std::sync::Arc;

use co2sense_store::Registry;
use co2sense_types::{DeviceId, Reading};
use tokio::sync::{broadcast, watch};

use crate::config::Config;
use crate::ingest::Ingestor;

/// Shared application state.
pub struct AppState {
    /// Open device stores.
    pub registry: Arc<Registry>,
    /// Configuration, fixed for the lifetime of the process.
    pub config: Config,
    /// Broadcast channel for stored readings.
    pub readings_tx: broadcast::Sender<ReadingEvent>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl AppState {
    /// Create new application state around an already opened registry.
    ///
    /// The broadcast channel buffer size is determined by `config.server.broadcast_buffer`.
    pub fn new(registry: Arc<Registry>, config: Config) -> Arc<Self> {
        let (readings_tx, _) = broadcast::channel(config.server.broadcast_buffer.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Arc::new(Self {
            registry,
            config,
            readings_tx,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// An ingestor writing to this state's registry and broadcast channel.
    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(Arc::clone(&self.registry), self.readings_tx.clone())
    }

    /// Get a receiver for the shutdown signal.
    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Signal background tasks to stop.
    pub fn signal_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Whether shutdown has been signalled.
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_rx.borrow()
    }
}

/// A stored reading, as broadcast to live consumers.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReadingEvent {
    /// Device the reading was stored for.
    pub device_id: DeviceId,
    /// The reading data.
    pub reading: Reading,
}

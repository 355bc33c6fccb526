//! Reading ingestion.
//!
//! The [`Ingestor`] is the write path between a submitting client and the
//! device stores. It stamps each reading with the time of arrival, drops
//! the zero CO2 values sensors emit while warming up, writes through the
//! [`Registry`] and announces stored readings on the broadcast channel.
//!
//! Checking that the device belongs to the submitting account is the
//! caller's job; the ingestor only refuses devices without a store.

use std::sync::Arc;

use co2sense_store::Registry;
use co2sense_types::{DeviceId, ParseError, Reading, now_millis};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::state::ReadingEvent;

/// A reading as submitted by a sensor, before it is stamped.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    /// Username of the account that owns the device.
    pub owner: String,
    /// CO2 concentration in ppm.
    pub co2: f64,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
}

/// What happened to an ingested reading.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// The reading was written and broadcast.
    Stored(Reading),
    /// The reading was a boot artifact and was discarded.
    Dropped,
}

/// Errors from [`Ingestor::ingest`].
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The submitted values cannot come from a sensor.
    #[error("Invalid reading: {0}")]
    Invalid(#[from] ParseError),
    /// The registry refused or failed the write.
    #[error(transparent)]
    Store(#[from] co2sense_store::Error),
}

/// Writes submitted readings to the registry.
#[derive(Debug, Clone)]
pub struct Ingestor {
    registry: Arc<Registry>,
    readings_tx: broadcast::Sender<ReadingEvent>,
}

impl Ingestor {
    /// Create an ingestor over `registry`, announcing stored readings on `readings_tx`.
    pub fn new(registry: Arc<Registry>, readings_tx: broadcast::Sender<ReadingEvent>) -> Self {
        Self {
            registry,
            readings_tx,
        }
    }

    /// Stamp `request` with the current time and store it for `device_id`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Invalid`] for impossible values and
    /// [`IngestError::Store`] when the device has no store or the write fails.
    /// Failed writes are not retried.
    pub fn ingest(
        &self,
        device_id: &DeviceId,
        request: IngestRequest,
    ) -> Result<IngestOutcome, IngestError> {
        self.ingest_at(device_id, request, now_millis())
    }

    /// [`ingest`](Self::ingest) with an explicit timestamp.
    pub fn ingest_at(
        &self,
        device_id: &DeviceId,
        request: IngestRequest,
        timestamp: i64,
    ) -> Result<IngestOutcome, IngestError> {
        let reading = Reading::builder(device_id.clone(), request.owner)
            .timestamp(timestamp)
            .co2(request.co2)
            .temperature(request.temperature)
            .humidity(request.humidity)
            .try_build()?;

        if reading.is_boot_artifact() {
            debug!("Dropping boot reading from {}", device_id);
            return Ok(IngestOutcome::Dropped);
        }

        if let Err(e) = self.registry.append(device_id, &reading) {
            warn!("Failed to store reading for {}: {}", device_id, e);
            return Err(e.into());
        }

        // No subscribers is not an error.
        let _ = self.readings_tx.send(ReadingEvent {
            device_id: device_id.clone(),
            reading: reading.clone(),
        });

        debug!("Stored reading for {} (CO2={})", device_id, reading.co2);
        Ok(IngestOutcome::Stored(reading))
    }
}

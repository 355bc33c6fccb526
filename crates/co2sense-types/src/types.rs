//! Core types for CO2sense sensor data.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::device::DeviceId;
use crate::error::ParseError;

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// One timestamped sample from an environmental sensor.
///
/// Readings are immutable once written. The `timestamp` doubles as the sort
/// key inside a device store, so two readings for the same device in the
/// same millisecond collapse into one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Device that produced the reading.
    pub device_id: DeviceId,
    /// Username of the account that owns the device (informational).
    pub owner: String,
    /// CO2 concentration in ppm.
    pub co2: f64,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
}

impl Reading {
    /// Create a builder for a reading from `device_id`, stamped with the
    /// current time unless [`ReadingBuilder::timestamp`] is called.
    pub fn builder(device_id: DeviceId, owner: impl Into<String>) -> ReadingBuilder {
        ReadingBuilder {
            reading: Reading {
                timestamp: now_millis(),
                device_id,
                owner: owner.into(),
                co2: 0.0,
                temperature: 0.0,
                humidity: 0.0,
            },
        }
    }

    /// The capture time as an [`OffsetDateTime`], or `None` if the
    /// timestamp is outside the representable range.
    #[must_use]
    pub fn captured_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.timestamp) * 1_000_000).ok()
    }

    /// Sensors report a CO2 value of exactly zero while warming up.
    #[must_use]
    pub fn is_boot_artifact(&self) -> bool {
        self.co2 == 0.0
    }
}

/// Builder for [`Reading`].
#[derive(Debug)]
#[must_use]
pub struct ReadingBuilder {
    reading: Reading,
}

impl ReadingBuilder {
    /// Set the timestamp (milliseconds since the Unix epoch).
    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.reading.timestamp = timestamp;
        self
    }

    /// Set CO2 concentration.
    pub fn co2(mut self, co2: f64) -> Self {
        self.reading.co2 = co2;
        self
    }

    /// Set temperature.
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.reading.temperature = temperature;
        self
    }

    /// Set humidity.
    pub fn humidity(mut self, humidity: f64) -> Self {
        self.reading.humidity = humidity;
        self
    }

    /// Build the `Reading` without validation.
    #[must_use]
    pub fn build(self) -> Reading {
        self.reading
    }

    /// Build the `Reading`, rejecting values no sensor can produce.
    ///
    /// Validates:
    /// - all measurements are finite
    /// - `co2` is not negative
    /// - `humidity` is within 0-100
    /// - `timestamp` is not negative
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidValue`] naming the first offending field.
    pub fn try_build(self) -> Result<Reading, ParseError> {
        let r = &self.reading;

        for (name, value) in [
            ("co2", r.co2),
            ("temperature", r.temperature),
            ("humidity", r.humidity),
        ] {
            if !value.is_finite() {
                return Err(ParseError::InvalidValue(format!("{name} must be finite")));
            }
        }

        if r.co2 < 0.0 {
            return Err(ParseError::InvalidValue(format!(
                "co2 {} cannot be negative",
                r.co2
            )));
        }

        if !(0.0..=100.0).contains(&r.humidity) {
            return Err(ParseError::InvalidValue(format!(
                "humidity {} is outside valid range (0-100)",
                r.humidity
            )));
        }

        if r.timestamp < 0 {
            return Err(ParseError::InvalidValue(format!(
                "timestamp {} predates the epoch",
                r.timestamp
            )));
        }

        Ok(self.reading)
    }
}

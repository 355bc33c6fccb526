//! A single device's reading history.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, info};

use co2sense_types::{DeviceId, Reading};

use crate::error::{Error, Result};
use crate::sampling::Sampler;
use crate::schema;

/// File name of the SQLite database inside a device's directory.
pub const STORE_FILE_NAME: &str = "readings.db";

const SELECT_COLUMNS: &str = "timestamp, device_id, owner, co2, temperature, humidity";

/// SQLite-backed ordered table holding one device's readings, keyed by
/// timestamp.
///
/// Each store owns its own connection behind its own lock, so operations
/// on different devices never contend. Once [`close`](Self::close)d, every
/// operation on the handle fails with [`Error::NotFound`].
pub struct DeviceStore {
    device_id: DeviceId,
    dir: Option<PathBuf>,
    conn: Mutex<Option<Connection>>,
}

impl std::fmt::Debug for DeviceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceStore")
            .field("device_id", &self.device_id)
            .field("dir", &self.dir)
            .field("open", &self.is_open())
            .finish()
    }
}

impl DeviceStore {
    /// Open or create the store for `device_id` under `root`.
    ///
    /// The store lives in `root/<device_id>/`.
    pub fn open<P: AsRef<Path>>(root: P, device_id: DeviceId) -> Result<Self> {
        let dir = root.as_ref().join(device_id.as_str());

        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| Error::CreateDirectory {
                path: dir.clone(),
                source: e,
            })?;
        }

        let path = dir.join(STORE_FILE_NAME);
        info!("Opening store for {} at {}", device_id, path.display());
        let conn = Connection::open(&path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self {
            device_id,
            dir: Some(dir),
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory(device_id: DeviceId) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self {
            device_id,
            dir: None,
            conn: Mutex::new(Some(conn)),
        })
    }

    /// The device this store belongs to.
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Directory holding the persisted data, `None` for in-memory stores.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Whether the handle still has an open connection.
    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Close the connection. Later operations fail with [`Error::NotFound`].
    ///
    /// Blocks until any in-flight operation on this store has finished.
    /// Closing an already closed store is a no-op.
    pub fn close(&self) -> Result<()> {
        let conn = self.lock().take();
        if let Some(conn) = conn {
            conn.close().map_err(|(_, e)| Error::Database(e))?;
            info!("Closed store for {}", self.device_id);
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let guard = self.lock();
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(Error::NotFound(self.device_id.clone())),
        }
    }
}

fn row_to_reading(row: &Row<'_>) -> rusqlite::Result<Reading> {
    let device_id: String = row.get(1)?;
    let device_id = DeviceId::try_from(device_id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Reading {
        timestamp: row.get(0)?,
        device_id,
        owner: row.get(2)?,
        co2: row.get(3)?,
        temperature: row.get(4)?,
        humidity: row.get(5)?,
    })
}

// Reading operations
impl DeviceStore {
    /// Write one reading under its timestamp.
    ///
    /// A reading with the same timestamp as an existing one replaces it.
    pub fn append(&self, reading: &Reading) -> Result<()> {
        if reading.device_id != self.device_id {
            return Err(Error::DeviceMismatch {
                expected: self.device_id.clone(),
                found: reading.device_id.clone(),
            });
        }

        self.with_conn(|conn| {
            conn.prepare_cached(
                "INSERT OR REPLACE INTO readings
                 (timestamp, device_id, owner, co2, temperature, humidity)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?
            .execute(rusqlite::params![
                reading.timestamp,
                reading.device_id.as_str(),
                reading.owner,
                reading.co2,
                reading.temperature,
                reading.humidity,
            ])?;
            Ok(())
        })
    }

    /// The reading with the greatest timestamp.
    ///
    /// Fails with [`Error::NoData`] if the store is empty.
    pub fn latest(&self) -> Result<Reading> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM readings ORDER BY timestamp DESC LIMIT 1",
                SELECT_COLUMNS
            );
            conn.prepare_cached(&sql)?
                .query_row([], row_to_reading)
                .optional()?
                .ok_or_else(|| Error::NoData(self.device_id.clone()))
        })
    }

    /// Readings with a timestamp strictly greater than `after`, oldest first,
    /// filtered by `sampler` as the rows stream past.
    pub fn scan_after(&self, after: i64, mut sampler: Sampler) -> Result<Vec<Reading>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM readings WHERE timestamp > ?1 ORDER BY timestamp ASC",
                SELECT_COLUMNS
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map([after], row_to_reading)?;

            let mut readings = Vec::new();
            let mut scanned = 0usize;
            for row in rows {
                let reading = row?;
                scanned += 1;
                if sampler.admit() {
                    readings.push(reading);
                }
            }

            debug!(
                "Scanned {} readings after {} for {}, kept {}",
                scanned,
                after,
                self.device_id,
                readings.len()
            );
            Ok(readings)
        })
    }

    /// Number of stored readings.
    pub fn count(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM readings", [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }
}

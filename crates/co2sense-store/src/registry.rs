//! Registry of open device stores.
//!
//! The [`Registry`] is the only owner of [`DeviceStore`] handles. It is
//! populated once at startup from the data directory
//! ([`open_all`](Registry::open_all)), grows when a device is provisioned
//! ([`create`](Registry::create)) and shrinks when one is deprovisioned
//! ([`remove`](Registry::remove)).
//!
//! # Locking
//!
//! - The handle map sits behind an `RwLock` that is only held long enough
//!   to clone or swap an `Arc`; no disk I/O happens under it.
//! - Each store has its own connection lock, so reads and writes on
//!   different devices proceed in parallel.
//! - `create` and `remove` additionally take a per-device lifecycle lock,
//!   so a store is never opened concurrently with its own removal while
//!   different devices are provisioned independently.
//!
//! # Example
//!
//! ```no_run
//! use co2sense_store::Registry;
//! use co2sense_types::{DeviceId, Reading};
//!
//! let registry = Registry::new("/var/lib/co2sense/db");
//! let report = registry.open_all()?;
//! println!("{} devices loaded", report.opened.len());
//!
//! let device = DeviceId::new_v4();
//! registry.create(&device)?;
//! registry.append(&device, &Reading::builder(device.clone(), "alice").co2(640.0).build())?;
//! let chart = registry.range(&device, 60)?;
//! # Ok::<(), co2sense_store::Error>(())
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info, warn};

use co2sense_types::{DeviceId, Reading, now_millis};

use crate::error::{Error, Result};
use crate::models::{OpenReport, SkippedEntry};
use crate::sampling::{Downsample, window_start};
use crate::store::DeviceStore;

/// Process-wide mapping from device to its open store.
pub struct Registry {
    root: PathBuf,
    policy: Downsample,
    stores: RwLock<HashMap<DeviceId, Arc<DeviceStore>>>,
    lifecycle: Mutex<HashMap<DeviceId, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("root", &self.root)
            .field("policy", &self.policy)
            .field("devices", &self.len())
            .finish()
    }
}

impl Registry {
    /// Create an empty registry rooted at `root` with the default
    /// downsampling policy. Nothing is opened until [`open_all`](Self::open_all)
    /// or [`create`](Self::create).
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self::with_policy(root, Downsample::default())
    }

    /// Create an empty registry with a custom downsampling policy.
    pub fn with_policy<P: Into<PathBuf>>(root: P, policy: Downsample) -> Self {
        Self {
            root: root.into(),
            policy,
            stores: RwLock::new(HashMap::new()),
            lifecycle: Mutex::new(HashMap::new()),
        }
    }

    /// The data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The downsampling policy used by [`range`](Self::range).
    pub fn policy(&self) -> Downsample {
        self.policy
    }

    /// Number of registered stores.
    pub fn len(&self) -> usize {
        self.read_stores().len()
    }

    /// Whether no store is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered devices, sorted.
    pub fn devices(&self) -> Vec<DeviceId> {
        let mut devices: Vec<DeviceId> = self.read_stores().keys().cloned().collect();
        devices.sort();
        devices
    }

    fn read_stores(&self) -> std::sync::RwLockReadGuard<'_, HashMap<DeviceId, Arc<DeviceStore>>> {
        self.stores.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_stores(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<DeviceId, Arc<DeviceStore>>> {
        self.stores.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` holding the lifecycle lock of `device_id`.
    ///
    /// The lock entry is dropped from the map again once no other caller
    /// holds or waits on it, so the map only ever contains ids with a
    /// lifecycle operation in flight.
    fn with_lifecycle_lock<T>(&self, device_id: &DeviceId, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut locks = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(device_id.clone()).or_default())
        };

        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut locks = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        // Clones are only handed out under `locks`, so a count of one is the map's own.
        if locks
            .get(device_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(device_id);
        }

        result
    }
}

// Lifecycle operations
impl Registry {
    /// Open every device store found in the data directory.
    ///
    /// Entries whose name is not a device identifier, and stores that fail
    /// to open, are logged and reported in [`OpenReport::skipped`] without
    /// aborting. The only fatal error is an unreadable data directory. The
    /// directory is created if it does not exist yet.
    pub fn open_all(&self) -> Result<OpenReport> {
        info!("Loading device stores from {}", self.root.display());

        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| Error::CreateDirectory {
                path: self.root.clone(),
                source: e,
            })?;
        }

        let entries = std::fs::read_dir(&self.root).map_err(|e| Error::Io {
            path: self.root.clone(),
            source: e,
        })?;

        let mut report = OpenReport::default();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read entry in {}: {}", self.root.display(), e);
                    report.skipped.push(SkippedEntry {
                        path: self.root.clone(),
                        error: Error::Io {
                            path: self.root.clone(),
                            source: e,
                        },
                    });
                    continue;
                }
            };

            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            // Only canonical names: an uppercase directory would otherwise
            // be opened as a second, empty lowercase sibling.
            let device_id = match DeviceId::parse(&name) {
                Ok(id) if path.is_dir() && DeviceId::is_canonical(&name) => id,
                _ => {
                    warn!("Found entry '{}' in data directory that is not a device store", name);
                    report.skipped.push(SkippedEntry {
                        path,
                        error: Error::InvalidDeviceName(name),
                    });
                    continue;
                }
            };

            match self.create(&device_id) {
                Ok(_) => report.opened.push(device_id),
                Err(e) => {
                    warn!("Failed to open store for {}: {}", device_id, e);
                    report.skipped.push(SkippedEntry { path, error: e });
                }
            }
        }

        report.opened.sort();
        info!(
            "Loaded {} device store(s), skipped {} entr{}",
            report.opened.len(),
            report.skipped.len(),
            if report.skipped.len() == 1 { "y" } else { "ies" }
        );

        Ok(report)
    }

    /// Open (creating if absent) and register the store for `device_id`.
    ///
    /// Idempotent: if a store is already registered it is returned as is.
    pub fn create(&self, device_id: &DeviceId) -> Result<Arc<DeviceStore>> {
        self.with_lifecycle_lock(device_id, || {
            if let Some(existing) = self.read_stores().get(device_id) {
                debug!("Store for {} already registered", device_id);
                return Ok(Arc::clone(existing));
            }

            let store = Arc::new(DeviceStore::open(&self.root, device_id.clone())?);
            self.write_stores()
                .insert(device_id.clone(), Arc::clone(&store));
            Ok(store)
        })
    }

    /// Close and deregister the store for `device_id`, then irreversibly
    /// delete its directory.
    ///
    /// Removing a device with no registered store only logs a warning
    /// (and still deletes any leftover directory), so a failed removal can
    /// be retried.
    pub fn remove(&self, device_id: &DeviceId) -> Result<()> {
        self.with_lifecycle_lock(device_id, || self.remove_locked(device_id))
    }

    fn remove_locked(&self, device_id: &DeviceId) -> Result<()> {
        let removed = self.write_stores().remove(device_id);
        match removed {
            // A failed close still releases the connection (rusqlite drops
            // it), so the directory is deleted regardless.
            Some(store) => {
                if let Err(e) = store.close() {
                    warn!("Error closing store for {}: {}", device_id, e);
                }
            }
            None => warn!("No store registered for {}, nothing to close", device_id),
        }

        let dir = self.root.join(device_id.as_str());
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                info!("Deleted store for {} at {}", device_id, dir.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No persisted data for {} at {}", device_id, dir.display());
                Ok(())
            }
            Err(e) => Err(Error::Io {
                path: dir,
                source: e,
            }),
        }
    }

    /// The open store for `device_id`.
    ///
    /// [`Error::NotFound`] means "no data yet" as far as the registry knows;
    /// whether the device is legitimate is for the caller to decide.
    pub fn handle(&self, device_id: &DeviceId) -> Result<Arc<DeviceStore>> {
        self.read_stores()
            .get(device_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(device_id.clone()))
    }

    /// Close every store and empty the registry.
    ///
    /// All stores are closed even if some fail; the first failure is returned.
    pub fn shutdown(&self) -> Result<()> {
        let stores: Vec<Arc<DeviceStore>> = self.write_stores().drain().map(|(_, s)| s).collect();
        info!("Closing {} device store(s)", stores.len());

        let mut first_error = None;
        for store in stores {
            if let Err(e) = store.close() {
                warn!("Error closing store for {}: {}", store.device_id(), e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// Reading operations
impl Registry {
    /// Write `reading` to the store of `device_id`.
    ///
    /// Never creates a store: fails with [`Error::NotFound`] if the device
    /// has not been provisioned. Storage failures are returned, not retried.
    pub fn append(&self, device_id: &DeviceId, reading: &Reading) -> Result<()> {
        self.handle(device_id)?.append(reading)
    }

    /// The most recent reading of `device_id`.
    ///
    /// Fails with [`Error::NotFound`] for an unregistered device and with
    /// [`Error::NoData`] for an empty store.
    pub fn latest(&self, device_id: &DeviceId) -> Result<Reading> {
        self.handle(device_id)?.latest()
    }

    /// Readings from the last `window_minutes`, oldest first, downsampled
    /// per the registry's [`Downsample`] policy.
    ///
    /// An empty window yields an empty vector, not an error.
    pub fn range(&self, device_id: &DeviceId, window_minutes: u32) -> Result<Vec<Reading>> {
        self.range_at(device_id, window_minutes, now_millis())
    }

    /// [`range`](Self::range) with an explicit clock.
    pub fn range_at(
        &self,
        device_id: &DeviceId,
        window_minutes: u32,
        now_ms: i64,
    ) -> Result<Vec<Reading>> {
        let store = self.handle(device_id)?;
        let start = window_start(now_ms, window_minutes);
        debug!(
            "Range query for {}: {} min, stride {:?}",
            device_id,
            window_minutes,
            self.policy.stride(window_minutes)
        );
        store.scan_after(start, self.policy.sampler(window_minutes))
    }
}

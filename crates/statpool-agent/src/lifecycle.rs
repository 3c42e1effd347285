//! Region lifecycle: who creates the shared table, who attaches to it, and
//! how workers find it.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use statpool_core::{CounterError, Result, StatusCatalog, StatusEntry};

use crate::config::CountersSection;
use crate::lock::CrossProcessLock;
use crate::region::{AttachedRegion, OwnedRegion};
use crate::store::SharedCounterStore;

/// Environment variable carrying the locator JSON to worker processes.
pub const REGION_ENV_VAR: &str = "STATPOOL_REGION";

/// Process-wide guard against creating the region on every configuration
/// pass. Hosts that evaluate configuration more than once before settling
/// build it with `new()`: the first bootstrap defers and only the next one
/// creates. Hosts that bootstrap exactly once use `armed()`.
pub struct StartupMarker {
    armed: AtomicBool,
}

impl StartupMarker {
    pub fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
        }
    }

    pub fn armed() -> Self {
        Self {
            armed: AtomicBool::new(true),
        }
    }

    /// True when the calling pass is the one that must create the region.
    fn take(&self) -> bool {
        self.armed.swap(true, Ordering::SeqCst)
    }
}

impl Default for StartupMarker {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a worker needs to attach: file names and the catalog, never
/// live handles. Travels by value, as JSON in `STATPOOL_REGION`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionLocator {
    pub region_path: PathBuf,
    pub lock_path: PathBuf,
    pub catalog: Vec<StatusEntry>,
}

impl RegionLocator {
    pub fn to_env_value(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| CounterError::Config(format!("encode locator: {e}")))
    }

    pub fn from_env_value(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| CounterError::Config(format!("decode locator: {e}")))
    }

    /// The locator an enclosing coordinator exported, if any.
    pub fn from_env() -> Option<Result<Self>> {
        std::env::var(REGION_ENV_VAR)
            .ok()
            .map(|raw| Self::from_env_value(&raw))
    }
}

/// Outcome of one bootstrap pass.
pub enum Bootstrap {
    /// Non-final configuration pass; nothing was created.
    Deferred,
    Ready(Coordinator),
}

/// Owner of the region and lock. Exactly one per server instance.
pub struct Coordinator {
    catalog: Arc<StatusCatalog>,
    region: OwnedRegion,
    lock: Arc<CrossProcessLock>,
}

impl Coordinator {
    /// Create the region and lock for this server instance, unless this is a
    /// pass the marker tells us to sit out. Region and lock files live under
    /// `region_dir` as `<name_hint>.<pid>` and `<name_hint>.<pid>.lock`, so
    /// instances on one host never collide.
    pub fn bootstrap(counters: &CountersSection, marker: &StartupMarker) -> Result<Bootstrap> {
        if !marker.take() {
            tracing::debug!("non-final configuration pass, deferring region creation");
            return Ok(Bootstrap::Deferred);
        }

        let catalog = Arc::new(counters.build_catalog()?);
        let dir = counters
            .region_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let pid = std::process::id();
        let region_path = dir.join(format!("{}.{pid}", counters.name_hint));
        let lock_path = dir.join(format!("{}.{pid}.lock", counters.name_hint));

        let region = OwnedRegion::create(&region_path, catalog.slots())?;
        let lock = Arc::new(CrossProcessLock::create(&lock_path)?);
        tracing::info!(
            region = %region_path.display(),
            slots = catalog.slots(),
            "counter region created"
        );
        Ok(Bootstrap::Ready(Coordinator {
            catalog,
            region,
            lock,
        }))
    }

    /// A store handle for this process.
    pub fn store(&self) -> SharedCounterStore {
        SharedCounterStore::new(
            Arc::clone(&self.catalog),
            self.region.view(),
            Arc::clone(&self.lock),
        )
    }

    /// What workers inherit in order to attach on their own.
    pub fn locator(&self) -> RegionLocator {
        RegionLocator {
            region_path: self.region.path().to_path_buf(),
            lock_path: self.lock.path().to_path_buf(),
            catalog: self.catalog.entries().to_vec(),
        }
    }

    /// Unlink the lock file and the region. Attaching by the old locator
    /// fails from here on; a replacement region starts from zero.
    pub fn destroy(self) {
        if let Err(error) = std::fs::remove_file(self.lock.path()) {
            tracing::warn!(path = %self.lock.path().display(), %error, "failed to unlink lock file");
        }
        self.region.destroy();
        tracing::info!("counter region destroyed");
    }
}

/// Attach-side capability: may bump and snapshot, can never destroy.
pub struct Worker {
    catalog: Arc<StatusCatalog>,
    region: AttachedRegion,
    lock: Arc<CrossProcessLock>,
}

impl Worker {
    /// Attach to an existing region. Any failure here is fatal to the worker
    /// process.
    pub fn attach(locator: &RegionLocator) -> Result<Self> {
        let catalog = Arc::new(StatusCatalog::new(locator.catalog.clone())?);
        let region = AttachedRegion::attach(&locator.region_path, catalog.slots())?;
        let lock = Arc::new(CrossProcessLock::reopen(&locator.lock_path)?);
        tracing::debug!(region = %region.path().display(), "worker attached to counter region");
        Ok(Worker {
            catalog,
            region,
            lock,
        })
    }

    /// A store handle for this process.
    pub fn store(&self) -> SharedCounterStore {
        SharedCounterStore::new(
            Arc::clone(&self.catalog),
            self.region.view(),
            Arc::clone(&self.lock),
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::path::Path;

    use statpool_core::CounterStore;

    use super::*;

    fn counters_in(dir: &Path) -> CountersSection {
        CountersSection {
            region_dir: Some(dir.to_path_buf()),
            name_hint: "lifecycle_test".into(),
            ..CountersSection::default()
        }
    }

    fn ready(bootstrap: Bootstrap) -> Coordinator {
        match bootstrap {
            Bootstrap::Ready(coordinator) => coordinator,
            Bootstrap::Deferred => panic!("expected a created region"),
        }
    }

    #[test]
    fn first_pass_defers_second_pass_creates() {
        let dir = tempfile::tempdir().unwrap();
        let counters = counters_in(dir.path());
        let marker = StartupMarker::new();

        let first = Coordinator::bootstrap(&counters, &marker).unwrap();
        assert!(matches!(first, Bootstrap::Deferred));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        let coordinator = ready(Coordinator::bootstrap(&counters, &marker).unwrap());
        assert!(coordinator.locator().region_path.exists());
    }

    #[test]
    fn armed_marker_creates_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let marker = StartupMarker::armed();
        let bootstrap = Coordinator::bootstrap(&counters_in(dir.path()), &marker).unwrap();
        assert!(matches!(bootstrap, Bootstrap::Ready(_)));
    }

    #[test]
    fn locator_round_trips_through_env_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let marker = StartupMarker::armed();
        let coordinator =
            ready(Coordinator::bootstrap(&counters_in(dir.path()), &marker).unwrap());

        let locator = coordinator.locator();
        let raw = locator.to_env_value().unwrap();
        let back = RegionLocator::from_env_value(&raw).unwrap();
        assert_eq!(back.region_path, locator.region_path);
        assert_eq!(back.lock_path, locator.lock_path);
        assert_eq!(back.catalog, locator.catalog);
    }

    #[test]
    fn worker_counts_into_the_coordinator_table() {
        let dir = tempfile::tempdir().unwrap();
        let marker = StartupMarker::armed();
        let coordinator =
            ready(Coordinator::bootstrap(&counters_in(dir.path()), &marker).unwrap());

        let worker = Worker::attach(&coordinator.locator()).unwrap();
        worker.store().increment(404).unwrap();
        worker.store().increment(404).unwrap();

        assert_eq!(coordinator.store().snapshot().unwrap().count_for(404), 2);
    }

    #[test]
    fn destroy_breaks_the_old_locator() {
        let dir = tempfile::tempdir().unwrap();
        let marker = StartupMarker::armed();
        let coordinator =
            ready(Coordinator::bootstrap(&counters_in(dir.path()), &marker).unwrap());

        let locator = coordinator.locator();
        coordinator.store().increment(200).unwrap();
        coordinator.destroy();

        assert!(Worker::attach(&locator).is_err());
        assert!(!locator.region_path.exists());
        assert!(!locator.lock_path.exists());

        // A fresh bootstrap in the same place starts from zero.
        let marker = StartupMarker::armed();
        let fresh = ready(Coordinator::bootstrap(&counters_in(dir.path()), &marker).unwrap());
        assert_eq!(fresh.store().snapshot().unwrap().total(), 0);
    }
}

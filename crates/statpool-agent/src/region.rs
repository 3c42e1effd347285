//! File-backed shared memory holding the counter table.
//!
//! The region is a plain file mapped `MAP_SHARED` into every participating
//! process. The coordinator creates and later unlinks it (`OwnedRegion`);
//! workers only ever open what already exists (`AttachedRegion`) and cannot
//! destroy it. Slot access goes through [`TableView`], whose loads and stores
//! are volatile and must only happen while the cross-process lock is held.

use std::fs::{self, File, OpenOptions};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};
use statpool_core::{CounterError, Result};

const SLOT_BYTES: usize = std::mem::size_of::<u64>();

fn errno_to_io(errno: nix::errno::Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(errno as i32)
}

/// The live mapping. Unmapped exactly once, when the last view drops.
#[derive(Debug)]
struct Mapping {
    base: NonNull<u64>,
    len_bytes: usize,
    slots: usize,
}

// Raw table access is serialized by the cross-process lock; the pointer
// itself is stable for the lifetime of the mapping.
unsafe impl Send for Mapping {}
unsafe impl Sync for Mapping {}

impl Drop for Mapping {
    fn drop(&mut self) {
        if let Err(errno) = unsafe { munmap(self.base.cast(), self.len_bytes) } {
            tracing::warn!(errno = %errno, "failed to unmap counter region");
        }
    }
}

fn map_table(file: &File, path: &Path, slots: usize) -> Result<Arc<Mapping>> {
    let len_bytes = slots * SLOT_BYTES;
    let length = NonZeroUsize::new(len_bytes).ok_or_else(|| {
        CounterError::Config("counter region needs at least one slot".to_string())
    })?;
    let base = unsafe {
        mmap(
            None,
            length,
            ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
            MapFlags::MAP_SHARED,
            file,
            0,
        )
    }
    .map_err(|errno| CounterError::RegionAttach {
        path: path.to_path_buf(),
        source: errno_to_io(errno),
    })?;
    Ok(Arc::new(Mapping {
        base: base.cast(),
        len_bytes,
        slots,
    }))
}

/// Shared handle onto the raw counter table.
///
/// Every load and store must happen while the region's cross-process lock is
/// held; the view itself only guarantees the mapping stays alive and the slot
/// index is in bounds.
#[derive(Clone)]
pub struct TableView {
    map: Arc<Mapping>,
}

impl TableView {
    pub fn slots(&self) -> usize {
        self.map.slots
    }

    fn check(&self, slot: usize) -> Result<()> {
        if slot < self.map.slots {
            Ok(())
        } else {
            Err(CounterError::SlotOutOfBounds {
                slot,
                slots: self.map.slots,
            })
        }
    }

    /// Volatile read of one slot. Caller holds the lock.
    pub(crate) fn load(&self, slot: usize) -> Result<u64> {
        self.check(slot)?;
        Ok(unsafe { self.map.base.as_ptr().add(slot).read_volatile() })
    }

    /// Volatile write of one slot. Caller holds the lock.
    pub(crate) fn store(&self, slot: usize, value: u64) -> Result<()> {
        self.check(slot)?;
        unsafe { self.map.base.as_ptr().add(slot).write_volatile(value) };
        Ok(())
    }

    /// Volatile copy of every slot. Caller holds the lock.
    pub(crate) fn copy_all(&self) -> Vec<u64> {
        (0..self.map.slots)
            .map(|slot| unsafe { self.map.base.as_ptr().add(slot).read_volatile() })
            .collect()
    }
}

/// Coordinator-owned region: creates the backing file, destroys it on drop.
pub struct OwnedRegion {
    map: Arc<Mapping>,
    path: PathBuf,
}

impl OwnedRegion {
    /// Create (or truncate a stale leftover of) the backing file, size it to
    /// the table, map it, and zero every slot. Fresh file pages are not
    /// assumed to read back as zero.
    pub fn create(path: &Path, slots: usize) -> Result<Self> {
        let create_err = |source: std::io::Error| CounterError::RegionCreate {
            path: path.to_path_buf(),
            source,
        };
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(create_err)?;
        file.set_len((slots * SLOT_BYTES) as u64).map_err(create_err)?;

        let map = map_table(&file, path, slots).map_err(|error| match error {
            CounterError::RegionAttach { path, source } => {
                CounterError::RegionCreate { path, source }
            }
            other => other,
        })?;
        unsafe { std::ptr::write_bytes(map.base.as_ptr(), 0, slots) };

        Ok(Self {
            map,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn view(&self) -> TableView {
        TableView {
            map: Arc::clone(&self.map),
        }
    }

    /// Tear the region down. Outstanding views keep their mapping until they
    /// drop, but the name is gone: nothing can attach to it anymore.
    pub fn destroy(self) {
        drop(self);
    }
}

impl Drop for OwnedRegion {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), %error, "failed to unlink counter region");
        }
    }
}

/// Worker-held region: opens what the coordinator created, never unlinks.
#[derive(Debug)]
pub struct AttachedRegion {
    map: Arc<Mapping>,
    path: PathBuf,
}

impl AttachedRegion {
    /// Map an existing region. The file must already exist and hold exactly
    /// `slots` counters; a size mismatch means the locator and the region
    /// disagree about the catalog and attaching would corrupt the table.
    pub fn attach(path: &Path, slots: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| CounterError::RegionAttach {
                path: path.to_path_buf(),
                source,
            })?;
        let expected = (slots * SLOT_BYTES) as u64;
        let found = file
            .metadata()
            .map_err(|source| CounterError::RegionAttach {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        if found != expected {
            return Err(CounterError::RegionSize {
                path: path.to_path_buf(),
                expected,
                found,
            });
        }

        let map = map_table(&file, path, slots)?;
        Ok(Self {
            map,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn view(&self) -> TableView {
        TableView {
            map: Arc::clone(&self.map),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn created_region_starts_zeroed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.1");
        let region = OwnedRegion::create(&path, 8).unwrap();
        let view = region.view();
        assert_eq!(view.slots(), 8);
        assert_eq!(view.copy_all(), vec![0; 8]);
    }

    #[test]
    fn attached_view_sees_owner_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.1");
        let region = OwnedRegion::create(&path, 4).unwrap();
        region.view().store(2, 41).unwrap();

        let attached = AttachedRegion::attach(&path, 4).unwrap();
        assert_eq!(attached.view().load(2).unwrap(), 41);

        attached.view().store(2, 42).unwrap();
        assert_eq!(region.view().load(2).unwrap(), 42);
    }

    #[test]
    fn attach_requires_matching_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.1");
        let _region = OwnedRegion::create(&path, 4).unwrap();
        let err = AttachedRegion::attach(&path, 5).unwrap_err();
        assert!(matches!(err, CounterError::RegionSize { .. }));
    }

    #[test]
    fn attach_fails_once_destroyed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.1");
        let region = OwnedRegion::create(&path, 4).unwrap();
        region.destroy();
        let err = AttachedRegion::attach(&path, 4).unwrap_err();
        assert!(matches!(err, CounterError::RegionAttach { .. }));
    }

    #[test]
    fn recreate_after_destroy_resets_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.1");
        let region = OwnedRegion::create(&path, 4).unwrap();
        region.view().store(0, 99).unwrap();
        region.destroy();

        let fresh = OwnedRegion::create(&path, 4).unwrap();
        assert_eq!(fresh.view().copy_all(), vec![0; 4]);
    }

    #[test]
    fn views_outlive_the_owner_but_not_the_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.1");
        let region = OwnedRegion::create(&path, 4).unwrap();
        let view = region.view();
        view.store(1, 7).unwrap();
        region.destroy();
        // The mapping is still valid for the surviving view.
        assert_eq!(view.load(1).unwrap(), 7);
        assert!(!path.exists());
    }

    #[test]
    fn region_handles_are_debug_formattable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.1");
        let _owner = OwnedRegion::create(&path, 4).unwrap();
        let attached = AttachedRegion::attach(&path, 4).unwrap();
        assert!(format!("{attached:?}").contains("table.1"));
    }

    #[test]
    fn out_of_bounds_slots_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.1");
        let region = OwnedRegion::create(&path, 4).unwrap();
        let view = region.view();
        assert!(matches!(
            view.load(4),
            Err(CounterError::SlotOutOfBounds { slot: 4, slots: 4 })
        ));
        assert!(view.store(4, 1).is_err());
    }
}

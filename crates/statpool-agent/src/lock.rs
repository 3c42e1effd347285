//! Cross-process mutual exclusion for the counter table.
//!
//! An advisory `flock` on a sibling lock file serializes processes; a plain
//! in-process mutex serializes threads, which `flock` alone does not do for
//! threads sharing one file description. Acquisition blocks without timeout:
//! critical sections are a single slot update or one table copy.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use fs2::FileExt;
use statpool_core::{CounterError, Result};

#[derive(Debug)]
pub struct CrossProcessLock {
    file: File,
    path: PathBuf,
    thread_gate: Mutex<()>,
}

impl CrossProcessLock {
    /// Coordinator side: create the lock file (reusing a stale leftover).
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|source| CounterError::LockCreate {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::wrap(file, path))
    }

    /// Worker side: open the existing lock file, never create one. A missing
    /// file means the coordinator's region is gone and the worker must not
    /// touch the table.
    pub fn reopen(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| CounterError::LockReopen {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::wrap(file, path))
    }

    fn wrap(file: File, path: &Path) -> Self {
        Self {
            file,
            path: path.to_path_buf(),
            thread_gate: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until both the thread gate and the file lock are held.
    pub fn acquire(&self) -> Result<LockGuard<'_>> {
        let gate = self
            .thread_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.file
            .lock_exclusive()
            .map_err(CounterError::LockAcquire)?;
        Ok(LockGuard {
            lock: self,
            _gate: gate,
        })
    }
}

/// Held lock. Releases the file lock, then the thread gate, on drop.
pub struct LockGuard<'a> {
    lock: &'a CrossProcessLock,
    _gate: MutexGuard<'a, ()>,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        let _ = self.lock.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn reopen_requires_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.lock");
        let err = CrossProcessLock::reopen(&path).unwrap_err();
        assert!(matches!(err, CounterError::LockReopen { .. }));

        let _created = CrossProcessLock::create(&path).unwrap();
        assert!(CrossProcessLock::reopen(&path).is_ok());
    }

    #[test]
    fn lock_handle_is_debug_formattable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.lock");
        let lock = CrossProcessLock::create(&path).unwrap();
        assert!(format!("{lock:?}").contains("counters.lock"));
    }

    #[test]
    fn guard_releases_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.lock");
        let lock = CrossProcessLock::create(&path).unwrap();
        drop(lock.acquire().unwrap());
        // A second acquisition must not deadlock.
        drop(lock.acquire().unwrap());
    }

    #[test]
    fn threads_are_serialized_through_one_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.lock");
        let lock = Arc::new(CrossProcessLock::create(&path).unwrap());

        let held = lock.acquire().unwrap();
        let contender = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let _guard = lock.acquire().unwrap();
            })
        };
        // Give the contender time to block on the gate.
        thread::sleep(Duration::from_millis(50));
        assert!(!contender.is_finished());

        drop(held);
        contender.join().unwrap();
    }

    #[test]
    fn two_handles_on_one_file_exclude_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counters.lock");
        let a = CrossProcessLock::create(&path).unwrap();
        let b = Arc::new(CrossProcessLock::reopen(&path).unwrap());

        let held = a.acquire().unwrap();
        let contender = {
            let b = Arc::clone(&b);
            thread::spawn(move || {
                let _guard = b.acquire().unwrap();
            })
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!contender.is_finished());

        drop(held);
        contender.join().unwrap();
    }
}

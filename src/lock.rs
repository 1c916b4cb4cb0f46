// src/lock.rs

//! Exclusive lock on a keg directory
//!
//! Relocation performs no internal locking: two relocations of the same keg
//! interleaving reads and writes would corrupt it. Callers that may race
//! hold a `KegLock` for the duration of the operation.
//!
//! The lock is an advisory `flock(LOCK_EX)` taken on the keg directory
//! itself, so no lock file ends up inside the packaged tree.
//!
//! # Example
//!
//! ```ignore
//! use keg_relocate::lock::KegLock;
//!
//! let _lock = KegLock::try_acquire("/opt/pkg/Cellar/foo/1.0")?;
//! // ... relocate ...
//! // Lock released on drop
//! ```

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exclusive advisory lock held on a keg directory
pub struct KegLock {
    /// Open handle on the directory (kept open to maintain lock)
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl KegLock {
    /// Acquire the lock, blocking until available
    pub fn acquire<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;

        file.lock_exclusive()?;
        debug!("Acquired keg lock on {}", path.display());

        Ok(Self { file, path })
    }

    /// Acquire the lock, failing with `Error::Locked` if it is held
    pub fn try_acquire<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("Acquired keg lock on {}", path.display());
                Ok(Self { file, path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(Error::Locked(path)),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// The locked keg directory
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for KegLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        debug!("Released keg lock on {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_is_exclusive() {
        let temp_dir = TempDir::new().unwrap();

        let lock = KegLock::try_acquire(temp_dir.path()).unwrap();
        assert_eq!(lock.path(), temp_dir.path());

        let err = KegLock::try_acquire(temp_dir.path()).err().unwrap();
        assert!(matches!(err, Error::Locked(_)));
    }

    #[test]
    fn test_lock_released_on_drop() {
        let temp_dir = TempDir::new().unwrap();

        drop(KegLock::acquire(temp_dir.path()).unwrap());

        assert!(KegLock::try_acquire(temp_dir.path()).is_ok());
    }

    #[test]
    fn test_lock_leaves_no_files() {
        let temp_dir = TempDir::new().unwrap();

        let _lock = KegLock::acquire(temp_dir.path()).unwrap();

        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }
}

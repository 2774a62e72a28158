use crate::{Error, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Exclusive advisory lock held for the lifetime of the value.
///
/// Serializes install attempts that target the same live root, across
/// threads and processes. The lock file itself is left on disk.
pub struct InstallLock {
    file: File,
    path: PathBuf,
}

impl InstallLock {
    fn open(path: &Path) -> Result<File> {
        File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::Lock {
                path: path.to_path_buf(),
                source: e,
            })
    }

    /// Block until the lock is acquired.
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = Self::open(path)?;
        file.lock_exclusive().map_err(|e| Error::Lock {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), "install lock acquired");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Fail immediately with `WouldBlock` if another holder exists.
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = Self::open(path)?;
        file.try_lock_exclusive().map_err(|e| Error::Lock {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

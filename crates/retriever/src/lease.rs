//! Exclusive leases on staging directories.
//!
//! Two retrievals of the same library for the same job must not write into
//! the same staging directory at once. A lease holds an OS file lock on a
//! sibling lock file for as long as it lives.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Exclusive hold on one staging directory.
///
/// The lock is released when the lease is dropped.
#[derive(Debug)]
pub struct StagingLease {
    path: PathBuf,
    lock_path: PathBuf,
    file: File,
}

impl StagingLease {
    /// Acquire the lease for `path`, waiting for any current holder.
    ///
    /// Creates `path` (and its parents) once the lock is held.
    pub async fn acquire(path: &Path) -> Result<Self> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::acquire_blocking(path))
            .await
            .map_err(|e| Error::Task(e.to_string()))?
    }

    fn acquire_blocking(path: PathBuf) -> Result<Self> {
        let lock_path = lock_path_for(&path);
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::io(parent, "create"))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(Error::io(&lock_path, "open lock"))?;

        trace!(lock = %lock_path.display(), "Waiting for staging lock");
        fs4::fs_std::FileExt::lock_exclusive(&file).map_err(Error::io(&lock_path, "lock"))?;

        std::fs::create_dir_all(&path).map_err(Error::io(&path, "create"))?;
        debug!(path = %path.display(), "Acquired staging lease");

        Ok(Self {
            path,
            lock_path,
            file,
        })
    }

    /// The leased staging directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingLease {
    fn drop(&mut self) {
        let _ = fs4::fs_std::FileExt::unlock(&self.file);
        trace!(lock = %self.lock_path.display(), "Released staging lease");
    }
}

/// `<parent>/.<name>.lock` for a staging directory `<parent>/<name>`.
fn lock_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.lock"))
}

//! Advisory locking and atomic replacement for on-disk collections.
//!
//! Every write to a collection file happens under `<file>.lock` and lands
//! through a temp file + rename, so readers see either the old or the new
//! collection, never a torn one.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::{Error, Result};

/// How long a store operation waits for the collection lock
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

const LOCK_POLL_MS: u64 = 25;

fn is_contended(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }

    // Windows reports sharing/lock violations as raw OS errors.
    #[cfg(windows)]
    {
        matches!(err.raw_os_error(), Some(32) | Some(33))
    }
    #[cfg(not(windows))]
    {
        false
    }
}

/// Lock-file path guarding `path`
pub fn lock_path_for(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.lock", path.display()))
}

fn open_lock_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?)
}

/// Exclusive lock held until dropped
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Acquire the lock at `path`, polling until `timeout_ms` elapses.
    pub fn acquire(path: impl AsRef<Path>, timeout_ms: u64) -> Result<Self> {
        let path = path.as_ref();
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);

        loop {
            if let Some(lock) = Self::try_acquire(path)? {
                return Ok(lock);
            }
            if Instant::now() >= deadline {
                return Err(Error::LockFailed(path.to_path_buf()));
            }
            std::thread::sleep(Duration::from_millis(LOCK_POLL_MS));
        }
    }

    /// Take the lock only if it is free right now.
    pub fn try_acquire(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        let file = open_lock_file(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(FileLock { file })),
            Err(err) if is_contended(&err) => Ok(None),
            Err(err) => Err(Error::Io(err)),
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Replace `path` with `data` via temp file + rename. Takes no lock.
pub fn write_atomic(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension(format!("tmp.{}", std::process::id()));
    let mut temp = File::create(&temp_path)?;
    temp.write_all(data)?;
    temp.sync_all()?;
    drop(temp);

    fs::rename(&temp_path, path)?;
    Ok(())
}

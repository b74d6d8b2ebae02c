//! Lock files
//!
//! Mutual exclusion keyed by a lock file path. The lock file's existence IS
//! the lock: acquisition is an atomic `create_new` open, release deletes the
//! file. The guarantee holds across process boundaries wherever the
//! filesystem provides atomic exclusive creation (local filesystems do;
//! network filesystems with weak atomicity do not).
//!
//! A pid/timestamp payload is written into the lock file for diagnostics.
//! It is never read back: lock existence is the sole correctness signal.
//! There is no stale-lock expiry; a crashed holder leaves its file behind
//! until an operator removes it.

use crate::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Guard that releases the lock file when dropped.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    /// The lock file this guard owns.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Explicitly release the lock.
    pub fn release(self) {
        // Drop will handle it
        drop(self);
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            // Idempotent release: already-gone is success.
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to release lock file"
                );
            }
        } else {
            tracing::debug!(path = %self.path.display(), "Released lock");
        }
    }
}

/// Attempt to take the lock at `path` without blocking.
///
/// Returns `Ok(None)` when another holder exists.
///
/// # Errors
///
/// Returns an I/O error when the lock directory cannot be created or the
/// creation attempt fails for a reason other than the file already existing.
pub fn try_acquire(path: &Path) -> Result<Option<LockGuard>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create_dir_all"))?;
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            // Diagnostics only; never read back for correctness.
            let _ = writeln!(
                file,
                "pid={} time={}",
                std::process::id(),
                current_timestamp()
            );
            tracing::debug!(path = %path.display(), "Acquired lock");
            Ok(Some(LockGuard {
                path: path.to_path_buf(),
            }))
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(Error::io(e, path, "create_new")),
    }
}

/// Acquire the lock at `path`, polling until `timeout` elapses.
///
/// Spin-wait with `poll` sleeps between attempts: acceptable because
/// contention is rare and per-artifact.
///
/// # Errors
///
/// Returns [`Error::LockTimeout`] when the window closes without success,
/// or an I/O error from the underlying attempt.
pub async fn acquire(path: &Path, timeout: Duration, poll: Duration) -> Result<LockGuard> {
    let start = Instant::now();
    loop {
        if let Some(guard) = try_acquire(path)? {
            return Ok(guard);
        }
        if start.elapsed() >= timeout {
            return Err(Error::lock_timeout(path));
        }
        tokio::time::sleep(poll).await;
    }
}

fn current_timestamp() -> u64 {
    // System time before the epoch is practically impossible; report 0
    // rather than failing a lock acquisition over a diagnostic payload.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_try_acquire_is_exclusive() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("artifact.lock");

        let guard = try_acquire(&path).unwrap().expect("first acquisition");
        assert!(path.exists());

        // Second attempt must observe the holder.
        assert!(try_acquire(&path).unwrap().is_none());

        drop(guard);
        assert!(!path.exists());

        // Now we can acquire again.
        let _guard2 = try_acquire(&path).unwrap().expect("reacquisition");
    }

    #[test]
    fn test_release_tolerates_missing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gone.lock");

        let guard = try_acquire(&path).unwrap().expect("acquisition");
        fs::remove_file(&path).unwrap();
        // Drop must not panic or error.
        drop(guard);
    }

    #[test]
    fn test_lock_dir_is_created_on_demand() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("locks/deep/artifact.lock");

        let _guard = try_acquire(&path).unwrap().expect("acquisition");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("waited.lock");

        let guard = try_acquire(&path).unwrap().expect("holder");
        let contender = tokio::spawn({
            let path = path.clone();
            async move {
                acquire(
                    &path,
                    Duration::from_secs(5),
                    Duration::from_millis(10),
                )
                .await
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(guard);

        let acquired = contender.await.unwrap();
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn test_acquire_times_out() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("held.lock");

        let _holder = try_acquire(&path).unwrap().expect("holder");
        let result = acquire(
            &path,
            Duration::from_millis(50),
            Duration::from_millis(10),
        )
        .await;

        match result {
            Err(Error::LockTimeout { path: p }) => assert_eq!(&*p, path.as_path()),
            other => panic!("expected LockTimeout, got {other:?}"),
        }
    }
}

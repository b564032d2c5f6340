//! Per-path filesystem locks.
//!
//! Mutating writes to persisted files (cache entries, reference listings)
//! are guarded by a sibling `<path>.lock` file created exclusively. Lock
//! holders that die are recovered through a staleness timeout.

use std::io;
use std::time::{Duration, SystemTime};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::warn;
use tydi_core::error::TydiError;

use crate::FetchResult;

/// Delay between acquisition attempts
const LOCK_WAIT: Duration = Duration::from_millis(250);
/// Attempts before giving up
const LOCK_RETRIES: u32 = 25;
/// Age after which a held lock is considered abandoned
const LOCK_STALE: Duration = Duration::from_secs(60);

/// An exclusive lock on a target path, released on drop
#[derive(Debug)]
pub struct FileLock {
    lock_path: Utf8PathBuf,
}

impl FileLock {
    /// Acquire the lock for `target`, waiting for a current holder.
    ///
    /// Retries 25 times at 250 ms intervals; a lockfile older than 60
    /// seconds is treated as stale and stolen.
    pub async fn acquire(target: &Utf8Path) -> FetchResult<Self> {
        let lock_path = Utf8PathBuf::from(format!("{target}.lock"));

        for _ in 0..LOCK_RETRIES {
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(_) => return Ok(Self { lock_path }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    if lock_is_stale(&lock_path) {
                        warn!(lock = %lock_path, "removing stale lockfile");
                        let _ = std::fs::remove_file(&lock_path);
                        continue;
                    }
                    tokio::time::sleep(LOCK_WAIT).await;
                },
                Err(e) => {
                    return Err(TydiError::io(
                        format!("Failed to create lockfile {lock_path}"),
                        e,
                    ))
                },
            }
        }

        Err(TydiError::io(
            format!("Timed out waiting for lockfile {lock_path}"),
            io::Error::new(io::ErrorKind::TimedOut, "lock acquisition retries exhausted"),
        ))
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.lock_path);
    }
}

fn lock_is_stale(lock_path: &Utf8Path) -> bool {
    let Ok(metadata) = std::fs::metadata(lock_path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    SystemTime::now()
        .duration_since(modified)
        .map(|age| age > LOCK_STALE)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let target = root.join("main.d.ts");
        (temp, target)
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let (_temp, target) = fixture();
        let lock_path = Utf8PathBuf::from(format!("{target}.lock"));

        {
            let _lock = FileLock::acquire(&target).await.unwrap();
            assert!(lock_path.exists());
        }
        assert!(!lock_path.exists());
    }

    #[tokio::test]
    async fn test_sequential_acquisition() {
        let (_temp, target) = fixture();

        let first = FileLock::acquire(&target).await.unwrap();
        drop(first);
        let _second = FileLock::acquire(&target).await.unwrap();
    }

    #[tokio::test]
    async fn test_stale_lock_is_stolen() {
        let (_temp, target) = fixture();
        let lock_path = format!("{target}.lock");
        std::fs::write(&lock_path, "").unwrap();

        // Back-date the lockfile past the staleness window.
        let stale = SystemTime::now() - Duration::from_secs(120);
        let file = std::fs::OpenOptions::new().write(true).open(&lock_path).unwrap();
        file.set_modified(stale).unwrap();

        let _lock = FileLock::acquire(&target).await.unwrap();
    }
}

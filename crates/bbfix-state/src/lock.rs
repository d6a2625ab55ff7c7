//! Process-global advisory lock over the state directory.

use bbfix_api::Error;
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Holds the lock for as long as it lives; `Drop` always releases it, so a
/// panic mid-apply can never leak it.
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    pub fn acquire(lock_path: &Path) -> Result<Self, Error> {
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::state_io(format!("failed to create state dir: {e}")))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(lock_path)
            .map_err(|e| Error::state_io(format!("failed to open lock file: {e}")))?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                file,
                path: lock_path.to_path_buf(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(Error::lock_busy(
                "another bb fix process is already running",
            )),
            Err(e) => Err(Error::state_io(format!("failed to acquire lock: {e}"))),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_first_held() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("lock");
        let _first = LockGuard::acquire(&lock_path).unwrap();
        let second = LockGuard::acquire(&lock_path);
        assert!(second.is_err());
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("lock");
        {
            let _guard = LockGuard::acquire(&lock_path).unwrap();
        }
        let second = LockGuard::acquire(&lock_path);
        assert!(second.is_ok());
    }
}

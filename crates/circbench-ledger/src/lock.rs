//! Single-writer guard for a ledger directory.
//!
//! An exclusive advisory lock (`fd-lock`) is taken on `ledger.lock` and held
//! for as long as the [`LedgerLock`] lives. The OS drops the lock when the
//! descriptor closes, so a crashed campaign never leaves a stale lock behind.

use chrono::Utc;
use circbench_utils::error::LedgerError;
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const LOCK_FILE: &str = "ledger.lock";

/// Written into the lock file so a blocked second writer can say who holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub acquired_at: String,
}

pub struct LedgerLock {
    path: PathBuf,
    _fd_lock: RwLock<File>,
}

impl LedgerLock {
    /// Take the exclusive lock for `dir`, failing immediately with
    /// [`LedgerError::Locked`] if another writer holds it.
    pub fn acquire(dir: &Path) -> Result<Self, LedgerError> {
        let path = dir.join(LOCK_FILE);
        let io_err = |source| LedgerError::Io {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io_err)?;

        let mut fd_lock = RwLock::new(file);
        match fd_lock.try_write() {
            Ok(guard) => {
                let info = LockInfo {
                    pid: std::process::id(),
                    acquired_at: Utc::now().to_rfc3339(),
                };
                let json = serde_json::to_string(&info)
                    .map_err(|e| io_err(std::io::Error::other(e)))?;
                let mut file_ref = &*guard;
                file_ref.set_len(0).map_err(io_err)?;
                file_ref.write_all(json.as_bytes()).map_err(io_err)?;
                file_ref.sync_all().map_err(io_err)?;
                // Dropping the guard would unlock; the lock must outlive this
                // call and is released when `_fd_lock` closes the descriptor.
                std::mem::forget(guard);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                match read_lock_info(&path) {
                    Some(holder) => warn!(
                        pid = holder.pid,
                        since = %holder.acquired_at,
                        "Ledger {} is locked by another process",
                        dir.display()
                    ),
                    None => warn!("Ledger {} is locked by another process", dir.display()),
                }
                return Err(LedgerError::Locked {
                    path: dir.to_path_buf(),
                });
            }
            Err(e) => return Err(io_err(e)),
        }

        debug!(path = %path.display(), "Acquired ledger lock");
        Ok(Self {
            path,
            _fd_lock: fd_lock,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for LedgerLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerLock")
            .field("path", &self.path)
            .field("_fd_lock", &"<RwLock>")
            .finish()
    }
}

/// Holder information from an existing lock file, if readable.
#[must_use]
pub fn read_lock_info(path: &Path) -> Option<LockInfo> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_writer_is_rejected() {
        let dir = TempDir::new().unwrap();
        let first = LedgerLock::acquire(dir.path()).unwrap();
        let second = LedgerLock::acquire(dir.path());
        assert!(matches!(second, Err(LedgerError::Locked { .. })));

        let info = read_lock_info(first.path()).unwrap();
        assert_eq!(info.pid, std::process::id());
    }

    #[test]
    fn test_lock_is_released_on_drop() {
        let dir = TempDir::new().unwrap();
        let first = LedgerLock::acquire(dir.path()).unwrap();
        drop(first);
        LedgerLock::acquire(dir.path()).unwrap();
    }
}

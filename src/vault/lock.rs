//! Advisory lock on a vault file.
//!
//! The lock lives on a sibling `.<vault>.lock` file rather than the
//! vault itself, because saves replace the vault file by rename. Readers
//! share the lock; a save holds it exclusively for the whole
//! read-modify-write.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::errors::{CredVaultError, Result};

/// How often a contended lock is retried.
const RETRY_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockMode {
    Shared,
    Exclusive,
}

/// A held lock, released on drop.
#[derive(Debug)]
pub struct VaultLock {
    file: File,
}

impl VaultLock {
    /// Take a shared (read) lock, waiting up to `timeout`.
    pub fn shared(vault_path: &Path, timeout: Duration) -> Result<Self> {
        Self::acquire(vault_path, timeout, LockMode::Shared)
    }

    /// Take an exclusive (write) lock, waiting up to `timeout`.
    pub fn exclusive(vault_path: &Path, timeout: Duration) -> Result<Self> {
        Self::acquire(vault_path, timeout, LockMode::Exclusive)
    }

    fn acquire(vault_path: &Path, timeout: Duration, mode: LockMode) -> Result<Self> {
        let file = open_lock_file(&lock_path(vault_path))?;
        let deadline = Instant::now() + timeout;

        loop {
            // Fully qualified: std's inherent `File::try_lock_*` would
            // shadow the fs2 trait methods on newer toolchains.
            let attempt = match mode {
                LockMode::Shared => FileExt::try_lock_shared(&file),
                LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
            };

            match attempt {
                Ok(()) => {
                    tracing::debug!(path = %vault_path.display(), ?mode, "vault lock acquired");
                    return Ok(Self { file });
                }
                Err(e) if is_contended(&e) => {
                    if Instant::now() >= deadline {
                        return Err(CredVaultError::VaultLocked(vault_path.to_path_buf()));
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for VaultLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// `<dir>/.<file name>.lock` next to the vault.
pub fn lock_path(vault_path: &Path) -> PathBuf {
    let parent = vault_path.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        ".{}.lock",
        vault_path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == fs2::lock_contended_error().kind() || e.kind() == io::ErrorKind::WouldBlock
}

fn open_lock_file(path: &Path) -> Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    Ok(options.open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SHORT: Duration = Duration::from_millis(150);

    #[test]
    fn lock_file_sits_next_to_vault() {
        let path = Path::new("/data/vault.csv.gpg");
        assert_eq!(lock_path(path), PathBuf::from("/data/.vault.csv.gpg.lock"));
    }

    #[test]
    fn exclusive_lock_excludes_others() {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().join("v.gpg");

        let held = VaultLock::exclusive(&vault, SHORT).unwrap();
        let err = VaultLock::exclusive(&vault, SHORT).unwrap_err();
        assert!(matches!(err, CredVaultError::VaultLocked(_)));
        assert!(VaultLock::shared(&vault, SHORT).is_err());

        drop(held);
        assert!(VaultLock::exclusive(&vault, SHORT).is_ok());
    }

    #[test]
    fn shared_locks_coexist() {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().join("v.gpg");

        let _a = VaultLock::shared(&vault, SHORT).unwrap();
        let _b = VaultLock::shared(&vault, SHORT).unwrap();
        assert!(VaultLock::exclusive(&vault, SHORT).is_err());
    }
}

//! High-level vault operations used by CLI commands.
//!
//! `VaultStore` owns the encrypted file on disk. It never keeps the
//! decrypted table around: each call decrypts, does its work, and lets
//! the zeroizing buffers wipe the plaintext on return.
//!
//! Saves are whole-file rewrites. The new blob is written to a temp file
//! in the vault's directory and renamed over the vault only once it is
//! complete, so a failed encrypt or a crash leaves the old vault intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::EncryptionProvider;
use crate::errors::{CredVaultError, Result};

use super::locator::{self, RecordGroup};
use super::lock::VaultLock;
use super::record::{self, Record};

/// Default wait for a contended vault lock.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// The main vault handle.
pub struct VaultStore<P> {
    /// Path to the encrypted vault file.
    path: PathBuf,

    /// Identity the provider encrypts for.
    recipient: String,

    /// Group given to rows stored without one.
    default_group: String,

    lock_timeout: Duration,

    provider: P,
}

impl<P: EncryptionProvider> VaultStore<P> {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// A store for `path` with an empty recipient and group "Default".
    pub fn new(path: impl Into<PathBuf>, provider: P) -> Self {
        Self {
            path: path.into(),
            recipient: String::new(),
            default_group: "Default".to_string(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            provider,
        }
    }

    /// A store configured from `settings`.
    pub fn from_settings(settings: &Settings, provider: P) -> Self {
        Self::new(settings.vault_path(), provider)
            .with_recipient(&settings.recipient)
            .with_default_group(&settings.default_group)
            .with_lock_timeout(settings.lock_timeout())
    }

    pub fn with_recipient(mut self, recipient: &str) -> Self {
        self.recipient = recipient.to_string();
        self
    }

    pub fn with_default_group(mut self, group: &str) -> Self {
        self.default_group = group.to_string();
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Create the vault file holding an encrypted empty table.
    ///
    /// Creates missing parent directories. Fails if the file exists.
    pub fn create(&self) -> Result<()> {
        if self.path.exists() {
            return Err(CredVaultError::VaultAlreadyExists(self.path.clone()));
        }
        fs::create_dir_all(self.dir())?;

        let _lock = VaultLock::exclusive(&self.path, self.lock_timeout)?;
        // Re-check under the lock in case another process won the race.
        if self.path.exists() {
            return Err(CredVaultError::VaultAlreadyExists(self.path.clone()));
        }

        let blob = self.provider.encrypt(b"", &self.recipient)?;
        self.commit(&blob)?;
        tracing::info!(path = %self.path.display(), "vault created");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Decrypt the whole vault and return the plaintext table.
    pub fn read_plaintext(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.ensure_exists()?;
        let _lock = VaultLock::shared(&self.path, self.lock_timeout)?;
        self.read_plaintext_locked()
    }

    /// Decrypt and decode every record, in store order.
    pub fn read_records(&self) -> Result<Vec<Record>> {
        let plaintext = self.read_plaintext()?;
        record::decode_table(&plaintext, &self.default_group)
    }

    /// The first record whose name starts with `query` (case-insensitive).
    pub fn find_by_name(&self, query: &str) -> Result<Option<Record>> {
        let records = self.read_records()?;
        Ok(locator::find_by_name(&records, query).cloned())
    }

    /// Like `find_by_name`, but a miss is `RecordNotFound`.
    pub fn get(&self, query: &str) -> Result<Record> {
        self.find_by_name(query)?
            .ok_or_else(|| CredVaultError::RecordNotFound(query.to_string()))
    }

    /// Records filtered by group prefix, in adjacency-grouped runs.
    pub fn list_by_group(&self, filter: &str) -> Result<Vec<RecordGroup>> {
        let records = self.read_records()?;
        Ok(locator::list_by_group(&records, filter))
    }

    // ------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------

    /// Append `new_record` to the vault and re-encrypt it.
    ///
    /// The existing plaintext is kept byte for byte; the encoded row goes
    /// after it. Returns the number of records now in the vault.
    pub fn append_and_save(&self, new_record: &Record) -> Result<usize> {
        if new_record.name.trim().is_empty() {
            return Err(CredVaultError::malformed(0, "record name is empty"));
        }

        self.ensure_exists()?;
        let _lock = VaultLock::exclusive(&self.path, self.lock_timeout)?;

        let existing = self.read_plaintext_locked()?;
        // Refuse to extend a table we could not load.
        let count = record::decode_table(&existing, &self.default_group)?.len();

        let row = record::encode_row(new_record)?;
        let mut combined = Zeroizing::new(Vec::with_capacity(existing.len() + row.len() + 1));
        combined.extend_from_slice(&existing);
        if !existing.is_empty() && !existing.ends_with(b"\n") {
            combined.push(b'\n');
        }
        combined.extend_from_slice(&row);

        let blob = self.provider.encrypt(&combined, &self.recipient)?;
        self.commit(&blob)?;

        tracing::info!(path = %self.path.display(), records = count + 1, "vault saved");
        Ok(count + 1)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the path to the vault file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the vault file is present.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Returns the group used for records without one.
    pub fn default_group(&self) -> &str {
        &self.default_group
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    fn ensure_exists(&self) -> Result<()> {
        if self.exists() {
            Ok(())
        } else {
            Err(CredVaultError::VaultUnreadable(format!(
                "{} does not exist, run `credvault init` first",
                self.path.display()
            )))
        }
    }

    /// Decrypt the vault file. The caller holds the lock.
    fn read_plaintext_locked(&self) -> Result<Zeroizing<Vec<u8>>> {
        let ciphertext = fs::read(&self.path).map_err(|e| {
            CredVaultError::VaultUnreadable(format!("{}: {e}", self.path.display()))
        })?;
        self.provider.decrypt(&ciphertext)
    }

    /// Atomically replace the vault file with `blob`.
    fn commit(&self, blob: &[u8]) -> Result<()> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".credvault-")
            .suffix(".tmp")
            .tempfile_in(self.dir())?;

        tmp.write_all(blob)?;
        tmp.as_file().sync_all()?;

        // On error the temp file is removed when `tmp` drops.
        tmp.persist(&self.path).map_err(|e| CredVaultError::Io(e.error))?;
        sync_dir(self.dir())?;
        Ok(())
    }
}

/// Flush the directory entry so a completed rename survives power loss.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

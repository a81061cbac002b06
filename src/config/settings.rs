use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::Argon2Params;
use crate::errors::{CredVaultError, Result};

/// Which `EncryptionProvider` protects the vault file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Shell out to an external tool (gpg by default).
    Command,
    /// Built-in AES-256-GCM with an Argon2id-derived passphrase key.
    Passphrase,
}

/// User configuration, loaded from `config.toml`.
///
/// Every field has a default so CredVault runs without any config file;
/// only `recipient` needs setting for the gpg provider to encrypt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the encrypted vault file. A leading `~/` is expanded.
    #[serde(default = "default_vault_path")]
    pub vault_path: String,

    /// Encryption target identity handed to the provider (gpg key id).
    #[serde(default)]
    pub recipient: String,

    /// Group assigned to records saved or loaded without one.
    #[serde(default = "default_group")]
    pub default_group: String,

    /// Argv of the delivery sink. Empty means the system clipboard.
    #[serde(default)]
    pub sink_command: Vec<String>,

    #[serde(default = "default_provider")]
    pub provider: ProviderKind,

    /// Argv reading ciphertext on stdin and writing plaintext to stdout.
    #[serde(default = "default_decrypt_command")]
    pub decrypt_command: Vec<String>,

    /// Argv reading plaintext on stdin and writing ciphertext to stdout.
    /// `{recipient}` is replaced by `recipient`.
    #[serde(default = "default_encrypt_command")]
    pub encrypt_command: Vec<String>,

    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    #[serde(default = "default_sink_timeout_secs")]
    pub sink_timeout_secs: u64,

    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,

    /// Argon2 memory cost in KiB for the passphrase provider (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_path() -> String {
    "~/.credvault/vault.csv.gpg".to_string()
}

fn default_group() -> String {
    "Default".to_string()
}

fn default_provider() -> ProviderKind {
    ProviderKind::Command
}

fn default_decrypt_command() -> Vec<String> {
    ["gpg", "--batch", "--quiet", "--decrypt"]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn default_encrypt_command() -> Vec<String> {
    [
        "gpg",
        "--batch",
        "--yes",
        "--armor",
        "--encrypt",
        "--recipient",
        "{recipient}",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn default_provider_timeout_secs() -> u64 {
    120
}

fn default_sink_timeout_secs() -> u64 {
    10
}

fn default_lock_timeout_secs() -> u64 {
    10
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_path: default_vault_path(),
            recipient: String::new(),
            default_group: default_group(),
            sink_command: Vec::new(),
            provider: default_provider(),
            decrypt_command: default_decrypt_command(),
            encrypt_command: default_encrypt_command(),
            provider_timeout_secs: default_provider_timeout_secs(),
            sink_timeout_secs: default_sink_timeout_secs(),
            lock_timeout_secs: default_lock_timeout_secs(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Settings {
    /// Name of the config file inside the config directory.
    const FILE_NAME: &'static str = "config.toml";

    /// Default config location: `<config_dir>/credvault/config.toml`.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("credvault").join(Self::FILE_NAME))
    }

    /// Load settings from `path`, or from the default location if `None`.
    ///
    /// A missing file yields defaults. A file that exists but cannot be
    /// parsed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;
        Self::from_toml(&contents).map_err(|e| match e {
            CredVaultError::ConfigError(msg) => CredVaultError::ConfigError(format!(
                "Failed to parse {}: {msg}",
                config_path.display()
            )),
            other => other,
        })
    }

    /// Parse settings from TOML text and validate them.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(contents).map_err(|e| CredVaultError::ConfigError(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.vault_path.trim().is_empty() {
            return Err(CredVaultError::ConfigError(
                "vault_path cannot be empty".into(),
            ));
        }
        if self.default_group.is_empty() {
            return Err(CredVaultError::ConfigError(
                "default_group cannot be empty".into(),
            ));
        }
        if self.provider == ProviderKind::Command
            && (self.decrypt_command.is_empty() || self.encrypt_command.is_empty())
        {
            return Err(CredVaultError::ConfigError(
                "decrypt_command and encrypt_command must name a program".into(),
            ));
        }
        Ok(())
    }

    /// The vault path with a leading `~/` expanded to the home directory.
    pub fn vault_path(&self) -> PathBuf {
        expand_home(&self.vault_path)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn sink_timeout(&self) -> Duration {
        Duration::from_secs(self.sink_timeout_secs)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

// ── Tests ────────────────────────────────────────────────────────────

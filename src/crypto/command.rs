//! External-tool provider (gpg by default).
//!
//! The ciphertext or plaintext is written to the tool's stdin and the
//! result read from its stdout. Diagnostics on stderr never reach the
//! data path; a nonzero exit is a failure.

use std::time::Duration;

use zeroize::Zeroizing;

use super::EncryptionProvider;
use crate::config::Settings;
use crate::errors::{CredVaultError, Result};
use crate::process;

/// Placeholder in `encrypt_command` replaced by the recipient identity.
pub const RECIPIENT_PLACEHOLDER: &str = "{recipient}";

/// Runs configured commands to decrypt and encrypt the vault blob.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    decrypt_command: Vec<String>,
    encrypt_command: Vec<String>,
    timeout: Duration,
}

impl CommandProvider {
    pub fn new(decrypt_command: Vec<String>, encrypt_command: Vec<String>, timeout: Duration) -> Self {
        Self {
            decrypt_command,
            encrypt_command,
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.decrypt_command.clone(),
            settings.encrypt_command.clone(),
            settings.provider_timeout(),
        )
    }

    /// The encrypt argv with every `{recipient}` placeholder filled in.
    fn encrypt_argv(&self, recipient: &str) -> Vec<String> {
        self.encrypt_command
            .iter()
            .map(|arg| arg.replace(RECIPIENT_PLACEHOLDER, recipient))
            .collect()
    }
}

impl EncryptionProvider for CommandProvider {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let output = process::run(&self.decrypt_command, ciphertext, self.timeout)
            .map_err(|e| CredVaultError::VaultUnreadable(e.to_string()))?;
        Ok(output.stdout)
    }

    fn encrypt(&self, plaintext: &[u8], recipient: &str) -> Result<Vec<u8>> {
        let needs_recipient = self
            .encrypt_command
            .iter()
            .any(|arg| arg.contains(RECIPIENT_PLACEHOLDER));
        if needs_recipient && recipient.trim().is_empty() {
            return Err(CredVaultError::EncryptionFailed(
                "no recipient configured, set `recipient` in the config file".into(),
            ));
        }

        let output = process::run(&self.encrypt_argv(recipient), plaintext, self.timeout)
            .map_err(|e| CredVaultError::EncryptionFailed(e.to_string()))?;

        if output.stdout.is_empty() && !plaintext.is_empty() {
            return Err(CredVaultError::EncryptionFailed(
                "encryption command produced no output".into(),
            ));
        }
        Ok(output.stdout.to_vec())
    }
}

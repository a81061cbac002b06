//! CLI module: Clap argument parser, output helpers, the record editor,
//! and command implementations.

pub mod commands;
pub mod editor;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::{ProviderKind, Settings};
use crate::crypto::{CommandProvider, EncryptionProvider, PassphraseProvider};
use crate::errors::{CredVaultError, Result};
use crate::vault::VaultStore;

/// Minimum passphrase length for new passphrase vaults.
const MIN_PASSPHRASE_LEN: usize = 8;

/// Environment variable consulted before prompting for a passphrase.
const PASSPHRASE_ENV: &str = "CREDVAULT_PASSPHRASE";

/// The store type every command works with.
pub type Store = VaultStore<Box<dyn EncryptionProvider>>;

/// CredVault CLI: local encrypted credential vault.
#[derive(Parser)]
#[command(
    name = "credvault",
    about = "Local encrypted credential vault",
    version
)]
pub struct Cli {
    /// Defaults to `get` with an empty name (the first record).
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (default: <config dir>/credvault/config.toml)
    #[arg(long, env = "CREDVAULT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Vault file, overriding `vault_path` from the config
    #[arg(long, env = "CREDVAULT_VAULT", global = true)]
    pub vault: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Find the first record whose name starts with NAME and deliver its secrets
    #[command(visible_alias = "g")]
    Get {
        /// Name prefix (several words are joined with spaces)
        name: Vec<String>,
    },

    /// Enter a new record and append it to the vault
    #[command(visible_alias = "s")]
    Save {
        /// Name to pre-fill (several words are joined with spaces)
        name: Vec<String>,
    },

    /// List records grouped by group, optionally filtered by group prefix
    #[command(visible_alias = "l")]
    List {
        /// Group prefix (several words are joined with spaces)
        group: Vec<String>,
    },

    /// Create a new, empty vault
    Init,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load settings from `--config` (or the default location) and apply
/// `--vault`.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(vault) = &cli.vault {
        settings.vault_path = vault.to_string_lossy().into_owned();
    }
    Ok(settings)
}

/// Build the provider named in `settings`.
///
/// For the passphrase provider this prompts; `new_vault` asks for the
/// passphrase twice and enforces the minimum length.
pub fn build_provider(settings: &Settings, new_vault: bool) -> Result<Box<dyn EncryptionProvider>> {
    match settings.provider {
        ProviderKind::Command => Ok(Box::new(CommandProvider::from_settings(settings))),
        ProviderKind::Passphrase => {
            let passphrase = if new_vault {
                prompt_new_passphrase()?
            } else {
                prompt_passphrase()?
            };
            Ok(Box::new(PassphraseProvider::new(
                passphrase,
                settings.argon2_params(),
            )))
        }
    }
}

/// Settings plus a store for an existing vault.
///
/// A missing vault is reported before any passphrase prompt.
pub fn open_store(cli: &Cli) -> Result<(Settings, Store)> {
    let settings = load_settings(cli)?;
    let path = settings.vault_path();
    if !path.is_file() {
        output::tip("Run `credvault init` to create a vault.");
        return Err(CredVaultError::VaultUnreadable(format!(
            "{} does not exist",
            path.display()
        )));
    }
    let provider = build_provider(&settings, false)?;
    let store = VaultStore::from_settings(&settings, provider);
    Ok((settings, store))
}

/// Join trailing word arguments the way a shell user typed them.
pub fn join_words(words: &[String]) -> String {
    words.join(" ")
}

/// Get the vault passphrase from `CREDVAULT_PASSPHRASE` or a hidden prompt.
///
/// Returns `Zeroizing<String>` so the passphrase is wiped from memory on drop.
pub fn prompt_passphrase() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSPHRASE_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Vault passphrase")
        .interact()
        .map_err(|e| CredVaultError::CommandFailed(format!("passphrase prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new passphrase with confirmation (used by `init`).
///
/// Also respects `CREDVAULT_PASSPHRASE` for scripted use.
pub fn prompt_new_passphrase() -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSPHRASE_ENV) {
        if !pw.is_empty() {
            if pw.chars().count() < MIN_PASSPHRASE_LEN {
                return Err(CredVaultError::CommandFailed(format!(
                    "passphrase must be at least {MIN_PASSPHRASE_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(pw));
        }
    }

    loop {
        let pw = dialoguer::Password::new()
            .with_prompt("Choose vault passphrase")
            .with_confirmation(
                "Confirm vault passphrase",
                "Passphrases do not match, try again",
            )
            .interact()
            .map_err(|e| CredVaultError::CommandFailed(format!("passphrase prompt: {e}")))?;

        if pw.chars().count() < MIN_PASSPHRASE_LEN {
            output::warning(&format!(
                "Passphrase must be at least {MIN_PASSPHRASE_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(pw));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_joined_with_spaces() {
        let words = vec!["my".to_string(), "bank".to_string()];
        assert_eq!(join_words(&words), "my bank");
        assert_eq!(join_words(&[]), "");
    }

    #[test]
    fn bare_invocation_has_no_subcommand() {
        let cli = Cli::try_parse_from(["credvault"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn aliases_map_to_commands() {
        let cli = Cli::try_parse_from(["credvault", "g", "git", "hub"]).unwrap();
        match cli.command {
            Some(Commands::Get { name }) => assert_eq!(join_words(&name), "git hub"),
            _ => panic!("expected get"),
        }

        let cli = Cli::try_parse_from(["credvault", "l"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::List { ref group }) if group.is_empty()));

        let cli = Cli::try_parse_from(["credvault", "s", "mail"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Save { .. })));
    }

    #[test]
    fn vault_flag_overrides_config() {
        let cli = Cli::try_parse_from([
            "credvault",
            "--config",
            "/nonexistent/credvault.toml",
            "--vault",
            "/tmp/other.gpg",
            "list",
        ])
        .unwrap();
        let settings = load_settings(&cli).unwrap();
        assert_eq!(settings.vault_path(), PathBuf::from("/tmp/other.gpg"));
    }
}

//! `credvault init`: create a new, empty vault.

use crate::cli::{build_provider, load_settings, output, Cli};
use crate::errors::{CredVaultError, Result};
use crate::vault::VaultStore;

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let path = settings.vault_path();

    // Check before prompting for a passphrase.
    if path.exists() {
        output::tip("Use `credvault save` to add records to the existing vault.");
        return Err(CredVaultError::VaultAlreadyExists(path));
    }

    let provider = build_provider(&settings, true)?;
    let store = VaultStore::from_settings(&settings, provider);
    store.create()?;

    output::success(&format!("Vault created at {}", store.path().display()));
    output::tip("Run `credvault save <NAME>` to add your first record.");
    Ok(())
}

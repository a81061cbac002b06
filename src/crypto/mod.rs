//! Encryption providers for the vault blob.
//!
//! The vault engine never encrypts anything itself. It hands whole
//! plaintext tables to an `EncryptionProvider` and stores whatever opaque
//! blob comes back. This module provides:
//! - the `EncryptionProvider` trait
//! - `CommandProvider`, which shells out to an external tool such as gpg (`command`)
//! - `PassphraseProvider`, AES-256-GCM keyed by Argon2id (`passphrase`,
//!   built on `encryption` and `kdf`)

pub mod command;
pub mod encryption;
pub mod kdf;
pub mod passphrase;

use zeroize::Zeroizing;

use crate::errors::Result;

pub use command::CommandProvider;
pub use kdf::Argon2Params;
pub use passphrase::PassphraseProvider;

/// Turns a vault blob into plaintext and back.
///
/// Implementations report a failed decrypt as `VaultUnreadable` and a
/// failed encrypt as `EncryptionFailed`.
pub trait EncryptionProvider {
    /// Decrypt a complete vault blob.
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// Encrypt a complete plaintext table for `recipient`.
    fn encrypt(&self, plaintext: &[u8], recipient: &str) -> Result<Vec<u8>>;
}

impl<P: EncryptionProvider + ?Sized> EncryptionProvider for Box<P> {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        (**self).decrypt(ciphertext)
    }

    fn encrypt(&self, plaintext: &[u8], recipient: &str) -> Result<Vec<u8>> {
        (**self).encrypt(plaintext, recipient)
    }
}

//! Built-in passphrase provider.
//!
//! A blob produced by this provider has this layout:
//!
//! ```text
//! [CVLT: 4 bytes][version: 1 byte][m: u32 LE][t: u32 LE][p: u32 LE][salt: 32 bytes][nonce: 12 bytes][ciphertext + tag]
//! ```
//!
//! The Argon2 costs are read back from the blob on decrypt, so changing
//! them in the config only affects the next save. The recipient is
//! ignored: whoever knows the passphrase can open the vault.

use zeroize::Zeroizing;

use super::encryption::{self, NONCE_LEN};
use super::kdf::{derive_key, generate_salt, Argon2Params, SALT_LEN};
use super::EncryptionProvider;
use crate::errors::{CredVaultError, Result};

/// Magic bytes at the start of every passphrase blob.
const MAGIC: &[u8; 4] = b"CVLT";

/// Current blob format version.
pub const CURRENT_VERSION: u8 = 1;

/// Fixed-size prefix: 4 (magic) + 1 (version) + 12 (params) + salt.
const PREFIX_LEN: usize = 4 + 1 + 12 + SALT_LEN;

/// Encrypts the vault with a key derived from a passphrase.
pub struct PassphraseProvider {
    passphrase: Zeroizing<String>,
    params: Argon2Params,
}

impl PassphraseProvider {
    /// `params` are used for new blobs; existing blobs carry their own.
    pub fn new(passphrase: Zeroizing<String>, params: Argon2Params) -> Self {
        Self { passphrase, params }
    }
}

impl EncryptionProvider for PassphraseProvider {
    fn decrypt(&self, blob: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let unreadable = |why: &str| CredVaultError::VaultUnreadable(why.to_string());

        if blob.len() < PREFIX_LEN + NONCE_LEN {
            return Err(unreadable("file too small to be a passphrase vault"));
        }
        if &blob[0..4] != MAGIC {
            return Err(unreadable(
                "missing CVLT magic bytes, is this a gpg vault? check `provider`",
            ));
        }
        if blob[4] != CURRENT_VERSION {
            return Err(CredVaultError::VaultUnreadable(format!(
                "unsupported version {}, expected {CURRENT_VERSION}",
                blob[4]
            )));
        }

        let params = Argon2Params {
            memory_kib: read_u32(&blob[5..9]),
            iterations: read_u32(&blob[9..13]),
            parallelism: read_u32(&blob[13..17]),
        };
        params.validate().map_err(|e| {
            CredVaultError::VaultUnreadable(format!("corrupt passphrase header: {e}"))
        })?;
        let salt = &blob[17..PREFIX_LEN];

        let key = derive_key(self.passphrase.as_bytes(), salt, &params)?;
        encryption::decrypt(&key[..], &blob[PREFIX_LEN..])
    }

    fn encrypt(&self, plaintext: &[u8], _recipient: &str) -> Result<Vec<u8>> {
        let salt = generate_salt();
        let key = derive_key(self.passphrase.as_bytes(), &salt, &self.params)?;
        let sealed = encryption::encrypt(&key[..], plaintext)?;

        let mut blob = Vec::with_capacity(PREFIX_LEN + sealed.len());
        blob.extend_from_slice(MAGIC);
        blob.push(CURRENT_VERSION);
        blob.extend_from_slice(&self.params.memory_kib.to_le_bytes());
        blob.extend_from_slice(&self.params.iterations.to_le_bytes());
        blob.extend_from_slice(&self.params.parallelism.to_le_bytes());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&sealed);
        Ok(blob)
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

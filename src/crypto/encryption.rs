//! AES-256-GCM authenticated encryption.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  `decrypt` splits the nonce back out
//! before decrypting.
//!
//! Layout of the returned byte buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use crate::errors::{CredVaultError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Encrypt `plaintext` with a 32-byte `key`.
///
/// Returns the nonce prepended to the ciphertext (nonce || ciphertext).
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CredVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CredVaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data that was produced by `encrypt`.
///
/// Any failure (short input, wrong key, tampering) is reported as
/// `VaultUnreadable` without further detail.
pub fn decrypt(key: &[u8], ciphertext_with_nonce: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let unreadable =
        || CredVaultError::VaultUnreadable("wrong passphrase or corrupted vault".into());

    if ciphertext_with_nonce.len() < NONCE_LEN {
        return Err(unreadable());
    }

    let (nonce_bytes, ciphertext) = ciphertext_with_nonce.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| unreadable())?;

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| unreadable())?;

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = [0xABu8; 32];
        let plaintext = "github,alice,pw1,Dev,\n".as_bytes();

        let ciphertext = encrypt(&key, plaintext).unwrap();
        // 12-byte nonce + 16-byte tag.
        assert_eq!(ciphertext.len(), plaintext.len() + NONCE_LEN + 16);

        let recovered = decrypt(&key, &ciphertext).unwrap();
        assert_eq!(recovered.as_slice(), plaintext);
    }

    #[test]
    fn nonce_differs_per_call() {
        let key = [0xCDu8; 32];
        let ct1 = encrypt(&key, b"same").unwrap();
        let ct2 = encrypt(&key, b"same").unwrap();
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn wrong_key_and_truncation_fail() {
        let ciphertext = encrypt(&[0x11u8; 32], b"secret").unwrap();
        assert!(decrypt(&[0x22u8; 32], &ciphertext).is_err());
        assert!(decrypt(&[0x11u8; 32], &ciphertext[..5]).is_err());
    }
}

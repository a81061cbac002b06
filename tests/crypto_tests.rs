//! Integration tests for the CredVault crypto module.

use credvault::crypto::encryption::{decrypt, encrypt, NONCE_LEN};
use credvault::crypto::kdf::{derive_key, generate_salt, Argon2Params, KEY_LEN};
use credvault::crypto::{EncryptionProvider, PassphraseProvider};
use credvault::errors::CredVaultError;
use zeroize::Zeroizing;

const FAST: Argon2Params = Argon2Params {
    memory_kib: 8_192,
    iterations: 1,
    parallelism: 1,
};

// ---------------------------------------------------------------------------
// AES-256-GCM
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = [0xABu8; 32];
    let plaintext = b"github,alice,pw1,Dev,\n";

    let ciphertext = encrypt(&key, plaintext).expect("encrypt should succeed");
    // 12-byte nonce + 16-byte tag.
    assert_eq!(ciphertext.len(), plaintext.len() + NONCE_LEN + 16);

    let recovered = decrypt(&key, &ciphertext).expect("decrypt should succeed");
    assert_eq!(recovered.as_slice(), plaintext);
}

#[test]
fn encrypt_produces_different_ciphertext_each_time() {
    let key = [0xCDu8; 32];
    let ct1 = encrypt(&key, b"same").unwrap();
    let ct2 = encrypt(&key, b"same").unwrap();
    assert_ne!(ct1, ct2, "fresh nonce per call");
}

#[test]
fn tampered_ciphertext_is_unreadable() {
    let key = [0x11u8; 32];
    let mut ct = encrypt(&key, b"payload").unwrap();
    let last = ct.len() - 1;
    ct[last] ^= 0x01;

    assert!(matches!(
        decrypt(&key, &ct),
        Err(CredVaultError::VaultUnreadable(_))
    ));
}

#[test]
fn truncated_ciphertext_is_unreadable() {
    let key = [0x11u8; 32];
    assert!(decrypt(&key, &[0u8; 5]).is_err());
}

// ---------------------------------------------------------------------------
// Key derivation
// ---------------------------------------------------------------------------

#[test]
fn derivation_is_deterministic_per_salt() {
    let salt = generate_salt();
    let k1 = derive_key(b"passphrase", &salt, &FAST).unwrap();
    let k2 = derive_key(b"passphrase", &salt, &FAST).unwrap();
    assert_eq!(k1.len(), KEY_LEN);
    assert_eq!(*k1, *k2);

    let other = derive_key(b"passphrase", &generate_salt(), &FAST).unwrap();
    assert_ne!(*k1, *other);
}

#[test]
fn weak_params_are_rejected() {
    let weak = Argon2Params {
        memory_kib: 1_024,
        ..FAST
    };
    assert!(matches!(
        derive_key(b"pw", &generate_salt(), &weak),
        Err(CredVaultError::KeyDerivationFailed(_))
    ));
}

// ---------------------------------------------------------------------------
// Passphrase provider
// ---------------------------------------------------------------------------

fn provider(pw: &str) -> PassphraseProvider {
    PassphraseProvider::new(Zeroizing::new(pw.to_string()), FAST)
}

#[test]
fn provider_roundtrip_ignores_recipient() {
    let blob = provider("hunter2-hunter2")
        .encrypt(b"a,b,c,d,e\n", "someone@example.com")
        .unwrap();
    let plain = provider("hunter2-hunter2").decrypt(&blob).unwrap();
    assert_eq!(plain.as_slice(), b"a,b,c,d,e\n");
}

#[test]
fn provider_rejects_foreign_blobs() {
    let err = provider("hunter2-hunter2")
        .decrypt(b"-----BEGIN PGP MESSAGE-----\n\nhQEMA...\n-----END PGP MESSAGE-----\n")
        .unwrap_err();
    assert!(matches!(err, CredVaultError::VaultUnreadable(_)));
}

#[test]
fn empty_table_encrypts_to_a_valid_blob() {
    let blob = provider("hunter2-hunter2").encrypt(b"", "").unwrap();
    assert!(provider("hunter2-hunter2").decrypt(&blob).unwrap().is_empty());
}

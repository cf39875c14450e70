//! Secret-based encryption of validator private keys.
//!
//! Blob layout: `[ salt: 16B ][ nonce: 12B ][ ciphertext + tag ]`.
//! The AEAD key is derived as SHA-256(salt || secret). Administrators
//! provision the encrypted blobs out of band; the consensus engine only
//! ever sees the secret at proposal time.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// Errors that can occur in the keystore.
///
/// Decryption deliberately collapses every failure mode (wrong secret,
/// truncated blob, corrupt ciphertext) into one opaque variant so callers
/// never see cryptographic diagnostics.
#[derive(Debug, Error)]
pub enum KeystoreError {
    #[error("failed to encrypt private key")]
    EncryptionFailed,
    #[error("failed to decrypt validator's private key")]
    DecryptionFailed,
}

fn derive_key(salt: &[u8], secret: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(secret.as_bytes());
    hasher.finalize().into()
}

/// Encrypt a 32-byte private key under a secret.
pub fn encrypt_private_key(private_key: &[u8; 32], secret: &str) -> Result<Vec<u8>, KeystoreError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let key = derive_key(&salt, secret);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), private_key.as_slice())
        .map_err(|_| KeystoreError::EncryptionFailed)?;

    let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a private-key blob with a secret.
pub fn decrypt_private_key(blob: &[u8], secret: &str) -> Result<[u8; 32], KeystoreError> {
    if blob.len() < SALT_LEN + NONCE_LEN {
        return Err(KeystoreError::DecryptionFailed);
    }
    let (salt, rest) = blob.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(salt, secret);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| KeystoreError::DecryptionFailed)?;

    plaintext
        .try_into()
        .map_err(|_| KeystoreError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let kp = Keypair::generate();
        let private_key = kp.private_key();

        let blob = encrypt_private_key(&private_key, "unlock-secret").unwrap();
        let decrypted = decrypt_private_key(&blob, "unlock-secret").unwrap();
        assert_eq!(private_key, decrypted);
    }

    #[test]
    fn test_wrong_secret_fails() {
        let kp = Keypair::generate();
        let blob = encrypt_private_key(&kp.private_key(), "correct").unwrap();

        assert!(matches!(
            decrypt_private_key(&blob, "wrong"),
            Err(KeystoreError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_tampered_blob_fails() {
        let kp = Keypair::generate();
        let mut blob = encrypt_private_key(&kp.private_key(), "secret").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xFF;

        assert!(decrypt_private_key(&blob, "secret").is_err());
    }

    #[test]
    fn test_truncated_blob_fails() {
        assert!(matches!(
            decrypt_private_key(&[0u8; 8], "secret"),
            Err(KeystoreError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_blobs_are_salted() {
        let kp = Keypair::generate();
        let blob1 = encrypt_private_key(&kp.private_key(), "secret").unwrap();
        let blob2 = encrypt_private_key(&kp.private_key(), "secret").unwrap();
        assert_ne!(blob1, blob2);
    }
}

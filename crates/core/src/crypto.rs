//! Reversible encryption for contact fields at rest.
//!
//! AES-256-GCM with a SHA-256-derived key and a random 12-byte nonce
//! prepended to the ciphertext; output is base64 so it fits TEXT columns.
//! Empty input passes through unchanged in both directions so optional
//! fields never produce phantom ciphertext.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;
const TAG_SIZE: usize = 16;

/// Minimum accepted passphrase length. Anything shorter is treated as a
/// deployment mistake and rejected at startup.
const MIN_KEY_CHARS: usize = 16;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption key is empty")]
    EmptyKey,
    #[error("encryption key must be at least {MIN_KEY_CHARS} characters")]
    WeakKey,
    #[error("encryption failed: {0}")]
    Encrypt(String),
    #[error("decryption failed: {0}")]
    Decrypt(String),
}

/// Symmetric cipher for email/phone columns. Built once at bootstrap from
/// the configured passphrase; an invalid passphrase fails the process before
/// it accepts traffic.
#[derive(Clone)]
pub struct FieldCipher {
    key: [u8; KEY_SIZE],
}

impl FieldCipher {
    pub fn new(passphrase: &SecretString) -> Result<Self, CryptoError> {
        let raw = passphrase.expose_secret();
        if raw.is_empty() {
            return Err(CryptoError::EmptyKey);
        }
        if raw.chars().count() < MIN_KEY_CHARS {
            return Err(CryptoError::WeakKey);
        }

        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        let digest = hasher.finalize();
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&digest);
        Ok(Self { key })
    }

    /// Encrypt a contact field. Returns base64 `nonce || ciphertext || tag`;
    /// empty input returns an empty string.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|error| CryptoError::Encrypt(error.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|error| CryptoError::Encrypt(error.to_string()))?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        Ok(base64::engine::general_purpose::STANDARD.encode(&combined))
    }

    /// Decrypt base64 `nonce || ciphertext || tag`; empty input returns an
    /// empty string.
    pub fn decrypt(&self, encrypted: &str) -> Result<String, CryptoError> {
        if encrypted.is_empty() {
            return Ok(String::new());
        }

        let combined = base64::engine::general_purpose::STANDARD
            .decode(encrypted)
            .map_err(|error| CryptoError::Decrypt(format!("base64 decode failed: {error}")))?;

        if combined.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::Decrypt("ciphertext too short".to_string()));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|error| CryptoError::Decrypt(error.to_string()))?;

        let nonce = Nonce::from_slice(&combined[..NONCE_SIZE]);
        let plaintext = cipher
            .decrypt(nonce, &combined[NONCE_SIZE..])
            .map_err(|error| CryptoError::Decrypt(error.to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|error| CryptoError::Decrypt(format!("utf-8 decode failed: {error}")))
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

/// Reduce a contact value to `ab***yz` for log output. Values of four
/// characters or fewer are fully masked.
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars.len() <= 4 {
        return "***".to_string();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}***{tail}")
}

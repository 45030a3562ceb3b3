//! Symmetric session encryption for XML encryption.
//!
//! Ciphertext layout is `nonce (12 bytes) || ciphertext+tag`, matching the
//! usual AES-GCM framing.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Nonce};

use crate::random::random_bytes;
use crate::signature::CryptoError;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// AES-GCM nonce size in bytes.
const NONCE_SIZE: usize = 12;

/// Supported session-encryption algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AeadAlgorithm {
    /// AES-128-GCM.
    Aes128Gcm,
    /// AES-192-GCM.
    Aes192Gcm,
    /// AES-256-GCM.
    #[default]
    Aes256Gcm,
}

impl AeadAlgorithm {
    /// Returns the key length in bytes.
    #[must_use]
    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes128Gcm => 16,
            Self::Aes192Gcm => 24,
            Self::Aes256Gcm => 32,
        }
    }

    /// Generates a fresh random key of the right length.
    #[must_use]
    pub fn generate_key(self) -> Vec<u8> {
        random_bytes(self.key_len())
    }
}

/// Encrypts plaintext, returning `nonce || ciphertext`.
pub fn encrypt(
    algorithm: AeadAlgorithm,
    key: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if key.len() != algorithm.key_len() {
        return Err(CryptoError::InvalidKey(format!(
            "session key must be {} bytes, got {}",
            algorithm.key_len(),
            key.len()
        )));
    }

    let nonce_bytes = random_bytes(NONCE_SIZE);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = match algorithm {
        AeadAlgorithm::Aes128Gcm => Aes128Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?
            .encrypt(nonce, plaintext),
        AeadAlgorithm::Aes192Gcm => Aes192Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?
            .encrypt(nonce, plaintext),
        AeadAlgorithm::Aes256Gcm => Aes256Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?
            .encrypt(nonce, plaintext),
    }
    .map_err(|e| CryptoError::Cipher(format!("encryption failed: {e}")))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypts `nonce || ciphertext` data.
pub fn decrypt(
    algorithm: AeadAlgorithm,
    key: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if key.len() != algorithm.key_len() {
        return Err(CryptoError::InvalidKey(format!(
            "session key must be {} bytes, got {}",
            algorithm.key_len(),
            key.len()
        )));
    }
    if data.len() < NONCE_SIZE {
        return Err(CryptoError::Malformed(
            "ciphertext shorter than nonce".to_string(),
        ));
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    match algorithm {
        AeadAlgorithm::Aes128Gcm => Aes128Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?
            .decrypt(nonce, ciphertext),
        AeadAlgorithm::Aes192Gcm => Aes192Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?
            .decrypt(nonce, ciphertext),
        AeadAlgorithm::Aes256Gcm => Aes256Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?
            .decrypt(nonce, ciphertext),
    }
    .map_err(|e| CryptoError::Cipher(format!("decryption failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip_all_sizes() {
        for algorithm in [
            AeadAlgorithm::Aes128Gcm,
            AeadAlgorithm::Aes192Gcm,
            AeadAlgorithm::Aes256Gcm,
        ] {
            let key = algorithm.generate_key();
            assert_eq!(key.len(), algorithm.key_len());

            let ciphertext = encrypt(algorithm, &key, b"session payload").unwrap();
            let plaintext = decrypt(algorithm, &key, &ciphertext).unwrap();
            assert_eq!(plaintext, b"session payload");
        }
    }

    #[test]
    fn decrypt_with_wrong_key_fails() {
        let algorithm = AeadAlgorithm::Aes256Gcm;
        let ciphertext = encrypt(algorithm, &algorithm.generate_key(), b"payload").unwrap();
        assert!(decrypt(algorithm, &algorithm.generate_key(), &ciphertext).is_err());
    }

    #[test]
    fn wrong_key_length_is_rejected() {
        assert!(encrypt(AeadAlgorithm::Aes256Gcm, &[0u8; 16], b"payload").is_err());
    }

    #[test]
    fn truncated_ciphertext_is_rejected() {
        let key = AeadAlgorithm::Aes256Gcm.generate_key();
        assert!(decrypt(AeadAlgorithm::Aes256Gcm, &key, &[0u8; 4]).is_err());
    }
}

//! Asymmetric key material.
//!
//! SAML signing keys come in exactly two families: RSA and DSA. Both sides
//! of the trust relationship handle keys through these enums so binding and
//! validation code never needs to know which backend crate is in play.

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::signature::CryptoError;

/// The key family of an asymmetric key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// RSA key.
    Rsa,
    /// DSA key.
    Dsa,
}

impl KeyType {
    /// Returns the display name of the key family.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rsa => "RSA",
            Self::Dsa => "DSA",
        }
    }
}

/// A private signing key.
#[derive(Debug, Clone)]
pub enum SigningKey {
    /// RSA private key.
    Rsa(Box<RsaPrivateKey>),
    /// DSA private key.
    Dsa(Box<dsa::SigningKey>),
}

impl SigningKey {
    /// Returns the key family.
    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        match self {
            Self::Rsa(_) => KeyType::Rsa,
            Self::Dsa(_) => KeyType::Dsa,
        }
    }

    /// Parses a PKCS#8 PEM private key, trying RSA first and DSA second.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, CryptoError> {
        if let Ok(key) = RsaPrivateKey::from_pkcs8_pem(pem) {
            return Ok(Self::Rsa(Box::new(key)));
        }
        dsa::SigningKey::from_pkcs8_pem(pem)
            .map(|key| Self::Dsa(Box::new(key)))
            .map_err(|e| CryptoError::InvalidKey(format!("not an RSA or DSA PKCS#8 key: {e}")))
    }

    /// Parses a PKCS#8 DER private key, trying RSA first and DSA second.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, CryptoError> {
        if let Ok(key) = RsaPrivateKey::from_pkcs8_der(der) {
            return Ok(Self::Rsa(Box::new(key)));
        }
        dsa::SigningKey::from_pkcs8_der(der)
            .map(|key| Self::Dsa(Box::new(key)))
            .map_err(|e| CryptoError::InvalidKey(format!("not an RSA or DSA PKCS#8 key: {e}")))
    }

    /// Derives the matching verification key.
    #[must_use]
    pub fn verification_key(&self) -> VerificationKey {
        match self {
            Self::Rsa(key) => VerificationKey::Rsa(Box::new(RsaPublicKey::from(key.as_ref()))),
            Self::Dsa(key) => VerificationKey::Dsa(Box::new(key.verifying_key().clone())),
        }
    }
}

/// A public verification key.
#[derive(Debug, Clone)]
pub enum VerificationKey {
    /// RSA public key.
    Rsa(Box<RsaPublicKey>),
    /// DSA public key.
    Dsa(Box<dsa::VerifyingKey>),
}

impl VerificationKey {
    /// Returns the key family.
    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        match self {
            Self::Rsa(_) => KeyType::Rsa,
            Self::Dsa(_) => KeyType::Dsa,
        }
    }

    /// Parses a `SubjectPublicKeyInfo` DER blob, trying RSA first and DSA
    /// second. This is the shape found inside X.509 certificates.
    pub fn from_spki_der(der: &[u8]) -> Result<Self, CryptoError> {
        if let Ok(key) = RsaPublicKey::from_public_key_der(der) {
            return Ok(Self::Rsa(Box::new(key)));
        }
        dsa::VerifyingKey::from_public_key_der(der)
            .map(|key| Self::Dsa(Box::new(key)))
            .map_err(|e| CryptoError::InvalidKey(format!("not an RSA or DSA public key: {e}")))
    }

    /// Parses a `SubjectPublicKeyInfo` PEM blob.
    pub fn from_spki_pem(pem: &str) -> Result<Self, CryptoError> {
        if let Ok(key) = RsaPublicKey::from_public_key_pem(pem) {
            return Ok(Self::Rsa(Box::new(key)));
        }
        dsa::VerifyingKey::from_public_key_pem(pem)
            .map(|key| Self::Dsa(Box::new(key)))
            .map_err(|e| CryptoError::InvalidKey(format!("not an RSA or DSA public key: {e}")))
    }
}

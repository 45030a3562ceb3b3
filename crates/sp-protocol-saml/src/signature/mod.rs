//! XML signature support.
//!
//! Covers the closed algorithm set SAML deployments actually use: RSA over
//! SHA-1/SHA-256/SHA-512 and DSA over SHA-1. The same algorithms serve
//! both embedded XML-DSig signatures and the detached query-string
//! signatures of the redirect binding.

mod signer;
mod trust;
mod validator;

pub use signer::*;
pub use trust::*;
pub use validator::*;

use sp_crypto::{KeyType, RsaHash};

use crate::error::{SamlError, SamlResult};
use crate::types::{digest_algorithms, signature_algorithms};

/// Hash algorithm selection for the trust service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// SHA-1.
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
}

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    /// RSA with SHA-1 (legacy interoperability).
    RsaSha1,
    /// RSA with SHA-256 (recommended).
    #[default]
    RsaSha256,
    /// RSA with SHA-512.
    RsaSha512,
    /// DSA with SHA-1. DSA has no other hash in XML-DSig.
    DsaSha1,
}

impl SignatureAlgorithm {
    /// Returns the URI for this signature algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha1 => signature_algorithms::RSA_SHA1,
            Self::RsaSha256 => signature_algorithms::RSA_SHA256,
            Self::RsaSha512 => signature_algorithms::RSA_SHA512,
            Self::DsaSha1 => signature_algorithms::DSA_SHA1,
        }
    }

    /// Returns the corresponding digest algorithm URI.
    #[must_use]
    pub const fn digest_uri(&self) -> &'static str {
        match self {
            Self::RsaSha1 | Self::DsaSha1 => digest_algorithms::SHA1,
            Self::RsaSha256 => digest_algorithms::SHA256,
            Self::RsaSha512 => digest_algorithms::SHA512,
        }
    }

    /// Parses a signature algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            signature_algorithms::RSA_SHA1 => Some(Self::RsaSha1),
            signature_algorithms::RSA_SHA256 => Some(Self::RsaSha256),
            signature_algorithms::RSA_SHA512 => Some(Self::RsaSha512),
            signature_algorithms::DSA_SHA1 => Some(Self::DsaSha1),
            _ => None,
        }
    }

    /// Selects the algorithm for a key family and hash.
    ///
    /// DSA is pinned to SHA-1; any other combination is a caller error.
    pub fn for_key(key_type: KeyType, hash: HashAlgorithm) -> SamlResult<Self> {
        match (key_type, hash) {
            (KeyType::Rsa, HashAlgorithm::Sha1) => Ok(Self::RsaSha1),
            (KeyType::Rsa, HashAlgorithm::Sha256) => Ok(Self::RsaSha256),
            (KeyType::Rsa, HashAlgorithm::Sha512) => Ok(Self::RsaSha512),
            (KeyType::Dsa, HashAlgorithm::Sha1) => Ok(Self::DsaSha1),
            (KeyType::Dsa, _) => Err(SamlError::UnsupportedAlgorithm(
                "DSA signatures are defined over SHA-1 only".to_string(),
            )),
        }
    }

    /// Returns the default algorithm for a key family.
    #[must_use]
    pub const fn default_for(key_type: KeyType) -> Self {
        match key_type {
            KeyType::Rsa => Self::RsaSha256,
            KeyType::Dsa => Self::DsaSha1,
        }
    }

    /// Returns true if this algorithm uses RSA.
    #[must_use]
    pub const fn is_rsa(&self) -> bool {
        matches!(self, Self::RsaSha1 | Self::RsaSha256 | Self::RsaSha512)
    }

    /// Returns true if this algorithm uses DSA.
    #[must_use]
    pub const fn is_dsa(&self) -> bool {
        matches!(self, Self::DsaSha1)
    }

    /// Returns the key family this algorithm belongs to.
    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        if self.is_rsa() {
            KeyType::Rsa
        } else {
            KeyType::Dsa
        }
    }

    /// Returns the RSA hash selection, if this is an RSA algorithm.
    #[must_use]
    pub const fn rsa_hash(&self) -> Option<RsaHash> {
        match self {
            Self::RsaSha1 => Some(RsaHash::Sha1),
            Self::RsaSha256 => Some(RsaHash::Sha256),
            Self::RsaSha512 => Some(RsaHash::Sha512),
            Self::DsaSha1 => None,
        }
    }

    /// Computes the digest this algorithm's references use.
    #[must_use]
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::RsaSha1 | Self::DsaSha1 => sp_crypto::sha1(data),
            Self::RsaSha256 => sp_crypto::sha256(data),
            Self::RsaSha512 => sp_crypto::sha512(data),
        }
    }
}

/// Parsed `<ds:Signature>` contents.
#[derive(Debug, Clone)]
pub struct XmlSignature {
    /// The signature algorithm used.
    pub algorithm: SignatureAlgorithm,
    /// The reference URI (the ID of the signed element, with `#` prefix).
    pub reference_uri: String,
    /// The digest value (base64).
    pub digest_value: String,
    /// The signature value (base64).
    pub signature_value: String,
    /// The embedded X.509 certificate (base64 DER), if any.
    pub x509_certificate: Option<String>,
}

/// Configuration for signature creation.
#[derive(Debug, Clone, Default)]
pub struct SignatureConfig {
    /// The signature algorithm to use.
    pub algorithm: SignatureAlgorithm,
    /// An X.509 certificate (DER) to embed in the KeyInfo, if any.
    pub certificate_der: Option<Vec<u8>>,
}

impl SignatureConfig {
    /// Creates a configuration with the given algorithm.
    #[must_use]
    pub const fn with_algorithm(algorithm: SignatureAlgorithm) -> Self {
        Self {
            algorithm,
            certificate_der: None,
        }
    }
}

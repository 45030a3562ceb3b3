//! # sp-crypto
//!
//! Cryptographic operations for the saml-sp workspace.
//!
//! SAML 2.0 interoperability pins the algorithm set to what deployed
//! identity providers actually emit: RSA PKCS#1 v1.5 signatures over
//! SHA-1/SHA-256/SHA-512, DSA over SHA-1, RSA key transport (PKCS#1 v1.5
//! and OAEP), and AES-GCM session encryption.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod hash;
pub mod keys;
pub mod keywrap;
pub mod random;
pub mod signature;
pub mod symmetric;

pub use hash::{sha1, sha256, sha512};
pub use keys::{KeyType, SigningKey, VerificationKey};
pub use keywrap::KeyTransport;
pub use random::{random_alphanumeric, random_bytes, secure_id};
pub use signature::{CryptoError, RsaHash};
pub use symmetric::AeadAlgorithm;

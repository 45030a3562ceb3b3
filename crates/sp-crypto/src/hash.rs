//! Digest functions used by XML-DSig digest references.

use sha1::{Digest, Sha1};
use sha2::{Sha256, Sha512};

/// Computes a SHA-1 digest.
///
/// SHA-1 is retained solely for SAML interoperability with identity
/// providers that still sign with RSA-SHA1 or DSA-SHA1.
#[must_use]
pub fn sha1(data: &[u8]) -> Vec<u8> {
    Sha1::digest(data).to_vec()
}

/// Computes a SHA-256 digest.
#[must_use]
pub fn sha256(data: &[u8]) -> Vec<u8> {
    Sha256::digest(data).to_vec()
}

/// Computes a SHA-512 digest.
#[must_use]
pub fn sha512(data: &[u8]) -> Vec<u8> {
    Sha512::digest(data).to_vec()
}

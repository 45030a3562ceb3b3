//! The signature trust service.
//!
//! One sign/verify surface across both key families. Outbound signing and
//! inbound verification go through the same algorithm selection, so the
//! rules (DSA pinned to SHA-1, RSA hash selectable) live in exactly one
//! place.

use base64::Engine;
use sp_crypto::{signature as raw, SigningKey, VerificationKey};

use super::SignatureAlgorithm;
use crate::error::{SamlError, SamlResult};

/// Signs data with the given key and algorithm.
///
/// The key family must match the algorithm family; a mismatch is a caller
/// error, not a verification failure.
pub fn sign_data(
    key: &SigningKey,
    algorithm: SignatureAlgorithm,
    data: &[u8],
) -> SamlResult<Vec<u8>> {
    match (key, algorithm.rsa_hash()) {
        (SigningKey::Rsa(key), Some(hash)) => Ok(raw::rsa_sign(key, data, hash)?),
        (SigningKey::Dsa(key), None) => Ok(raw::dsa_sign_sha1(key, data)?),
        _ => Err(key_mismatch(key.key_type(), algorithm)),
    }
}

/// Verifies a signature with the given key and algorithm.
///
/// Returns `Ok(false)` when the signature does not match; errors are
/// reserved for unusable input or key/algorithm mismatches.
pub fn verify_signature(
    key: &VerificationKey,
    algorithm: SignatureAlgorithm,
    data: &[u8],
    signature: &[u8],
) -> SamlResult<bool> {
    match (key, algorithm.rsa_hash()) {
        (VerificationKey::Rsa(key), Some(hash)) => Ok(raw::rsa_verify(key, data, signature, hash)?),
        (VerificationKey::Dsa(key), None) => Ok(raw::dsa_verify_sha1(key, data, signature)?),
        _ => Err(key_mismatch(key.key_type(), algorithm)),
    }
}

fn key_mismatch(key_type: sp_crypto::KeyType, algorithm: SignatureAlgorithm) -> SamlError {
    SamlError::InvalidArgument(format!(
        "{} key cannot be used with {}",
        key_type.name(),
        algorithm.uri()
    ))
}

/// Extracts the verification key from an X.509 certificate in DER form.
pub fn verification_key_from_certificate_der(der: &[u8]) -> SamlResult<VerificationKey> {
    use x509_parser::prelude::*;

    let (_, certificate) = X509Certificate::from_der(der)
        .map_err(|e| SamlError::Crypto(format!("failed to parse certificate: {e}")))?;

    Ok(VerificationKey::from_spki_der(certificate.public_key().raw)?)
}

/// Extracts the verification key from a PEM-encoded X.509 certificate.
pub fn verification_key_from_certificate_pem(pem: &str) -> SamlResult<VerificationKey> {
    let der = pem_to_der(pem, "CERTIFICATE")
        .ok_or_else(|| SamlError::Crypto("invalid certificate PEM".to_string()))?;
    verification_key_from_certificate_der(&der)
}

/// Extracts DER data from a PEM block with the given label.
pub(crate) fn pem_to_der(pem: &str, label: &str) -> Option<Vec<u8>> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");

    let start = pem.find(&begin)? + begin.len();
    let end_pos = pem.find(&end)?;

    let b64: String = pem[start..end_pos]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    base64::engine::general_purpose::STANDARD.decode(&b64).ok()
}

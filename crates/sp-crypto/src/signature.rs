//! Raw signature primitives for the SAML trust service.
//!
//! RSA signatures are PKCS#1 v1.5 over a caller-selected hash; DSA is
//! pinned to SHA-1 as XML-DSig defines it. DSA signature values use the
//! `r || s` wire form required by XML-DSig, not ASN.1 DER, so the helpers
//! here convert between the two encodings.

use rsa::pkcs1v15::{
    Signature as RsaSignature, SigningKey as RsaSigningKey, VerifyingKey as RsaVerifyingKey,
};
use rsa::signature::{DigestSigner, DigestVerifier, SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use sha2::{Sha256, Sha512};
use thiserror::Error;

/// Error type for cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key material could not be parsed or has the wrong family.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Encryption or decryption failed.
    #[error("cipher operation failed: {0}")]
    Cipher(String),

    /// Malformed signature or ciphertext input.
    #[error("malformed cryptographic input: {0}")]
    Malformed(String),
}

/// Hash selection for RSA PKCS#1 v1.5 signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsaHash {
    /// SHA-1 (legacy interoperability only).
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
}

/// Signs data with RSA PKCS#1 v1.5.
pub fn rsa_sign(key: &RsaPrivateKey, data: &[u8], hash: RsaHash) -> Result<Vec<u8>, CryptoError> {
    let signature = match hash {
        RsaHash::Sha1 => RsaSigningKey::<Sha1>::new(key.clone()).sign(data).to_vec(),
        RsaHash::Sha256 => RsaSigningKey::<Sha256>::new(key.clone()).sign(data).to_vec(),
        RsaHash::Sha512 => RsaSigningKey::<Sha512>::new(key.clone()).sign(data).to_vec(),
    };
    Ok(signature)
}

/// Verifies an RSA PKCS#1 v1.5 signature.
///
/// Returns `Ok(false)` for a well-formed but non-matching signature and an
/// error only when the signature bytes are structurally unusable.
pub fn rsa_verify(
    key: &RsaPublicKey,
    data: &[u8],
    signature: &[u8],
    hash: RsaHash,
) -> Result<bool, CryptoError> {
    let signature = RsaSignature::try_from(signature)
        .map_err(|e| CryptoError::Malformed(format!("RSA signature: {e}")))?;

    let valid = match hash {
        RsaHash::Sha1 => RsaVerifyingKey::<Sha1>::new(key.clone())
            .verify(data, &signature)
            .is_ok(),
        RsaHash::Sha256 => RsaVerifyingKey::<Sha256>::new(key.clone())
            .verify(data, &signature)
            .is_ok(),
        RsaHash::Sha512 => RsaVerifyingKey::<Sha512>::new(key.clone())
            .verify(data, &signature)
            .is_ok(),
    };
    Ok(valid)
}

/// Signs data with DSA over SHA-1, producing the `r || s` wire form.
pub fn dsa_sign_sha1(key: &dsa::SigningKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let signature: dsa::Signature = key
        .try_sign_digest(Sha1::new_with_prefix(data))
        .map_err(|e| CryptoError::Signing(format!("DSA signing failed: {e}")))?;

    let (r, s) = der_decode_components(&signature.to_vec())?;
    let width = r.len().max(s.len()).max(20);

    let mut out = vec![0u8; width * 2];
    write_padded(&mut out[..width], &r);
    write_padded(&mut out[width..], &s);
    Ok(out)
}

/// Verifies a DSA-SHA1 signature in the `r || s` wire form.
pub fn dsa_verify_sha1(
    key: &dsa::VerifyingKey,
    data: &[u8],
    signature: &[u8],
) -> Result<bool, CryptoError> {
    if signature.is_empty() || signature.len() % 2 != 0 {
        return Err(CryptoError::Malformed(
            "DSA signature must be an even number of bytes".to_string(),
        ));
    }

    let half = signature.len() / 2;
    let der = der_encode_components(&signature[..half], &signature[half..]);
    let signature = dsa::Signature::try_from(der.as_slice())
        .map_err(|e| CryptoError::Malformed(format!("DSA signature: {e}")))?;

    Ok(key
        .verify_digest(Sha1::new_with_prefix(data), &signature)
        .is_ok())
}

/// Left-pads a big-endian integer into a fixed-width buffer.
fn write_padded(out: &mut [u8], bytes: &[u8]) {
    let offset = out.len().saturating_sub(bytes.len());
    let src = if bytes.len() > out.len() {
        &bytes[bytes.len() - out.len()..]
    } else {
        bytes
    };
    out[offset..].copy_from_slice(src);
}

/// Encodes `SEQUENCE { INTEGER r, INTEGER s }` from raw big-endian values.
fn der_encode_components(r: &[u8], s: &[u8]) -> Vec<u8> {
    let r = der_integer(r);
    let s = der_integer(s);

    let mut out = vec![0x30];
    push_der_len(&mut out, r.len() + s.len());
    out.extend_from_slice(&r);
    out.extend_from_slice(&s);
    out
}

fn der_integer(value: &[u8]) -> Vec<u8> {
    let mut v = value;
    while v.len() > 1 && v[0] == 0 {
        v = &v[1..];
    }
    // An empty value degenerates to the single zero octet.
    let v: &[u8] = if v.is_empty() { &[0] } else { v };

    let needs_pad = v[0] & 0x80 != 0;
    let mut out = vec![0x02];
    push_der_len(&mut out, v.len() + usize::from(needs_pad));
    if needs_pad {
        out.push(0x00);
    }
    out.extend_from_slice(v);
    out
}

fn push_der_len(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
    } else if len <= 0xFF {
        out.push(0x81);
        out.push(len as u8);
    } else {
        out.push(0x82);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    }
}

/// Decodes `SEQUENCE { INTEGER r, INTEGER s }` into raw big-endian values.
fn der_decode_components(der: &[u8]) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
    let mut pos = 0;
    expect_tag(der, &mut pos, 0x30)?;
    let _seq_len = read_der_len(der, &mut pos)?;

    let r = read_der_integer(der, &mut pos)?;
    let s = read_der_integer(der, &mut pos)?;
    Ok((r, s))
}

fn expect_tag(bytes: &[u8], pos: &mut usize, tag: u8) -> Result<(), CryptoError> {
    match bytes.get(*pos) {
        Some(&b) if b == tag => {
            *pos += 1;
            Ok(())
        }
        _ => Err(CryptoError::Malformed(format!(
            "expected DER tag 0x{tag:02x}"
        ))),
    }
}

fn read_der_len(bytes: &[u8], pos: &mut usize) -> Result<usize, CryptoError> {
    let first = *bytes
        .get(*pos)
        .ok_or_else(|| CryptoError::Malformed("truncated DER length".to_string()))?;
    *pos += 1;

    if first < 0x80 {
        return Ok(first as usize);
    }
    let count = (first & 0x7F) as usize;
    if count == 0 || count > 2 {
        return Err(CryptoError::Malformed("unsupported DER length".to_string()));
    }
    let mut len = 0usize;
    for _ in 0..count {
        let b = *bytes
            .get(*pos)
            .ok_or_else(|| CryptoError::Malformed("truncated DER length".to_string()))?;
        *pos += 1;
        len = (len << 8) | b as usize;
    }
    Ok(len)
}

fn read_der_integer(bytes: &[u8], pos: &mut usize) -> Result<Vec<u8>, CryptoError> {
    expect_tag(bytes, pos, 0x02)?;
    let len = read_der_len(bytes, pos)?;
    let end = pos
        .checked_add(len)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| CryptoError::Malformed("truncated DER integer".to_string()))?;

    let mut value = &bytes[*pos..end];
    *pos = end;
    while value.len() > 1 && value[0] == 0 {
        value = &value[1..];
    }
    Ok(value.to_vec())
}

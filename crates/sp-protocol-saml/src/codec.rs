//! Message codec for the HTTP-Redirect binding.
//!
//! SAML redirect payloads are raw DEFLATE (no zlib or gzip framing)
//! wrapped in base64 and then percent-encoded. Some identity providers
//! reject lowercase hex in percent escapes, so outbound encoding forces
//! the escapes to uppercase.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use crate::error::{SamlError, SamlResult};

/// Compresses text with raw DEFLATE and base64-encodes the result.
pub fn compress(text: &str) -> SamlResult<String> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(text.as_bytes())
        .map_err(|e| SamlError::Deflate(format!("compression error: {e}")))?;
    let compressed = encoder
        .finish()
        .map_err(|e| SamlError::Deflate(format!("compression finish error: {e}")))?;
    Ok(BASE64.encode(compressed))
}

/// Decodes base64 and inflates the raw DEFLATE stream back to text.
///
/// Empty input is rejected: an absent payload and a present-but-empty
/// payload are both protocol violations, not empty messages.
pub fn decompress(encoded: &str) -> SamlResult<String> {
    if encoded.is_empty() {
        return Err(SamlError::Deflate("empty deflate payload".to_string()));
    }

    let compressed = BASE64
        .decode(encoded)
        .map_err(|e| SamlError::Base64Decode(e.to_string()))?;

    let mut decoder = DeflateDecoder::new(compressed.as_slice());
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(|e| SamlError::Deflate(format!("decompression error: {e}")))?;

    String::from_utf8(inflated)
        .map_err(|e| SamlError::Deflate(format!("decompressed payload is not UTF-8: {e}")))
}

/// Forces the hex digits of `%XY` escapes to uppercase.
///
/// Octets outside escapes are left untouched.
#[must_use]
pub fn uppercase_percent_encoding(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            out.push(b'%');
            out.push(bytes[i + 1].to_ascii_uppercase());
            out.push(bytes[i + 2].to_ascii_uppercase());
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    // Only ASCII octets are rewritten, so the result stays valid UTF-8.
    String::from_utf8(out).expect("uppercasing escapes preserves UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compress_decompress_roundtrip() {
        for text in [
            "a",
            "short",
            "<samlp:AuthnRequest ID=\"_1\"><saml:Issuer>https://sp.example.com</saml:Issuer></samlp:AuthnRequest>",
            "unicode: \u{00e9}\u{4e16}\u{754c}",
        ] {
            let packed = compress(text).unwrap();
            assert_eq!(decompress(&packed).unwrap(), text);
        }
    }

    #[test]
    fn compressed_output_has_no_zlib_header() {
        let packed = compress("some message body").unwrap();
        let raw = BASE64.decode(packed).unwrap();
        // zlib streams start with 0x78; raw deflate of this input does not.
        assert_ne!(raw[0], 0x78);
    }

    #[test]
    fn decompress_rejects_empty_input() {
        let err = decompress("").unwrap_err();
        assert!(matches!(err, SamlError::Deflate(_)));
    }

    #[test]
    fn decompress_rejects_invalid_base64() {
        let err = decompress("not base64 at all!!!").unwrap_err();
        assert!(matches!(err, SamlError::Base64Decode(_)));
    }

    #[test]
    fn decompress_rejects_corrupt_stream() {
        let corrupt = BASE64.encode([0xFFu8, 0x00, 0x13, 0x37]);
        let err = decompress(&corrupt).unwrap_err();
        assert!(matches!(err, SamlError::Deflate(_)));
    }

    #[test]
    fn uppercase_escapes() {
        assert_eq!(
            uppercase_percent_encoding("a%2fb%3Dc%aa"),
            "a%2Fb%3Dc%AA"
        );
        assert_eq!(uppercase_percent_encoding("no escapes"), "no escapes");
        // Truncated escape at the end is passed through unchanged.
        assert_eq!(uppercase_percent_encoding("x%2"), "x%2");
    }
}

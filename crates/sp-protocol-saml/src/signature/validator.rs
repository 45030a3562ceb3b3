//! Enveloped XML signature validation.
//!
//! Validation tries each configured trust key in order and reports which
//! one verified the document; assertion validation records that key on the
//! assertion.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sp_crypto::VerificationKey;
use tracing::debug;

use super::signer::{build_signed_info, canonicalize};
use super::{verify_signature, SignatureAlgorithm, XmlSignature};
use crate::error::{SamlError, SamlResult};
use crate::xml::{extract_element_by_id, remove_signature_element};

/// XML signature validator over a set of candidate trust keys.
pub struct XmlSignatureValidator {
    trust_keys: Vec<VerificationKey>,
}

impl XmlSignatureValidator {
    /// Creates a validator with the given trust keys.
    #[must_use]
    pub fn new(trust_keys: Vec<VerificationKey>) -> Self {
        Self { trust_keys }
    }

    /// Returns the configured trust keys.
    #[must_use]
    pub fn trust_keys(&self) -> &[VerificationKey] {
        &self.trust_keys
    }

    /// Validates the enveloped signature of a document.
    ///
    /// Returns the parsed signature and the index of the trust key that
    /// verified it.
    pub fn validate(&self, xml: &str) -> SamlResult<(XmlSignature, usize)> {
        let signature = extract_signature(xml)?;

        self.verify_digest(xml, &signature)?;

        let signed_info = build_signed_info(
            signature.reference_uri.trim_start_matches('#'),
            &signature.digest_value,
            signature.algorithm,
        );
        let canonical_signed_info = canonicalize(&signed_info);

        let signature_bytes = BASE64
            .decode(&signature.signature_value)
            .map_err(|e| SamlError::SignatureInvalid(format!("signature encoding: {e}")))?;

        for (index, key) in self.trust_keys.iter().enumerate() {
            if key.key_type() != signature.algorithm.key_type() {
                continue;
            }
            match verify_signature(
                key,
                signature.algorithm,
                canonical_signed_info.as_bytes(),
                &signature_bytes,
            ) {
                Ok(true) => {
                    debug!(key_index = index, "XML signature verified");
                    return Ok((signature, index));
                }
                Ok(false) => {}
                Err(e) => debug!(key_index = index, error = %e, "trust key unusable"),
            }
        }

        Err(SamlError::SignatureInvalid(
            "signature could not be verified with any trusted key".to_string(),
        ))
    }

    /// Verifies the digest reference against the document content.
    fn verify_digest(&self, xml: &str, signature: &XmlSignature) -> SamlResult<()> {
        let reference_id = signature.reference_uri.trim_start_matches('#');

        let element = extract_element_by_id(xml, reference_id).ok_or_else(|| {
            SamlError::SignatureInvalid(format!("referenced element '{reference_id}' not found"))
        })?;

        let canonical = canonicalize(&remove_signature_element(&element));
        let digest = signature.algorithm.digest(canonical.as_bytes());

        if BASE64.encode(digest) != signature.digest_value {
            return Err(SamlError::SignatureInvalid("digest mismatch".to_string()));
        }
        Ok(())
    }
}

/// Extracts signature information from a signed document.
fn extract_signature(xml: &str) -> SamlResult<XmlSignature> {
    if !xml.contains("<ds:Signature") && !xml.contains("<Signature") {
        return Err(SamlError::SignatureMissing(
            "no Signature element found".to_string(),
        ));
    }

    let algorithm = extract_attribute(xml, "SignatureMethod", "Algorithm")
        .and_then(|uri| SignatureAlgorithm::from_uri(&uri))
        .ok_or_else(|| {
            SamlError::SignatureInvalid("unknown or missing signature algorithm".to_string())
        })?;

    let reference_uri = extract_attribute(xml, "Reference", "URI")
        .ok_or_else(|| SamlError::SignatureInvalid("no Reference URI found".to_string()))?;

    let digest_value = extract_element_content(xml, "DigestValue")
        .ok_or_else(|| SamlError::SignatureInvalid("no DigestValue found".to_string()))?;

    let signature_value = extract_element_content(xml, "SignatureValue")
        .ok_or_else(|| SamlError::SignatureInvalid("no SignatureValue found".to_string()))?;

    Ok(XmlSignature {
        algorithm,
        reference_uri,
        digest_value: strip_whitespace(&digest_value),
        signature_value: strip_whitespace(&signature_value),
        x509_certificate: extract_element_content(xml, "X509Certificate")
            .map(|c| strip_whitespace(&c)),
    })
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Extracts an attribute value from the first occurrence of an element.
fn extract_attribute(xml: &str, element: &str, attribute: &str) -> Option<String> {
    for pattern in [format!("<ds:{element}"), format!("<{element}")] {
        if let Some(pos) = xml.find(&pattern) {
            let end = xml[pos..].find('>')?;
            let element_str = &xml[pos..pos + end];

            let attr_pattern = format!("{attribute}=\"");
            if let Some(attr_start) = element_str.find(&attr_pattern) {
                let value_start = attr_start + attr_pattern.len();
                let value_end = element_str[value_start..].find('"')?;
                return Some(element_str[value_start..value_start + value_end].to_string());
            }
        }
    }
    None
}

/// Extracts the text content of the first occurrence of an element.
fn extract_element_content(xml: &str, element: &str) -> Option<String> {
    for (open, close) in [
        (format!("<ds:{element}>"), format!("</ds:{element}>")),
        (format!("<{element}>"), format!("</{element}>")),
    ] {
        if let Some(start) = xml.find(&open) {
            let content_start = start + open.len();
            if let Some(end) = xml[content_start..].find(&close) {
                return Some(xml[content_start..content_start + end].to_string());
            }
        }
    }
    None
}

//! Enveloped XML signature creation.
//!
//! SAML places the signature as the sibling immediately following the
//! Issuer element; several IdP stacks reject any other position, so the
//! insertion point is protocol-significant.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sp_crypto::SigningKey;

use super::{sign_data, SignatureAlgorithm, SignatureConfig};
use crate::error::{SamlError, SamlResult};
use crate::types::canonicalization_algorithms;
use crate::xml::remove_signature_element;

/// XML document signer.
pub struct XmlSigner<'a> {
    key: &'a SigningKey,
    config: SignatureConfig,
}

impl<'a> XmlSigner<'a> {
    /// Creates a signer using the default algorithm for the key family.
    #[must_use]
    pub fn new(key: &'a SigningKey) -> Self {
        Self {
            config: SignatureConfig::with_algorithm(SignatureAlgorithm::default_for(
                key.key_type(),
            )),
            key,
        }
    }

    /// Overrides the signature configuration.
    #[must_use]
    pub fn with_config(mut self, config: SignatureConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the signature algorithm in effect.
    #[must_use]
    pub const fn algorithm(&self) -> SignatureAlgorithm {
        self.config.algorithm
    }

    /// Signs the element carrying `reference_id`, inserting the signature
    /// after its Issuer child.
    pub fn sign(&self, xml: &str, reference_id: &str) -> SamlResult<String> {
        if self.config.algorithm.key_type() != self.key.key_type() {
            return Err(SamlError::InvalidArgument(format!(
                "{} key cannot produce {}",
                self.key.key_type().name(),
                self.config.algorithm.uri()
            )));
        }

        let element = crate::xml::extract_element_by_id(xml, reference_id).ok_or_else(|| {
            SamlError::MissingElement(format!("element with ID '{reference_id}'"))
        })?;

        // Enveloped-signature transform, then simplified canonicalization.
        let canonical = canonicalize(&remove_signature_element(&element));
        let digest = self.config.algorithm.digest(canonical.as_bytes());
        let digest_b64 = BASE64.encode(digest);

        let signed_info = build_signed_info(reference_id, &digest_b64, self.config.algorithm);
        let canonical_signed_info = canonicalize(&signed_info);
        let signature_value = sign_data(
            self.key,
            self.config.algorithm,
            canonical_signed_info.as_bytes(),
        )?;

        let signature_element = build_signature_element(
            &signed_info,
            &BASE64.encode(signature_value),
            self.config.certificate_der.as_deref(),
        );

        let insert_at = insertion_position(xml, reference_id)?;
        Ok(format!(
            "{}{}{}",
            &xml[..insert_at],
            signature_element,
            &xml[insert_at..]
        ))
    }
}

/// Finds the insertion point: directly after the closing Issuer tag of the
/// referenced element, or after its opening tag when no Issuer exists.
fn insertion_position(xml: &str, reference_id: &str) -> SamlResult<usize> {
    let id_pattern = format!("ID=\"{reference_id}\"");
    let id_pos = xml
        .find(&id_pattern)
        .ok_or_else(|| SamlError::MissingElement(format!("element with ID '{reference_id}'")))?;

    let tag_end = xml[id_pos..]
        .find('>')
        .map(|pos| id_pos + pos + 1)
        .ok_or_else(|| SamlError::XmlParse("malformed opening tag".to_string()))?;

    for pattern in ["</saml:Issuer>", "</saml2:Issuer>", "</Issuer>"] {
        if let Some(pos) = xml[tag_end..].find(pattern) {
            return Ok(tag_end + pos + pattern.len());
        }
    }
    Ok(tag_end)
}

/// Simplified canonicalization: whitespace normalization.
///
/// Both the signer and the validator apply the same normalization, which
/// keeps the pair self-consistent without a full C14N implementation.
pub(crate) fn canonicalize(xml: &str) -> String {
    xml.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds the SignedInfo element with the transforms SAML requires.
pub(crate) fn build_signed_info(
    reference_id: &str,
    digest_b64: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    format!(
        r##"<ds:SignedInfo xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
<ds:CanonicalizationMethod Algorithm="{c14n}"/>
<ds:SignatureMethod Algorithm="{sig}"/>
<ds:Reference URI="#{reference_id}">
<ds:Transforms>
<ds:Transform Algorithm="{enveloped}"/>
<ds:Transform Algorithm="{c14n}"/>
</ds:Transforms>
<ds:DigestMethod Algorithm="{digest}"/>
<ds:DigestValue>{digest_b64}</ds:DigestValue>
</ds:Reference>
</ds:SignedInfo>"##,
        c14n = canonicalization_algorithms::EXCLUSIVE_C14N,
        enveloped = canonicalization_algorithms::ENVELOPED_SIGNATURE,
        sig = algorithm.uri(),
        digest = algorithm.digest_uri(),
    )
}

fn build_signature_element(
    signed_info: &str,
    signature_b64: &str,
    certificate_der: Option<&[u8]>,
) -> String {
    let key_info = certificate_der
        .map(|der| {
            format!(
                "\n<ds:KeyInfo>\n<ds:X509Data>\n<ds:X509Certificate>{}</ds:X509Certificate>\n</ds:X509Data>\n</ds:KeyInfo>",
                BASE64.encode(der)
            )
        })
        .unwrap_or_default();

    format!(
        "<ds:Signature xmlns:ds=\"http://www.w3.org/2000/09/xmldsig#\">\n{signed_info}\n<ds:SignatureValue>{signature_b64}</ds:SignatureValue>{key_info}\n</ds:Signature>"
    )
}

//! XML-Encryption wrapper types for encrypted assertions.
//!
//! The schema allows the EncryptedKey to sit in two places: as a direct
//! child of EncryptedAssertion, or nested inside EncryptedData's KeyInfo.
//! Both are legal and both occur in the wild; the direct child wins when
//! both are present.

use serde::{Deserialize, Serialize};

use super::constants::{XMLDSIG_NS, XMLENC_NS};
use crate::error::{SamlError, SamlResult};
use crate::xml::{escape_xml, XmlElement};

/// An EncryptedAssertion element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedAssertion {
    /// The encrypted assertion ciphertext and its metadata.
    pub encrypted_data: EncryptedData,

    /// EncryptedKey elements appearing as direct children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encrypted_keys: Vec<EncryptedKey>,
}

impl EncryptedAssertion {
    /// Parses an encrypted assertion document.
    pub fn from_xml(xml: &str) -> SamlResult<Self> {
        let element = XmlElement::parse(xml)?;
        if element.name != "EncryptedAssertion" {
            return Err(SamlError::InvalidMessage(format!(
                "expected EncryptedAssertion, got {}",
                element.name
            )));
        }
        Self::from_element(&element)
    }

    /// Reads an `EncryptedAssertion` element.
    pub fn from_element(element: &XmlElement) -> SamlResult<Self> {
        let encrypted_data = element
            .child("EncryptedData")
            .ok_or_else(|| SamlError::MissingElement("EncryptedData".to_string()))?;

        Ok(Self {
            encrypted_data: EncryptedData::from_element(encrypted_data)?,
            encrypted_keys: element
                .children_named("EncryptedKey")
                .map(EncryptedKey::from_element)
                .collect::<SamlResult<Vec<_>>>()?,
        })
    }

    /// Returns the operative EncryptedKey.
    ///
    /// A direct child takes precedence over one nested in the
    /// EncryptedData's KeyInfo.
    #[must_use]
    pub fn encrypted_key(&self) -> Option<&EncryptedKey> {
        self.encrypted_keys.first().or_else(|| {
            self.encrypted_data
                .key_info
                .as_ref()
                .and_then(|ki| ki.encrypted_key.as_ref())
        })
    }

    /// Serializes the element (without an XML declaration).
    #[must_use]
    pub fn to_xml(&self) -> String {
        let keys: String = self.encrypted_keys.iter().map(EncryptedKey::to_xml).collect();
        format!(
            "<saml:EncryptedAssertion xmlns:saml=\"{}\">{}{keys}</saml:EncryptedAssertion>",
            super::constants::SAML_NS,
            self.encrypted_data.to_xml(),
        )
    }
}

/// An EncryptedData element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedData {
    /// The block-encryption algorithm URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_method: Option<String>,

    /// Key information, possibly holding a nested EncryptedKey.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_info: Option<KeyInfo>,

    /// The base64-encoded ciphertext.
    pub cipher_value: String,
}

impl EncryptedData {
    fn from_element(element: &XmlElement) -> SamlResult<Self> {
        Ok(Self {
            encryption_method: element
                .child("EncryptionMethod")
                .and_then(|m| m.attr("Algorithm"))
                .map(str::to_string),
            key_info: element
                .child("KeyInfo")
                .map(KeyInfo::from_element)
                .transpose()?,
            cipher_value: cipher_value(element)?,
        })
    }

    fn to_xml(&self) -> String {
        let method = self
            .encryption_method
            .as_ref()
            .map(|m| format!("<xenc:EncryptionMethod Algorithm=\"{}\"/>", escape_xml(m)))
            .unwrap_or_default();
        let key_info = self.key_info.as_ref().map(KeyInfo::to_xml).unwrap_or_default();
        format!(
            "<xenc:EncryptedData xmlns:xenc=\"{XMLENC_NS}\" Type=\"{XMLENC_NS}Element\">{method}{key_info}<xenc:CipherData><xenc:CipherValue>{}</xenc:CipherValue></xenc:CipherData></xenc:EncryptedData>",
            escape_xml(&self.cipher_value),
        )
    }
}

/// A ds:KeyInfo element inside EncryptedData.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyInfo {
    /// A nested EncryptedKey, the second legal placement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_key: Option<EncryptedKey>,
}

impl KeyInfo {
    fn from_element(element: &XmlElement) -> SamlResult<Self> {
        Ok(Self {
            encrypted_key: element
                .child("EncryptedKey")
                .map(EncryptedKey::from_element)
                .transpose()?,
        })
    }

    fn to_xml(&self) -> String {
        let key = self
            .encrypted_key
            .as_ref()
            .map(EncryptedKey::to_xml)
            .unwrap_or_default();
        format!("<ds:KeyInfo xmlns:ds=\"{XMLDSIG_NS}\">{key}</ds:KeyInfo>")
    }
}

/// An EncryptedKey element: the session key wrapped for the recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedKey {
    /// The key-transport algorithm URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_method: Option<String>,

    /// The base64-encoded wrapped key.
    pub cipher_value: String,
}

impl EncryptedKey {
    fn from_element(element: &XmlElement) -> SamlResult<Self> {
        Ok(Self {
            encryption_method: element
                .child("EncryptionMethod")
                .and_then(|m| m.attr("Algorithm"))
                .map(str::to_string),
            cipher_value: cipher_value(element)?,
        })
    }

    fn to_xml(&self) -> String {
        let method = self
            .encryption_method
            .as_ref()
            .map(|m| format!("<xenc:EncryptionMethod Algorithm=\"{}\"/>", escape_xml(m)))
            .unwrap_or_default();
        format!(
            "<xenc:EncryptedKey xmlns:xenc=\"{XMLENC_NS}\">{method}<xenc:CipherData><xenc:CipherValue>{}</xenc:CipherValue></xenc:CipherData></xenc:EncryptedKey>",
            escape_xml(&self.cipher_value),
        )
    }
}

fn cipher_value(element: &XmlElement) -> SamlResult<String> {
    element
        .child("CipherData")
        .and_then(|c| c.child("CipherValue"))
        .map(|v| v.text_trimmed().chars().filter(|c| !c.is_whitespace()).collect())
        .ok_or_else(|| SamlError::MissingElement("CipherValue".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_with_direct_child_key() {
        let encrypted = EncryptedAssertion {
            encrypted_data: EncryptedData {
                encryption_method: Some(
                    super::super::encryption_algorithms::AES256_GCM.to_string(),
                ),
                key_info: None,
                cipher_value: "Y2lwaGVydGV4dA==".to_string(),
            },
            encrypted_keys: vec![EncryptedKey {
                encryption_method: Some(
                    super::super::key_transport_algorithms::RSA_1_5.to_string(),
                ),
                cipher_value: "d3JhcHBlZA==".to_string(),
            }],
        };

        let parsed = EncryptedAssertion::from_xml(&encrypted.to_xml()).unwrap();
        assert_eq!(parsed.encrypted_keys.len(), 1);
        let key = parsed.encrypted_key().unwrap();
        assert_eq!(key.cipher_value, "d3JhcHBlZA==");
    }

    #[test]
    fn nested_key_info_placement_is_found() {
        let encrypted = EncryptedAssertion {
            encrypted_data: EncryptedData {
                encryption_method: None,
                key_info: Some(KeyInfo {
                    encrypted_key: Some(EncryptedKey {
                        encryption_method: None,
                        cipher_value: "bmVzdGVk".to_string(),
                    }),
                }),
                cipher_value: "Y3Q=".to_string(),
            },
            encrypted_keys: Vec::new(),
        };

        let parsed = EncryptedAssertion::from_xml(&encrypted.to_xml()).unwrap();
        assert!(parsed.encrypted_keys.is_empty());
        assert_eq!(parsed.encrypted_key().unwrap().cipher_value, "bmVzdGVk");
    }

    #[test]
    fn direct_child_takes_precedence_over_nested() {
        let encrypted = EncryptedAssertion {
            encrypted_data: EncryptedData {
                encryption_method: None,
                key_info: Some(KeyInfo {
                    encrypted_key: Some(EncryptedKey {
                        encryption_method: None,
                        cipher_value: "bmVzdGVk".to_string(),
                    }),
                }),
                cipher_value: "Y3Q=".to_string(),
            },
            encrypted_keys: vec![EncryptedKey {
                encryption_method: None,
                cipher_value: "ZGlyZWN0".to_string(),
            }],
        };

        assert_eq!(encrypted.encrypted_key().unwrap().cipher_value, "ZGlyZWN0");
    }

    #[test]
    fn missing_encrypted_data_is_rejected() {
        let xml = "<saml:EncryptedAssertion xmlns:saml=\"urn:oasis:names:tc:SAML:2.0:assertion\"/>";
        assert!(matches!(
            EncryptedAssertion::from_xml(xml),
            Err(SamlError::MissingElement(_))
        ));
    }

    #[test]
    fn missing_cipher_value_is_rejected() {
        let xml = format!(
            "<saml:EncryptedAssertion xmlns:saml=\"urn:oasis:names:tc:SAML:2.0:assertion\"><xenc:EncryptedData xmlns:xenc=\"{XMLENC_NS}\"/></saml:EncryptedAssertion>"
        );
        assert!(matches!(
            EncryptedAssertion::from_xml(&xml),
            Err(SamlError::MissingElement(_))
        ));
    }
}

//! SAML Name ID types.
//!
//! Name identifiers identify subjects and issuers. The SAML `Issuer`
//! element shares the NameIDType schema, so it reuses this struct.

use serde::{Deserialize, Serialize};

use super::constants::NameIdFormat;
use crate::xml::XmlElement;

/// SAML Name ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameId {
    /// The actual identifier value.
    pub value: String,

    /// The format of the name identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// The security or administrative domain that qualifies the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_qualifier: Option<String>,

    /// The service provider's entity ID that qualifies the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp_name_qualifier: Option<String>,

    /// A provider identifier established by the SP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp_provided_id: Option<String>,
}

impl NameId {
    /// Creates a new name ID with the given value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
            name_qualifier: None,
            sp_name_qualifier: None,
            sp_provided_id: None,
        }
    }

    /// Creates an entity name ID, the shape used by `Issuer` elements.
    #[must_use]
    pub fn entity(value: impl Into<String>) -> Self {
        Self::new(value).with_format(NameIdFormat::Entity)
    }

    /// Creates an email name ID.
    #[must_use]
    pub fn email(value: impl Into<String>) -> Self {
        Self::new(value).with_format(NameIdFormat::Email)
    }

    /// Creates a persistent name ID.
    #[must_use]
    pub fn persistent(value: impl Into<String>) -> Self {
        Self::new(value).with_format(NameIdFormat::Persistent)
    }

    /// Creates a transient name ID.
    #[must_use]
    pub fn transient(value: impl Into<String>) -> Self {
        Self::new(value).with_format(NameIdFormat::Transient)
    }

    /// Sets the format.
    #[must_use]
    pub fn with_format(mut self, format: NameIdFormat) -> Self {
        self.format = Some(format.uri().to_string());
        self
    }

    /// Sets the name qualifier.
    #[must_use]
    pub fn with_name_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.name_qualifier = Some(qualifier.into());
        self
    }

    /// Sets the SP name qualifier.
    #[must_use]
    pub fn with_sp_name_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.sp_name_qualifier = Some(qualifier.into());
        self
    }

    /// Returns the parsed name ID format, defaulting to unspecified.
    #[must_use]
    pub fn parsed_format(&self) -> NameIdFormat {
        self.format
            .as_deref()
            .and_then(NameIdFormat::from_uri)
            .unwrap_or_default()
    }

    /// Reads a NameID-shaped element (`NameID` or `Issuer`).
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        Self {
            value: element.text_trimmed().to_string(),
            format: element.attr("Format").map(str::to_string),
            name_qualifier: element.attr("NameQualifier").map(str::to_string),
            sp_name_qualifier: element.attr("SPNameQualifier").map(str::to_string),
            sp_provided_id: element.attr("SPProvidedID").map(str::to_string),
        }
    }

    /// Serializes as the named element with the assertion namespace prefix.
    #[must_use]
    pub fn to_xml(&self, element_name: &str) -> String {
        let mut attrs = String::new();
        if let Some(format) = &self.format {
            attrs.push_str(&format!(" Format=\"{}\"", crate::xml::escape_xml(format)));
        }
        if let Some(q) = &self.name_qualifier {
            attrs.push_str(&format!(" NameQualifier=\"{}\"", crate::xml::escape_xml(q)));
        }
        if let Some(q) = &self.sp_name_qualifier {
            attrs.push_str(&format!(" SPNameQualifier=\"{}\"", crate::xml::escape_xml(q)));
        }
        if let Some(id) = &self.sp_provided_id {
            attrs.push_str(&format!(" SPProvidedID=\"{}\"", crate::xml::escape_xml(id)));
        }
        format!(
            "<saml:{element_name}{attrs}>{}</saml:{element_name}>",
            crate::xml::escape_xml(&self.value)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_id_constructors() {
        assert_eq!(NameId::email("user@example.com").parsed_format(), NameIdFormat::Email);
        assert_eq!(NameId::persistent("abc").parsed_format(), NameIdFormat::Persistent);
        assert_eq!(NameId::new("raw").parsed_format(), NameIdFormat::Unspecified);
    }

    #[test]
    fn xml_roundtrip() {
        let name_id = NameId::persistent("user-123")
            .with_name_qualifier("https://idp.example.com")
            .with_sp_name_qualifier("https://sp.example.com");

        let xml = name_id.to_xml("NameID");
        let element = XmlElement::parse(&xml).unwrap();
        assert_eq!(NameId::from_element(&element), name_id);
    }

    #[test]
    fn issuer_shares_the_shape() {
        let xml = r#"<saml:Issuer xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion">https://idp.example.com</saml:Issuer>"#;
        let element = XmlElement::parse(xml).unwrap();
        let issuer = NameId::from_element(&element);
        assert_eq!(issuer.value, "https://idp.example.com");
        assert!(issuer.format.is_none());
    }
}

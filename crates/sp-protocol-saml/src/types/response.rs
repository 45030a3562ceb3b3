//! SAML Response type.
//!
//! The authentication response an identity provider sends to the SP's
//! assertion consumer endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{parse_instant, Assertion, EncryptedAssertion, NameId, Status};
use crate::error::{SamlError, SamlResult};
use crate::xml::{extract_element_by_id, XmlElement};

/// SAML Response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Unique identifier for this response.
    pub id: String,

    /// Version of the SAML protocol (must be "2.0").
    pub version: String,

    /// Timestamp when this response was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_instant: Option<DateTime<Utc>>,

    /// The identity provider that issued this response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<NameId>,

    /// The request ID this response answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// The URL this response was sent to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// The response status.
    pub status: Status,

    /// Plaintext assertions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertions: Vec<Assertion>,

    /// Encrypted assertions, decryptable with the SP's transport key.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encrypted_assertions: Vec<EncryptedAssertion>,

    /// Whether the response element itself carries a signature.
    #[serde(skip)]
    pub signed: bool,
}

impl Response {
    /// Parses a response document.
    ///
    /// Each assertion keeps the raw source slice of its element so the
    /// validation engine can verify digests over the original bytes.
    pub fn from_xml(xml: &str) -> SamlResult<Self> {
        let element = XmlElement::parse(xml)?;
        if element.name != "Response" {
            return Err(SamlError::InvalidMessage(format!(
                "expected Response, got {}",
                element.name
            )));
        }

        let status = element
            .child("Status")
            .and_then(Status::from_element)
            .ok_or_else(|| SamlError::MissingElement("Status".to_string()))?;

        let mut assertions = Vec::new();
        for child in element.children_named("Assertion") {
            let mut assertion = Assertion::from_element(child);
            assertion.source_xml = extract_element_by_id(xml, &assertion.id);
            assertions.push(assertion);
        }

        let encrypted_assertions = element
            .children_named("EncryptedAssertion")
            .map(EncryptedAssertion::from_element)
            .collect::<SamlResult<Vec<_>>>()?;

        // Signature directly under Response, not one nested in an assertion.
        let signed = element.child("Signature").is_some();

        Ok(Self {
            id: element.attr("ID").unwrap_or_default().to_string(),
            version: element.attr("Version").unwrap_or_default().to_string(),
            issue_instant: element.attr("IssueInstant").and_then(parse_instant),
            issuer: element.child("Issuer").map(NameId::from_element),
            in_response_to: element.attr("InResponseTo").map(str::to_string),
            destination: element.attr("Destination").map(str::to_string),
            status,
            assertions,
            encrypted_assertions,
            signed,
        })
    }

    /// Returns true if the status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Gets the first plaintext assertion if present.
    #[must_use]
    pub fn first_assertion(&self) -> Option<&Assertion> {
        self.assertions.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE_XML: &str = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_resp1" Version="2.0" IssueInstant="2026-01-01T00:00:00Z" InResponseTo="_req1" Destination="https://sp.example.com/acs">
        <saml:Issuer>https://idp.example.com</saml:Issuer>
        <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
        <saml:Assertion ID="_a1" Version="2.0" IssueInstant="2026-01-01T00:00:00Z">
            <saml:Issuer>https://idp.example.com</saml:Issuer>
            <saml:Subject><saml:NameID>user@example.com</saml:NameID></saml:Subject>
        </saml:Assertion>
    </samlp:Response>"#;

    #[test]
    fn parse_success_response() {
        let response = Response::from_xml(RESPONSE_XML).unwrap();
        assert_eq!(response.id, "_resp1");
        assert!(response.is_success());
        assert_eq!(response.in_response_to.as_deref(), Some("_req1"));
        assert_eq!(response.assertions.len(), 1);
        assert_eq!(
            response.issuer.as_ref().unwrap().value,
            "https://idp.example.com"
        );
    }

    #[test]
    fn assertion_keeps_raw_source() {
        let response = Response::from_xml(RESPONSE_XML).unwrap();
        let raw = response.assertions[0].source_xml.as_ref().unwrap();
        assert!(raw.starts_with("<saml:Assertion"));
        assert!(raw.contains("ID=\"_a1\""));
        assert!(raw.ends_with("</saml:Assertion>"));
    }

    #[test]
    fn missing_status_is_rejected() {
        let xml = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="_r" Version="2.0"/>"#;
        assert!(matches!(
            Response::from_xml(xml),
            Err(SamlError::MissingElement(_))
        ));
    }

    #[test]
    fn wrong_root_is_rejected() {
        assert!(matches!(
            Response::from_xml("<LogoutRequest/>"),
            Err(SamlError::InvalidMessage(_))
        ));
    }
}

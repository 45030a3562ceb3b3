//! SAML Single Logout types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{format_instant, parse_instant, NameId, Status};
use crate::error::{SamlError, SamlResult};
use crate::xml::{escape_xml, XmlElement};

/// SAML Logout Request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    /// Unique identifier for this request.
    pub id: String,

    /// Version of the SAML protocol (must be "2.0").
    pub version: String,

    /// Timestamp when this request was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_instant: Option<DateTime<Utc>>,

    /// The entity that issued the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<NameId>,

    /// The URL this request was sent to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// The principal to log out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id: Option<NameId>,

    /// Session indexes to terminate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub session_indexes: Vec<String>,

    /// Reason for the logout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Time after which the request is no longer valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,
}

impl LogoutRequest {
    /// User-initiated logout reason.
    pub const REASON_USER: &'static str = "urn:oasis:names:tc:SAML:2.0:logout:user";

    /// Administrator-initiated logout reason.
    pub const REASON_ADMIN: &'static str = "urn:oasis:names:tc:SAML:2.0:logout:admin";

    /// Creates a new logout request with a fresh id.
    #[must_use]
    pub fn new(issuer: impl Into<String>, name_id: NameId) -> Self {
        Self {
            id: sp_crypto::secure_id(),
            version: super::constants::SAML_VERSION.to_string(),
            issue_instant: Some(Utc::now()),
            issuer: Some(NameId::entity(issuer)),
            destination: None,
            name_id: Some(name_id),
            session_indexes: Vec::new(),
            reason: None,
            not_on_or_after: None,
        }
    }

    /// Sets the destination URL.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Adds a session index to terminate.
    #[must_use]
    pub fn with_session_index(mut self, index: impl Into<String>) -> Self {
        self.session_indexes.push(index.into());
        self
    }

    /// Sets the logout reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Parses a logout request document.
    pub fn from_xml(xml: &str) -> SamlResult<Self> {
        let element = XmlElement::parse(xml)?;
        if element.name != "LogoutRequest" {
            return Err(SamlError::InvalidMessage(format!(
                "expected LogoutRequest, got {}",
                element.name
            )));
        }
        Ok(Self::from_element(&element))
    }

    /// Reads a `LogoutRequest` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        Self {
            id: element.attr("ID").unwrap_or_default().to_string(),
            version: element.attr("Version").unwrap_or_default().to_string(),
            issue_instant: element.attr("IssueInstant").and_then(parse_instant),
            issuer: element.child("Issuer").map(NameId::from_element),
            destination: element.attr("Destination").map(str::to_string),
            name_id: element.child("NameID").map(NameId::from_element),
            session_indexes: element
                .children_named("SessionIndex")
                .map(|s| s.text_trimmed().to_string())
                .collect(),
            reason: element.attr("Reason").map(str::to_string),
            not_on_or_after: element.attr("NotOnOrAfter").and_then(parse_instant),
        }
    }

    /// Serializes the request (without an XML declaration).
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut attrs = String::new();
        if let Some(destination) = &self.destination {
            attrs.push_str(&format!(" Destination=\"{}\"", escape_xml(destination)));
        }
        if let Some(reason) = &self.reason {
            attrs.push_str(&format!(" Reason=\"{}\"", escape_xml(reason)));
        }
        if let Some(t) = self.not_on_or_after {
            attrs.push_str(&format!(" NotOnOrAfter=\"{}\"", format_instant(t)));
        }

        let issue_instant = self
            .issue_instant
            .map(|t| format!(" IssueInstant=\"{}\"", format_instant(t)))
            .unwrap_or_default();

        let mut body = String::new();
        if let Some(issuer) = &self.issuer {
            body.push_str(&issuer.to_xml("Issuer"));
        }
        if let Some(name_id) = &self.name_id {
            body.push_str(&name_id.to_xml("NameID"));
        }
        for index in &self.session_indexes {
            body.push_str(&format!(
                "<samlp:SessionIndex>{}</samlp:SessionIndex>",
                escape_xml(index)
            ));
        }

        format!(
            "<samlp:LogoutRequest xmlns:samlp=\"{}\" xmlns:saml=\"{}\" ID=\"{}\" Version=\"{}\"{issue_instant}{attrs}>{body}</samlp:LogoutRequest>",
            super::constants::SAMLP_NS,
            super::constants::SAML_NS,
            escape_xml(&self.id),
            escape_xml(&self.version),
        )
    }

    /// Checks whether the request has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.not_on_or_after
            .is_some_and(|not_after| Utc::now() >= not_after)
    }
}

/// SAML Logout Response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    /// Unique identifier for this response.
    pub id: String,

    /// Version of the SAML protocol (must be "2.0").
    pub version: String,

    /// Timestamp when this response was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_instant: Option<DateTime<Utc>>,

    /// The entity that issued the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<NameId>,

    /// The request ID this response answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// The URL this response was sent to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// The status of the logout.
    pub status: Status,
}

impl LogoutResponse {
    /// Creates a success response with a fresh id.
    #[must_use]
    pub fn success(issuer: impl Into<String>) -> Self {
        Self::with_status(issuer, Status::success())
    }

    /// Creates a response with the given status.
    #[must_use]
    pub fn with_status(issuer: impl Into<String>, status: Status) -> Self {
        Self {
            id: sp_crypto::secure_id(),
            version: super::constants::SAML_VERSION.to_string(),
            issue_instant: Some(Utc::now()),
            issuer: Some(NameId::entity(issuer)),
            in_response_to: None,
            destination: None,
            status,
        }
    }

    /// Sets the request ID this response answers.
    #[must_use]
    pub fn in_response_to(mut self, request_id: impl Into<String>) -> Self {
        self.in_response_to = Some(request_id.into());
        self
    }

    /// Sets the destination URL.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Returns true if the status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parses a logout response document.
    pub fn from_xml(xml: &str) -> SamlResult<Self> {
        let element = XmlElement::parse(xml)?;
        if element.name != "LogoutResponse" {
            return Err(SamlError::InvalidMessage(format!(
                "expected LogoutResponse, got {}",
                element.name
            )));
        }

        let status = element
            .child("Status")
            .and_then(Status::from_element)
            .ok_or_else(|| SamlError::MissingElement("Status".to_string()))?;

        Ok(Self {
            id: element.attr("ID").unwrap_or_default().to_string(),
            version: element.attr("Version").unwrap_or_default().to_string(),
            issue_instant: element.attr("IssueInstant").and_then(parse_instant),
            issuer: element.child("Issuer").map(NameId::from_element),
            in_response_to: element.attr("InResponseTo").map(str::to_string),
            destination: element.attr("Destination").map(str::to_string),
            status,
        })
    }

    /// Serializes the response (without an XML declaration).
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut attrs = String::new();
        if let Some(r) = &self.in_response_to {
            attrs.push_str(&format!(" InResponseTo=\"{}\"", escape_xml(r)));
        }
        if let Some(destination) = &self.destination {
            attrs.push_str(&format!(" Destination=\"{}\"", escape_xml(destination)));
        }

        let issue_instant = self
            .issue_instant
            .map(|t| format!(" IssueInstant=\"{}\"", format_instant(t)))
            .unwrap_or_default();

        let issuer = self
            .issuer
            .as_ref()
            .map(|i| i.to_xml("Issuer"))
            .unwrap_or_default();

        format!(
            "<samlp:LogoutResponse xmlns:samlp=\"{}\" xmlns:saml=\"{}\" ID=\"{}\" Version=\"{}\"{issue_instant}{attrs}>{issuer}{}</samlp:LogoutResponse>",
            super::constants::SAMLP_NS,
            super::constants::SAML_NS,
            escape_xml(&self.id),
            escape_xml(&self.version),
            self.status.to_xml(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logout_request_roundtrip() {
        let request = LogoutRequest::new("https://sp.example.com", NameId::email("user@example.com"))
            .with_destination("https://idp.example.com/slo")
            .with_session_index("_session1")
            .with_reason(LogoutRequest::REASON_USER);

        let parsed = LogoutRequest::from_xml(&request.to_xml()).unwrap();
        assert_eq!(parsed.id, request.id);
        assert_eq!(parsed.issuer.as_ref().unwrap().value, "https://sp.example.com");
        assert_eq!(parsed.name_id.as_ref().unwrap().value, "user@example.com");
        assert_eq!(parsed.session_indexes, vec!["_session1"]);
        assert_eq!(parsed.reason.as_deref(), Some(LogoutRequest::REASON_USER));
        assert!(!parsed.is_expired());
    }

    #[test]
    fn logout_response_roundtrip() {
        let response = LogoutResponse::success("https://sp.example.com")
            .in_response_to("_req1")
            .with_destination("https://idp.example.com/slo");

        let parsed = LogoutResponse::from_xml(&response.to_xml()).unwrap();
        assert!(parsed.is_success());
        assert_eq!(parsed.in_response_to.as_deref(), Some("_req1"));
    }

    #[test]
    fn request_denied_response_keeps_status() {
        let response =
            LogoutResponse::with_status("https://sp.example.com", Status::request_denied());
        let parsed = LogoutResponse::from_xml(&response.to_xml()).unwrap();
        assert!(!parsed.is_success());
        assert_eq!(
            parsed.status.effective_code(),
            super::super::sub_status_codes::REQUEST_DENIED
        );
    }

    #[test]
    fn expired_request_detected() {
        let mut request =
            LogoutRequest::new("https://sp.example.com", NameId::email("u@example.com"));
        request.not_on_or_after = Some(Utc::now() - chrono::Duration::seconds(1));
        assert!(request.is_expired());
    }
}

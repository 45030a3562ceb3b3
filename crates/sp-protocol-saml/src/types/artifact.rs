//! SAML Artifact resolution types.
//!
//! ArtifactResolve is sent over the SOAP back channel to trade an artifact
//! for the full protocol message; ArtifactResponse carries that message
//! back as an arbitrary embedded element.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{format_instant, parse_instant, NameId, Status};
use crate::error::{SamlError, SamlResult};
use crate::xml::{escape_xml, extract_element_by_id, XmlElement};

/// SAML ArtifactResolve request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactResolve {
    /// Unique identifier for this request.
    pub id: String,

    /// Version of the SAML protocol (must be "2.0").
    pub version: String,

    /// Timestamp when this request was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_instant: Option<DateTime<Utc>>,

    /// The entity issuing the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<NameId>,

    /// The endpoint the request targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// The artifact being resolved.
    pub artifact: String,
}

impl ArtifactResolve {
    /// Creates a new resolve request with a fresh id.
    #[must_use]
    pub fn new(issuer: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            id: sp_crypto::secure_id(),
            version: super::constants::SAML_VERSION.to_string(),
            issue_instant: Some(Utc::now()),
            issuer: Some(NameId::entity(issuer)),
            destination: None,
            artifact: artifact.into(),
        }
    }

    /// Sets the destination URL.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Parses an artifact resolve document.
    pub fn from_xml(xml: &str) -> SamlResult<Self> {
        let element = XmlElement::parse(xml)?;
        if element.name != "ArtifactResolve" {
            return Err(SamlError::InvalidMessage(format!(
                "expected ArtifactResolve, got {}",
                element.name
            )));
        }
        Ok(Self::from_element(&element))
    }

    /// Reads an `ArtifactResolve` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        Self {
            id: element.attr("ID").unwrap_or_default().to_string(),
            version: element.attr("Version").unwrap_or_default().to_string(),
            issue_instant: element.attr("IssueInstant").and_then(parse_instant),
            issuer: element.child("Issuer").map(NameId::from_element),
            destination: element.attr("Destination").map(str::to_string),
            artifact: element
                .child("Artifact")
                .map(|a| a.text_trimmed().to_string())
                .unwrap_or_default(),
        }
    }

    /// Serializes the request (without an XML declaration).
    #[must_use]
    pub fn to_xml(&self) -> String {
        let destination = self
            .destination
            .as_ref()
            .map(|d| format!(" Destination=\"{}\"", escape_xml(d)))
            .unwrap_or_default();
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
            "<samlp:ArtifactResolve xmlns:samlp=\"{}\" xmlns:saml=\"{}\" ID=\"{}\" Version=\"{}\"{issue_instant}{destination}>{issuer}<samlp:Artifact>{}</samlp:Artifact></samlp:ArtifactResolve>",
            super::constants::SAMLP_NS,
            super::constants::SAML_NS,
            escape_xml(&self.id),
            escape_xml(&self.version),
            escape_xml(&self.artifact),
        )
    }
}

/// SAML ArtifactResponse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactResponse {
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

    /// The resolve request this response answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// The response status.
    pub status: Status,

    /// Local name of the embedded message element, when one is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_name: Option<String>,

    /// Raw source slice of the embedded message, ready for re-parsing with
    /// the matching message type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_xml: Option<String>,
}

impl ArtifactResponse {
    /// Parses an artifact response document and locates the embedded
    /// message.
    ///
    /// The embedded message is any element other than Issuer, Signature and
    /// Status; the schema does not type it, so it is found by elimination.
    pub fn from_xml(xml: &str) -> SamlResult<Self> {
        let element = XmlElement::parse(xml)?;
        if element.name != "ArtifactResponse" {
            return Err(SamlError::InvalidMessage(format!(
                "expected ArtifactResponse, got {}",
                element.name
            )));
        }

        let status = element
            .child("Status")
            .and_then(Status::from_element)
            .ok_or_else(|| SamlError::MissingElement("Status".to_string()))?;

        let embedded = element
            .children
            .iter()
            .find(|c| !matches!(c.name.as_str(), "Issuer" | "Signature" | "Status"));

        let (message_name, message_xml) = match embedded {
            Some(message) => {
                let raw = message
                    .attr("ID")
                    .and_then(|id| extract_element_by_id(xml, id));
                (Some(message.name.clone()), raw)
            }
            None => (None, None),
        };

        Ok(Self {
            id: element.attr("ID").unwrap_or_default().to_string(),
            version: element.attr("Version").unwrap_or_default().to_string(),
            issue_instant: element.attr("IssueInstant").and_then(parse_instant),
            issuer: element.child("Issuer").map(NameId::from_element),
            in_response_to: element.attr("InResponseTo").map(str::to_string),
            status,
            message_name,
            message_xml,
        })
    }

    /// Returns true if the status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

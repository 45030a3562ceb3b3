//! Minimal SOAP 1.1 envelope handling for the artifact binding.
//!
//! Only the literal envelope wrapper is implemented: wrap a message into
//! `Envelope/Body`, and unwrap the body's first child on the way in. A
//! document without a SOAP body is treated as the message itself, a
//! relaxation some artifact responders rely on.

use std::cell::OnceCell;

use crate::error::{SamlError, SamlResult};
use crate::types::{ArtifactResolve, ArtifactResponse, LogoutRequest, SOAP_ENV_NS};
use crate::xml::{extract_element_by_id, strip_xml_declaration, XmlElement};

/// Wraps a message in a SOAP 1.1 envelope.
#[must_use]
pub fn wrap_envelope(message_xml: &str) -> String {
    format!(
        "<SOAP-ENV:Envelope xmlns:SOAP-ENV=\"{SOAP_ENV_NS}\"><SOAP-ENV:Body>{message_xml}</SOAP-ENV:Body></SOAP-ENV:Envelope>"
    )
}

/// Unwraps the SOAP body's first child as raw XML.
///
/// When the document is not an envelope, the document root is returned
/// unchanged.
pub fn unwrap_envelope(document: &str) -> SamlResult<String> {
    let document = strip_xml_declaration(document);
    let root = XmlElement::parse(document)?;

    if root.name != "Envelope" {
        return Ok(document.trim().to_string());
    }

    let body = match root.child("Body") {
        Some(body) => body,
        None => return Ok(document.trim().to_string()),
    };

    let message = body
        .children
        .first()
        .ok_or_else(|| SamlError::MissingElement("SOAP body is empty".to_string()))?;

    // Protocol messages carry an ID; slice the original text by it so
    // embedded signatures stay verifiable.
    if let Some(raw) = message
        .attr("ID")
        .and_then(|id| extract_element_by_id(document, id))
    {
        return Ok(raw);
    }

    extract_first_element_named(document, &message.name).ok_or_else(|| {
        SamlError::XmlParse(format!("cannot slice SOAP body child {}", message.name))
    })
}

/// Extracts the first element with the given local name from raw XML.
fn extract_first_element_named(xml: &str, local_name: &str) -> Option<String> {
    let mut search_from = 0;
    while let Some(offset) = xml[search_from..].find('<') {
        let start = search_from + offset;
        let rest = &xml[start + 1..];
        let name_end = rest.find(|c: char| c.is_whitespace() || c == '>' || c == '/')?;
        let tag = &rest[..name_end];
        let tag_local = tag.rsplit(':').next().unwrap_or(tag);

        if tag_local == local_name && !tag.starts_with('/') && !tag.starts_with('?') {
            let open_end = xml[start..].find('>')? + start;
            if xml[..open_end].ends_with('/') {
                return Some(xml[start..open_end + 1].to_string());
            }
            let close = format!("</{tag}>");
            let close_pos = xml[start..].find(&close)? + start;
            return Some(xml[start..close_pos + close.len()].to_string());
        }
        search_from = start + 1;
    }
    None
}

/// The message kinds a SOAP exchange can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapMessageKind {
    /// An inbound artifact resolution request.
    ArtifactResolve,
    /// An artifact resolution response.
    ArtifactResponse,
    /// A back-channel logout request.
    LogoutRequest,
}

/// Parser for inbound SOAP-carried protocol messages.
///
/// Deserialization happens lazily on first access and the result is cached
/// per parser instance. Instances are intentionally not `Sync`; create one
/// per request.
pub struct SoapMessageParser {
    xml: String,
    kind: SoapMessageKind,
    artifact_resolve: OnceCell<ArtifactResolve>,
    artifact_response: OnceCell<ArtifactResponse>,
    logout_request: OnceCell<LogoutRequest>,
}

impl SoapMessageParser {
    /// Unwraps the document and classifies the carried message.
    pub fn parse(document: &str) -> SamlResult<Self> {
        let xml = unwrap_envelope(document)?;
        let root = XmlElement::parse(&xml)?;

        let kind = match root.name.as_str() {
            "ArtifactResolve" => SoapMessageKind::ArtifactResolve,
            "ArtifactResponse" => SoapMessageKind::ArtifactResponse,
            "LogoutRequest" => SoapMessageKind::LogoutRequest,
            other => {
                return Err(SamlError::InvalidMessage(format!(
                    "unexpected SOAP message root: {other}"
                )))
            }
        };

        Ok(Self {
            xml,
            kind,
            artifact_resolve: OnceCell::new(),
            artifact_response: OnceCell::new(),
            logout_request: OnceCell::new(),
        })
    }

    /// Returns the classified message kind.
    #[must_use]
    pub const fn kind(&self) -> SoapMessageKind {
        self.kind
    }

    /// Returns the unwrapped message XML.
    #[must_use]
    pub fn message_xml(&self) -> &str {
        &self.xml
    }

    /// Returns the carried ArtifactResolve, parsing it on first access.
    pub fn artifact_resolve(&self) -> SamlResult<&ArtifactResolve> {
        self.expect_kind(SoapMessageKind::ArtifactResolve)?;
        if let Some(parsed) = self.artifact_resolve.get() {
            return Ok(parsed);
        }
        let parsed = ArtifactResolve::from_xml(&self.xml)?;
        Ok(self.artifact_resolve.get_or_init(|| parsed))
    }

    /// Returns the carried ArtifactResponse, parsing it on first access.
    pub fn artifact_response(&self) -> SamlResult<&ArtifactResponse> {
        self.expect_kind(SoapMessageKind::ArtifactResponse)?;
        if let Some(parsed) = self.artifact_response.get() {
            return Ok(parsed);
        }
        let parsed = ArtifactResponse::from_xml(&self.xml)?;
        Ok(self.artifact_response.get_or_init(|| parsed))
    }

    /// Returns the carried LogoutRequest, parsing it on first access.
    pub fn logout_request(&self) -> SamlResult<&LogoutRequest> {
        self.expect_kind(SoapMessageKind::LogoutRequest)?;
        if let Some(parsed) = self.logout_request.get() {
            return Ok(parsed);
        }
        let parsed = LogoutRequest::from_xml(&self.xml)?;
        Ok(self.logout_request.get_or_init(|| parsed))
    }

    fn expect_kind(&self, expected: SoapMessageKind) -> SamlResult<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(SamlError::InvalidMessage(format!(
                "SOAP message is {:?}, not {expected:?}",
                self.kind
            )))
        }
    }
}

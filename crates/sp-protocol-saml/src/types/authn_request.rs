//! SAML AuthnRequest type.
//!
//! The authentication request the SP sends to an identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{format_instant, NameIdFormat};
use crate::xml::escape_xml;

/// SAML Authentication Request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthnRequest {
    /// Unique identifier for this request.
    pub id: String,

    /// Version of the SAML protocol (always "2.0").
    pub version: String,

    /// Timestamp when this request was issued.
    pub issue_instant: DateTime<Utc>,

    /// The SP entity ID issuing the request.
    pub issuer: String,

    /// The IdP endpoint this request targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// The URL the response should be sent to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_consumer_service_url: Option<String>,

    /// Requested NameID format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id_policy_format: Option<String>,

    /// Whether the IdP may create a new identifier for the subject.
    #[serde(default)]
    pub allow_create: bool,

    /// Whether the IdP must re-authenticate the user.
    #[serde(default)]
    pub force_authn: bool,

    /// Whether the IdP must not interact with the user.
    #[serde(default)]
    pub is_passive: bool,
}

impl AuthnRequest {
    /// Creates a new authentication request with a fresh id.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            id: sp_crypto::secure_id(),
            version: super::constants::SAML_VERSION.to_string(),
            issue_instant: Utc::now(),
            issuer: issuer.into(),
            destination: None,
            assertion_consumer_service_url: None,
            name_id_policy_format: None,
            allow_create: false,
            force_authn: false,
            is_passive: false,
        }
    }

    /// Sets the destination URL.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Sets the assertion consumer service URL.
    #[must_use]
    pub fn with_acs_url(mut self, url: impl Into<String>) -> Self {
        self.assertion_consumer_service_url = Some(url.into());
        self
    }

    /// Sets the requested NameID format.
    #[must_use]
    pub fn with_name_id_format(mut self, format: NameIdFormat) -> Self {
        self.name_id_policy_format = Some(format.uri().to_string());
        self
    }

    /// Sets force authentication.
    #[must_use]
    pub const fn force_authn(mut self, force: bool) -> Self {
        self.force_authn = force;
        self
    }

    /// Sets passive authentication.
    #[must_use]
    pub const fn is_passive(mut self, passive: bool) -> Self {
        self.is_passive = passive;
        self
    }

    /// Serializes the request (without an XML declaration).
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut attrs = String::new();
        if let Some(destination) = &self.destination {
            attrs.push_str(&format!(" Destination=\"{}\"", escape_xml(destination)));
        }
        if let Some(acs) = &self.assertion_consumer_service_url {
            attrs.push_str(&format!(
                " AssertionConsumerServiceURL=\"{}\"",
                escape_xml(acs)
            ));
        }
        if self.force_authn {
            attrs.push_str(" ForceAuthn=\"true\"");
        }
        if self.is_passive {
            attrs.push_str(" IsPassive=\"true\"");
        }

        let name_id_policy = self
            .name_id_policy_format
            .as_ref()
            .map(|format| {
                format!(
                    "<samlp:NameIDPolicy Format=\"{}\" AllowCreate=\"{}\"/>",
                    escape_xml(format),
                    self.allow_create
                )
            })
            .unwrap_or_default();

        format!(
            "<samlp:AuthnRequest xmlns:samlp=\"{}\" xmlns:saml=\"{}\" ID=\"{}\" Version=\"{}\" IssueInstant=\"{}\"{attrs}><saml:Issuer>{}</saml:Issuer>{name_id_policy}</samlp:AuthnRequest>",
            super::constants::SAMLP_NS,
            super::constants::SAML_NS,
            escape_xml(&self.id),
            escape_xml(&self.version),
            format_instant(self.issue_instant),
            escape_xml(&self.issuer),
        )
    }
}

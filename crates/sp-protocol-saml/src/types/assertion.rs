//! SAML Assertion types.
//!
//! Assertions contain statements about a subject made by an issuer. The
//! polymorphic slots of the schema (statements, conditions, the subject
//! identifier) are closed sum types dispatched by pattern matching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sp_crypto::VerificationKey;

use super::{format_instant, parse_instant, NameId};
use crate::xml::{escape_xml, XmlElement};

/// SAML Assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    /// Unique identifier for this assertion.
    pub id: String,

    /// Version of the SAML protocol (must be "2.0").
    pub version: String,

    /// Timestamp when this assertion was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_instant: Option<DateTime<Utc>>,

    /// The authority that issued this assertion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<NameId>,

    /// The subject of this assertion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,

    /// Conditions that gate the assertion's validity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,

    /// Statements, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statements: Vec<Statement>,

    /// Whether the assertion carries an embedded signature.
    #[serde(skip)]
    pub signed: bool,

    /// The trust key that verified the signature, recorded by the
    /// validation engine after a successful check.
    #[serde(skip)]
    pub signing_key: Option<VerificationKey>,

    /// The raw source slice of the assertion element. Signature digests
    /// are computed over this, never over a re-serialization.
    #[serde(skip)]
    pub source_xml: Option<String>,
}

impl Assertion {
    /// Creates a new assertion with a fresh id.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            id: sp_crypto::secure_id(),
            version: super::constants::SAML_VERSION.to_string(),
            issue_instant: Some(Utc::now()),
            issuer: Some(NameId::entity(issuer)),
            subject: None,
            conditions: None,
            statements: Vec::new(),
            signed: false,
            signing_key: None,
            source_xml: None,
        }
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Sets the conditions.
    #[must_use]
    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Appends a statement.
    #[must_use]
    pub fn with_statement(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    /// Parses a standalone assertion document.
    pub fn from_xml(xml: &str) -> crate::error::SamlResult<Self> {
        let element = XmlElement::parse(xml)?;
        if element.name != "Assertion" {
            return Err(crate::error::SamlError::InvalidMessage(format!(
                "expected Assertion, got {}",
                element.name
            )));
        }
        let mut assertion = Self::from_element(&element);
        assertion.source_xml = Some(xml.to_string());
        Ok(assertion)
    }

    /// Reads an `Assertion` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        let mut statements = Vec::new();
        for child in &element.children {
            match child.name.as_str() {
                "AuthnStatement" => {
                    statements.push(Statement::Authn(AuthnStatement::from_element(child)));
                }
                "AttributeStatement" => {
                    statements.push(Statement::Attribute(AttributeStatement::from_element(child)));
                }
                "AuthzDecisionStatement" => statements.push(Statement::AuthzDecision(
                    AuthzDecisionStatement::from_element(child),
                )),
                _ => {}
            }
        }

        Self {
            id: element.attr("ID").unwrap_or_default().to_string(),
            version: element.attr("Version").unwrap_or_default().to_string(),
            issue_instant: element.attr("IssueInstant").and_then(parse_instant),
            issuer: element.child("Issuer").map(NameId::from_element),
            subject: element.child("Subject").map(Subject::from_element),
            conditions: element.child("Conditions").map(Conditions::from_element),
            statements,
            signed: element.child("Signature").is_some(),
            signing_key: None,
            source_xml: None,
        }
    }

    /// Serializes the assertion (without an XML declaration).
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut body = String::new();
        if let Some(issuer) = &self.issuer {
            body.push_str(&issuer.to_xml("Issuer"));
        }
        if let Some(subject) = &self.subject {
            body.push_str(&subject.to_xml());
        }
        if let Some(conditions) = &self.conditions {
            body.push_str(&conditions.to_xml());
        }
        for statement in &self.statements {
            body.push_str(&statement.to_xml());
        }

        let issue_instant = self
            .issue_instant
            .map(|t| format!(" IssueInstant=\"{}\"", format_instant(t)))
            .unwrap_or_default();

        format!(
            "<saml:Assertion xmlns:saml=\"{}\" ID=\"{}\" Version=\"{}\"{issue_instant}>{body}</saml:Assertion>",
            super::constants::SAML_NS,
            escape_xml(&self.id),
            escape_xml(&self.version),
        )
    }

    /// Iterates over the assertion's authentication statements.
    pub fn authn_statements(&self) -> impl Iterator<Item = &AuthnStatement> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Authn(stmt) => Some(stmt),
            _ => None,
        })
    }

    /// Collects every attribute across attribute statements.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.statements
            .iter()
            .filter_map(|s| match s {
                Statement::Attribute(stmt) => Some(stmt),
                _ => None,
            })
            .flat_map(|stmt| stmt.attributes.iter())
    }
}

/// One statement inside an assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Statement {
    /// Authentication statement.
    Authn(AuthnStatement),
    /// Attribute statement.
    Attribute(AttributeStatement),
    /// Authorization decision statement.
    AuthzDecision(AuthzDecisionStatement),
}

impl Statement {
    fn to_xml(&self) -> String {
        match self {
            Self::Authn(stmt) => stmt.to_xml(),
            Self::Attribute(stmt) => stmt.to_xml(),
            Self::AuthzDecision(stmt) => stmt.to_xml(),
        }
    }
}

/// Subject of an assertion.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Subject {
    /// The subject's identifier, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<SubjectIdentifier>,

    /// Subject confirmations, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub confirmations: Vec<SubjectConfirmation>,
}

impl Subject {
    /// Creates a subject identified by a name ID.
    #[must_use]
    pub fn new(name_id: NameId) -> Self {
        Self {
            identifier: Some(SubjectIdentifier::NameId(name_id)),
            confirmations: Vec::new(),
        }
    }

    /// Adds a subject confirmation.
    #[must_use]
    pub fn with_confirmation(mut self, confirmation: SubjectConfirmation) -> Self {
        self.confirmations.push(confirmation);
        self
    }

    /// Returns the plain name ID if the subject carries one.
    #[must_use]
    pub fn name_id(&self) -> Option<&NameId> {
        match &self.identifier {
            Some(SubjectIdentifier::NameId(name_id)) => Some(name_id),
            _ => None,
        }
    }

    /// Reads a `Subject` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        let identifier = if let Some(name_id) = element.child("NameID") {
            Some(SubjectIdentifier::NameId(NameId::from_element(name_id)))
        } else {
            element
                .child("EncryptedID")
                .map(|enc| SubjectIdentifier::Encrypted(EncryptedId::from_element(enc)))
        };

        Self {
            identifier,
            confirmations: element
                .children_named("SubjectConfirmation")
                .map(SubjectConfirmation::from_element)
                .collect(),
        }
    }

    fn to_xml(&self) -> String {
        let mut body = String::new();
        match &self.identifier {
            Some(SubjectIdentifier::NameId(name_id)) => body.push_str(&name_id.to_xml("NameID")),
            Some(SubjectIdentifier::Encrypted(enc)) => {
                body.push_str(&format!("<saml:EncryptedID>{}</saml:EncryptedID>", enc.xml));
            }
            None => {}
        }
        for confirmation in &self.confirmations {
            body.push_str(&confirmation.to_xml());
        }
        format!("<saml:Subject>{body}</saml:Subject>")
    }
}

/// The identifier slot of a subject: plain or encrypted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SubjectIdentifier {
    /// A plain name identifier.
    NameId(NameId),
    /// An encrypted identifier, kept opaque.
    Encrypted(EncryptedId),
}

/// An EncryptedID element, carried as raw XML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedId {
    /// The element's inner XML.
    pub xml: String,
}

impl EncryptedId {
    fn from_element(element: &XmlElement) -> Self {
        // The ciphertext structure is opaque to subject handling; keep the
        // cipher value so callers can hand it to the decryption engine.
        let cipher_value = element
            .child("EncryptedData")
            .and_then(|d| d.child("CipherData"))
            .and_then(|c| c.child("CipherValue"))
            .map(|v| v.text_trimmed().to_string())
            .unwrap_or_default();
        Self { xml: cipher_value }
    }
}

/// Subject confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectConfirmation {
    /// The confirmation method URI.
    pub method: String,

    /// Additional confirmation data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SubjectConfirmationData>,
}

impl SubjectConfirmation {
    /// Creates a bearer confirmation.
    #[must_use]
    pub fn bearer() -> Self {
        Self {
            method: super::constants::confirmation_methods::BEARER.to_string(),
            data: None,
        }
    }

    /// Sets the confirmation data.
    #[must_use]
    pub fn with_data(mut self, data: SubjectConfirmationData) -> Self {
        self.data = Some(data);
        self
    }

    /// Reads a `SubjectConfirmation` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        Self {
            method: element.attr("Method").unwrap_or_default().to_string(),
            data: element
                .child("SubjectConfirmationData")
                .map(SubjectConfirmationData::from_element),
        }
    }

    fn to_xml(&self) -> String {
        let data = self.data.as_ref().map(SubjectConfirmationData::to_xml).unwrap_or_default();
        format!(
            "<saml:SubjectConfirmation Method=\"{}\">{data}</saml:SubjectConfirmation>",
            escape_xml(&self.method)
        )
    }
}

/// Subject confirmation data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectConfirmationData {
    /// Time before which the subject cannot be confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,

    /// Time at or after which the subject can no longer be confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,

    /// The location the assertion may be presented to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,

    /// The request ID this assertion answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// Network address of the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Raw embedded key descriptor, required by holder-of-key confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_info: Option<String>,
}

impl SubjectConfirmationData {
    /// Creates confirmation data answering a request.
    #[must_use]
    pub fn for_request(request_id: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            in_response_to: Some(request_id.into()),
            recipient: Some(recipient.into()),
            not_on_or_after: Some(Utc::now() + chrono::Duration::minutes(5)),
            ..Self::default()
        }
    }

    /// Reads a `SubjectConfirmationData` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        Self {
            not_before: element.attr("NotBefore").and_then(parse_instant),
            not_on_or_after: element.attr("NotOnOrAfter").and_then(parse_instant),
            recipient: element.attr("Recipient").map(str::to_string),
            in_response_to: element.attr("InResponseTo").map(str::to_string),
            address: element.attr("Address").map(str::to_string),
            key_info: element
                .child("KeyInfo")
                .map(|k| k.text_trimmed().to_string())
                .filter(|t| !t.is_empty()),
        }
    }

    fn to_xml(&self) -> String {
        let mut attrs = String::new();
        if let Some(t) = self.not_before {
            attrs.push_str(&format!(" NotBefore=\"{}\"", format_instant(t)));
        }
        if let Some(t) = self.not_on_or_after {
            attrs.push_str(&format!(" NotOnOrAfter=\"{}\"", format_instant(t)));
        }
        if let Some(r) = &self.recipient {
            attrs.push_str(&format!(" Recipient=\"{}\"", escape_xml(r)));
        }
        if let Some(r) = &self.in_response_to {
            attrs.push_str(&format!(" InResponseTo=\"{}\"", escape_xml(r)));
        }
        if let Some(a) = &self.address {
            attrs.push_str(&format!(" Address=\"{}\"", escape_xml(a)));
        }
        match &self.key_info {
            Some(key_info) => format!(
                "<saml:SubjectConfirmationData{attrs}><ds:KeyInfo xmlns:ds=\"{}\">{}</ds:KeyInfo></saml:SubjectConfirmationData>",
                super::constants::XMLDSIG_NS,
                escape_xml(key_info)
            ),
            None => format!("<saml:SubjectConfirmationData{attrs}/>"),
        }
    }
}

/// Conditions gating assertion validity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conditions {
    /// Time before which the assertion is not valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,

    /// Time at or after which the assertion is not valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,

    /// Condition elements, in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl Conditions {
    /// Creates conditions valid from now for the given number of minutes.
    #[must_use]
    pub fn with_validity(validity_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            not_before: Some(now),
            not_on_or_after: Some(now + chrono::Duration::minutes(validity_minutes)),
            conditions: Vec::new(),
        }
    }

    /// Adds an audience restriction with a single audience.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.conditions
            .push(Condition::AudienceRestriction(AudienceRestriction {
                audiences: vec![audience.into()],
            }));
        self
    }

    /// Adds a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Iterates over the audience restrictions.
    pub fn audience_restrictions(&self) -> impl Iterator<Item = &AudienceRestriction> {
        self.conditions.iter().filter_map(|c| match c {
            Condition::AudienceRestriction(r) => Some(r),
            _ => None,
        })
    }

    /// Counts OneTimeUse conditions.
    #[must_use]
    pub fn one_time_use_count(&self) -> usize {
        self.conditions
            .iter()
            .filter(|c| matches!(c, Condition::OneTimeUse))
            .count()
    }

    /// Counts ProxyRestriction conditions.
    #[must_use]
    pub fn proxy_restriction_count(&self) -> usize {
        self.conditions
            .iter()
            .filter(|c| matches!(c, Condition::ProxyRestriction(_)))
            .count()
    }

    /// Reads a `Conditions` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        let mut conditions = Vec::new();
        for child in &element.children {
            match child.name.as_str() {
                "AudienceRestriction" => {
                    conditions.push(Condition::AudienceRestriction(AudienceRestriction {
                        audiences: child
                            .children_named("Audience")
                            .map(|a| a.text_trimmed().to_string())
                            .collect(),
                    }));
                }
                "OneTimeUse" => conditions.push(Condition::OneTimeUse),
                "ProxyRestriction" => {
                    conditions.push(Condition::ProxyRestriction(ProxyRestriction {
                        count: child.attr("Count").and_then(|c| c.parse().ok()),
                        audiences: child
                            .children_named("Audience")
                            .map(|a| a.text_trimmed().to_string())
                            .collect(),
                    }));
                }
                _ => {}
            }
        }

        Self {
            not_before: element.attr("NotBefore").and_then(parse_instant),
            not_on_or_after: element.attr("NotOnOrAfter").and_then(parse_instant),
            conditions,
        }
    }

    fn to_xml(&self) -> String {
        let mut attrs = String::new();
        if let Some(t) = self.not_before {
            attrs.push_str(&format!(" NotBefore=\"{}\"", format_instant(t)));
        }
        if let Some(t) = self.not_on_or_after {
            attrs.push_str(&format!(" NotOnOrAfter=\"{}\"", format_instant(t)));
        }

        let mut body = String::new();
        for condition in &self.conditions {
            match condition {
                Condition::AudienceRestriction(r) => {
                    let audiences: String = r
                        .audiences
                        .iter()
                        .map(|a| format!("<saml:Audience>{}</saml:Audience>", escape_xml(a)))
                        .collect();
                    body.push_str(&format!(
                        "<saml:AudienceRestriction>{audiences}</saml:AudienceRestriction>"
                    ));
                }
                Condition::OneTimeUse => body.push_str("<saml:OneTimeUse/>"),
                Condition::ProxyRestriction(r) => {
                    let count = r
                        .count
                        .map(|c| format!(" Count=\"{c}\""))
                        .unwrap_or_default();
                    let audiences: String = r
                        .audiences
                        .iter()
                        .map(|a| format!("<saml:Audience>{}</saml:Audience>", escape_xml(a)))
                        .collect();
                    body.push_str(&format!(
                        "<saml:ProxyRestriction{count}>{audiences}</saml:ProxyRestriction>"
                    ));
                }
            }
        }

        format!("<saml:Conditions{attrs}>{body}</saml:Conditions>")
    }
}

/// One condition inside a `Conditions` element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Condition {
    /// Restricts the audiences that may rely on the assertion.
    AudienceRestriction(AudienceRestriction),
    /// The assertion must be used at most once.
    OneTimeUse,
    /// Restricts onward proxying of the assertion.
    ProxyRestriction(ProxyRestriction),
}

/// Audience restriction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudienceRestriction {
    /// Acceptable audience URIs.
    pub audiences: Vec<String>,
}

/// Proxy restriction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyRestriction {
    /// Maximum number of proxies allowed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Audiences a proxy may serve.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audiences: Vec<String>,
}

/// Authentication statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthnStatement {
    /// The time of authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authn_instant: Option<DateTime<Utc>>,

    /// The session index for logout correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_index: Option<String>,

    /// Time at which the authenticated session ends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_not_on_or_after: Option<DateTime<Utc>>,

    /// The authentication context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authn_context: Option<AuthnContext>,
}

impl AuthnStatement {
    /// Reads an `AuthnStatement` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        Self {
            authn_instant: element.attr("AuthnInstant").and_then(parse_instant),
            session_index: element.attr("SessionIndex").map(str::to_string),
            session_not_on_or_after: element.attr("SessionNotOnOrAfter").and_then(parse_instant),
            authn_context: element.child("AuthnContext").map(AuthnContext::from_element),
        }
    }

    fn to_xml(&self) -> String {
        let mut attrs = String::new();
        if let Some(t) = self.authn_instant {
            attrs.push_str(&format!(" AuthnInstant=\"{}\"", format_instant(t)));
        }
        if let Some(i) = &self.session_index {
            attrs.push_str(&format!(" SessionIndex=\"{}\"", escape_xml(i)));
        }
        if let Some(t) = self.session_not_on_or_after {
            attrs.push_str(&format!(" SessionNotOnOrAfter=\"{}\"", format_instant(t)));
        }
        let context = self
            .authn_context
            .as_ref()
            .map(AuthnContext::to_xml)
            .unwrap_or_default();
        format!("<saml:AuthnStatement{attrs}>{context}</saml:AuthnStatement>")
    }
}

/// Authentication context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthnContext {
    /// Context class reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_ref: Option<String>,

    /// Context declaration reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decl_ref: Option<String>,

    /// Inline context declaration. Present in the schema but not supported
    /// by the validation engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decl: Option<String>,
}

impl AuthnContext {
    /// Creates a context with only a class reference.
    #[must_use]
    pub fn class_ref(uri: impl Into<String>) -> Self {
        Self {
            class_ref: Some(uri.into()),
            decl_ref: None,
            decl: None,
        }
    }

    /// Reads an `AuthnContext` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        Self {
            class_ref: element
                .child("AuthnContextClassRef")
                .map(|c| c.text_trimmed().to_string()),
            decl_ref: element
                .child("AuthnContextDeclRef")
                .map(|c| c.text_trimmed().to_string()),
            decl: element
                .child("AuthnContextDecl")
                .map(|c| c.text_trimmed().to_string()),
        }
    }

    fn to_xml(&self) -> String {
        let mut body = String::new();
        if let Some(class_ref) = &self.class_ref {
            body.push_str(&format!(
                "<saml:AuthnContextClassRef>{}</saml:AuthnContextClassRef>",
                escape_xml(class_ref)
            ));
        }
        if let Some(decl_ref) = &self.decl_ref {
            body.push_str(&format!(
                "<saml:AuthnContextDeclRef>{}</saml:AuthnContextDeclRef>",
                escape_xml(decl_ref)
            ));
        }
        format!("<saml:AuthnContext>{body}</saml:AuthnContext>")
    }
}

/// Attribute statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeStatement {
    /// The attributes asserted about the subject.
    pub attributes: Vec<Attribute>,
}

impl AttributeStatement {
    /// Creates an empty attribute statement.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.attributes.push(attr);
        self
    }

    /// Reads an `AttributeStatement` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        Self {
            attributes: element
                .children_named("Attribute")
                .map(Attribute::from_element)
                .collect(),
        }
    }

    fn to_xml(&self) -> String {
        let body: String = self.attributes.iter().map(Attribute::to_xml).collect();
        format!("<saml:AttributeStatement>{body}</saml:AttributeStatement>")
    }
}

/// SAML Attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    /// The attribute name.
    pub name: String,

    /// The format of the attribute name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_format: Option<String>,

    /// A human-readable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,

    /// The attribute values.
    pub values: Vec<String>,
}

impl Attribute {
    /// Creates an attribute with a single value.
    #[must_use]
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_format: None,
            friendly_name: None,
            values: vec![value.into()],
        }
    }

    /// Creates an attribute with multiple values.
    #[must_use]
    pub fn multi(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            name_format: None,
            friendly_name: None,
            values,
        }
    }

    /// Reads an `Attribute` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        Self {
            name: element.attr("Name").unwrap_or_default().to_string(),
            name_format: element.attr("NameFormat").map(str::to_string),
            friendly_name: element.attr("FriendlyName").map(str::to_string),
            values: element
                .children_named("AttributeValue")
                .map(|v| v.text_trimmed().to_string())
                .collect(),
        }
    }

    fn to_xml(&self) -> String {
        let mut attrs = format!(" Name=\"{}\"", escape_xml(&self.name));
        if let Some(f) = &self.name_format {
            attrs.push_str(&format!(" NameFormat=\"{}\"", escape_xml(f)));
        }
        if let Some(f) = &self.friendly_name {
            attrs.push_str(&format!(" FriendlyName=\"{}\"", escape_xml(f)));
        }
        let values: String = self
            .values
            .iter()
            .map(|v| format!("<saml:AttributeValue>{}</saml:AttributeValue>", escape_xml(v)))
            .collect();
        format!("<saml:Attribute{attrs}>{values}</saml:Attribute>")
    }
}

/// Authorization decision statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthzDecisionStatement {
    /// The resource the decision applies to (absolute URI, or empty).
    pub resource: String,

    /// The decision value (Permit, Deny, Indeterminate).
    pub decision: String,

    /// The actions the decision covers.
    pub actions: Vec<Action>,
}

impl AuthzDecisionStatement {
    /// Reads an `AuthzDecisionStatement` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Self {
        Self {
            resource: element.attr("Resource").unwrap_or_default().to_string(),
            decision: element.attr("Decision").unwrap_or_default().to_string(),
            actions: element
                .children_named("Action")
                .map(|a| Action {
                    namespace: a.attr("Namespace").map(str::to_string),
                    value: a.text_trimmed().to_string(),
                })
                .collect(),
        }
    }

    fn to_xml(&self) -> String {
        let actions: String = self
            .actions
            .iter()
            .map(|a| {
                let namespace = a
                    .namespace
                    .as_ref()
                    .map(|n| format!(" Namespace=\"{}\"", escape_xml(n)))
                    .unwrap_or_default();
                format!("<saml:Action{namespace}>{}</saml:Action>", escape_xml(&a.value))
            })
            .collect();
        format!(
            "<saml:AuthzDecisionStatement Resource=\"{}\" Decision=\"{}\">{actions}</saml:AuthzDecisionStatement>",
            escape_xml(&self.resource),
            escape_xml(&self.decision)
        )
    }
}

/// An action inside an authorization decision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Action {
    /// The action namespace URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// The action value.
    pub value: String,
}

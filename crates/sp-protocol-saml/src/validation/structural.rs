//! Structural assertion validation.
//!
//! Enforces the schema-level and profile-level rules an assertion must
//! satisfy before its contents may be trusted. Validation fails fast on
//! the first violated rule.

use crate::error::{SamlError, SamlResult};
use crate::types::constants::{confirmation_methods, NameIdFormat, SAML_VERSION};
use crate::types::{Assertion, AuthnStatement, AuthzDecisionStatement, AttributeStatement, NameId, Statement, Subject};

/// Minimum identifier length. SAML identifiers must carry at least 128
/// bits of entropy; shorter values cannot.
const MIN_ID_LENGTH: usize = 16;

/// Validates the structure of an assertion.
pub(crate) fn validate_structure(
    assertion: &Assertion,
    allowed_audiences: &[String],
) -> SamlResult<()> {
    if assertion.version != SAML_VERSION {
        return Err(SamlError::InvalidAssertion(format!(
            "unsupported SAML version: '{}'",
            assertion.version
        )));
    }

    if assertion.id.is_empty() {
        return Err(SamlError::InvalidAssertion("ID is required".to_string()));
    }
    if assertion.id.len() < MIN_ID_LENGTH {
        return Err(SamlError::InvalidAssertion(format!(
            "ID must be at least {MIN_ID_LENGTH} characters"
        )));
    }

    if assertion.issue_instant.is_none() {
        return Err(SamlError::InvalidAssertion(
            "IssueInstant is required".to_string(),
        ));
    }

    let issuer = assertion
        .issuer
        .as_ref()
        .ok_or_else(|| SamlError::InvalidAssertion("Issuer is required".to_string()))?;
    validate_name_id(issuer).map_err(|e| match e {
        SamlError::InvalidAssertion(m) => SamlError::InvalidAssertion(format!("Issuer: {m}")),
        other => other,
    })?;

    validate_subject_presence(assertion)?;
    if let Some(subject) = &assertion.subject {
        validate_subject(subject)?;
    }

    if let Some(conditions) = &assertion.conditions {
        validate_conditions(conditions, allowed_audiences)?;
    }

    for statement in &assertion.statements {
        match statement {
            Statement::Authn(stmt) => validate_authn_statement(stmt)?,
            Statement::Attribute(stmt) => validate_attribute_statement(stmt)?,
            Statement::AuthzDecision(stmt) => validate_authz_statement(stmt)?,
        }
    }

    Ok(())
}

/// Validates a name identifier against its declared format.
pub(crate) fn validate_name_id(name_id: &NameId) -> SamlResult<()> {
    if name_id.value.is_empty() {
        return Err(SamlError::InvalidAssertion("NameID value is empty".to_string()));
    }

    if let Some(format) = &name_id.format {
        if !is_absolute_uri(format) {
            return Err(SamlError::InvalidAssertion(format!(
                "NameID format is not an absolute URI: '{format}'"
            )));
        }
    }

    match name_id.parsed_format() {
        NameIdFormat::Email => {
            if !is_valid_email(&name_id.value) {
                return Err(SamlError::InvalidAssertion(format!(
                    "'{}' is not a valid email address",
                    name_id.value
                )));
            }
        }
        NameIdFormat::Persistent | NameIdFormat::Transient => {
            if name_id.value.len() < MIN_ID_LENGTH {
                return Err(SamlError::InvalidAssertion(format!(
                    "persistent/transient identifier must be at least {MIN_ID_LENGTH} characters"
                )));
            }
            if name_id.value.len() > 256 {
                return Err(SamlError::InvalidAssertion(
                    "persistent/transient identifier exceeds 256 characters".to_string(),
                ));
            }
        }
        NameIdFormat::Entity => {
            if name_id.value.len() > 1024 {
                return Err(SamlError::InvalidAssertion(
                    "entity identifier exceeds 1024 characters".to_string(),
                ));
            }
            if name_id.name_qualifier.is_some()
                || name_id.sp_name_qualifier.is_some()
                || name_id.sp_provided_id.is_some()
            {
                return Err(SamlError::InvalidAssertion(
                    "entity identifiers must not carry qualifiers".to_string(),
                ));
            }
        }
        _ => {}
    }

    Ok(())
}

/// A Subject is required when the assertion has no statements, and also
/// whenever an authentication, attribute or authorization statement is
/// present.
fn validate_subject_presence(assertion: &Assertion) -> SamlResult<()> {
    let needs_subject = assertion.statements.is_empty()
        || assertion.statements.iter().any(|s| {
            matches!(
                s,
                Statement::Authn(_) | Statement::Attribute(_) | Statement::AuthzDecision(_)
            )
        });

    if needs_subject && assertion.subject.is_none() {
        return Err(SamlError::InvalidAssertion("Subject is required".to_string()));
    }
    Ok(())
}

fn validate_subject(subject: &Subject) -> SamlResult<()> {
    if subject.identifier.is_none() && subject.confirmations.is_empty() {
        return Err(SamlError::InvalidAssertion(
            "Subject needs a NameID, an EncryptedID or a SubjectConfirmation".to_string(),
        ));
    }

    if let Some(name_id) = subject.name_id() {
        validate_name_id(name_id)?;
    }

    for confirmation in &subject.confirmations {
        if confirmation.method.is_empty() || !is_absolute_uri(&confirmation.method) {
            return Err(SamlError::InvalidAssertion(format!(
                "SubjectConfirmation method is not an absolute URI: '{}'",
                confirmation.method
            )));
        }

        if confirmation.method == confirmation_methods::HOLDER_OF_KEY {
            let has_key = confirmation
                .data
                .as_ref()
                .and_then(|data| data.key_info.as_deref())
                .is_some_and(|key| !key.trim().is_empty());
            if !has_key {
                return Err(SamlError::InvalidAssertion(
                    "holder-of-key confirmation requires an embedded key descriptor".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_conditions(
    conditions: &crate::types::Conditions,
    allowed_audiences: &[String],
) -> SamlResult<()> {
    if let (Some(not_before), Some(not_on_or_after)) =
        (conditions.not_before, conditions.not_on_or_after)
    {
        if not_before >= not_on_or_after {
            return Err(SamlError::ConditionsNotMet(
                "NotBefore must be strictly earlier than NotOnOrAfter".to_string(),
            ));
        }
    }

    if conditions.one_time_use_count() > 1 {
        return Err(SamlError::ConditionsNotMet(
            "at most one OneTimeUse condition is allowed".to_string(),
        ));
    }
    if conditions.proxy_restriction_count() > 1 {
        return Err(SamlError::ConditionsNotMet(
            "at most one ProxyRestriction condition is allowed".to_string(),
        ));
    }

    // Within one restriction any listed audience may match (OR); across
    // restrictions every one must independently match (AND).
    for restriction in conditions.audience_restrictions() {
        if allowed_audiences.is_empty() {
            return Err(SamlError::InvalidAudience(
                "assertion restricts audiences but none are configured as allowed".to_string(),
            ));
        }
        let matched = restriction
            .audiences
            .iter()
            .any(|audience| allowed_audiences.iter().any(|allowed| allowed == audience));
        if !matched {
            return Err(SamlError::InvalidAudience(format!(
                "no allowed audience among [{}]",
                restriction.audiences.join(", ")
            )));
        }
    }

    Ok(())
}

fn validate_authn_statement(statement: &AuthnStatement) -> SamlResult<()> {
    if statement.authn_instant.is_none() {
        return Err(SamlError::InvalidAssertion(
            "AuthnStatement requires AuthnInstant".to_string(),
        ));
    }

    let context = statement.authn_context.as_ref().ok_or_else(|| {
        SamlError::InvalidAssertion("AuthnStatement requires AuthnContext".to_string())
    })?;

    if context.decl.is_some() {
        return Err(SamlError::InvalidAssertion(
            "inline AuthnContext declarations are not supported".to_string(),
        ));
    }
    if context.class_ref.is_none() && context.decl_ref.is_none() {
        return Err(SamlError::InvalidAssertion(
            "AuthnContext needs a class reference or a declaration reference".to_string(),
        ));
    }
    if let Some(class_ref) = &context.class_ref {
        if class_ref.is_empty() {
            return Err(SamlError::InvalidAssertion(
                "AuthnContextClassRef is empty".to_string(),
            ));
        }
    }
    if let Some(decl_ref) = &context.decl_ref {
        if decl_ref.is_empty() {
            return Err(SamlError::InvalidAssertion(
                "AuthnContextDeclRef is empty".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_attribute_statement(statement: &AttributeStatement) -> SamlResult<()> {
    if statement.attributes.is_empty() {
        return Err(SamlError::InvalidAssertion(
            "AttributeStatement requires at least one attribute".to_string(),
        ));
    }
    for attribute in &statement.attributes {
        if attribute.name.trim().is_empty() {
            return Err(SamlError::InvalidAssertion(
                "attribute name is blank".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_authz_statement(statement: &AuthzDecisionStatement) -> SamlResult<()> {
    if !statement.resource.is_empty() && !is_absolute_uri(&statement.resource) {
        return Err(SamlError::InvalidAssertion(format!(
            "AuthzDecisionStatement resource is not an absolute URI: '{}'",
            statement.resource
        )));
    }

    if statement.actions.is_empty() {
        return Err(SamlError::InvalidAssertion(
            "AuthzDecisionStatement requires at least one action".to_string(),
        ));
    }
    for action in &statement.actions {
        let namespace = action.namespace.as_deref().unwrap_or("");
        if namespace.trim().is_empty() || !is_absolute_uri(namespace) {
            return Err(SamlError::InvalidAssertion(
                "action namespace must be a non-blank absolute URI".to_string(),
            ));
        }
    }

    Ok(())
}

fn is_absolute_uri(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

/// Shallow RFC-2822 shape check: exactly one `@`, a non-empty local part,
/// a dotted domain, no whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.len() <= 5 || email.contains(' ') {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Action, Attribute, AuthnContext, Condition, Conditions, Statement, Subject,
        SubjectConfirmation, SubjectConfirmationData,
    };
    use chrono::Utc;

    fn base_assertion() -> Assertion {
        Assertion::new("https://idp.example.com")
            .with_subject(Subject::new(NameId::email("user@example.com")))
    }

    fn check(assertion: &Assertion) -> SamlResult<()> {
        validate_structure(assertion, &["https://sp.example.com".to_string()])
    }

    #[test]
    fn well_formed_assertion_passes() {
        check(&base_assertion()).unwrap();
    }

    #[test]
    fn wrong_version_fails() {
        let mut assertion = base_assertion();
        assertion.version = "1.1".to_string();
        assert!(check(&assertion).is_err());
    }

    #[test]
    fn short_or_empty_id_fails() {
        let mut assertion = base_assertion();
        assertion.id = String::new();
        assert!(check(&assertion).is_err());

        let mut assertion = base_assertion();
        assertion.id = "_short".to_string();
        assert!(check(&assertion).is_err());
    }

    #[test]
    fn missing_issue_instant_fails() {
        let mut assertion = base_assertion();
        assertion.issue_instant = None;
        assert!(check(&assertion).is_err());
    }

    #[test]
    fn missing_issuer_fails() {
        let mut assertion = base_assertion();
        assertion.issuer = None;
        assert!(check(&assertion).is_err());
    }

    #[test]
    fn missing_subject_fails_with_and_without_statements() {
        let mut assertion = base_assertion();
        assertion.subject = None;
        assert!(check(&assertion).is_err());

        let mut with_statement = base_assertion().with_statement(Statement::Attribute(
            AttributeStatement::new().with_attribute(Attribute::single("a", "1")),
        ));
        with_statement.subject = None;
        assert!(check(&with_statement).is_err());
    }

    #[test]
    fn empty_subject_fails() {
        let mut assertion = base_assertion();
        assertion.subject = Some(Subject::default());
        assert!(check(&assertion).is_err());
    }

    #[test]
    fn email_name_id_must_look_like_email() {
        let mut assertion = base_assertion();
        assertion.subject = Some(Subject::new(NameId::email("not-an-email")));
        assert!(check(&assertion).is_err());
    }

    #[test]
    fn persistent_name_id_length_limits() {
        let mut assertion = base_assertion();
        assertion.subject = Some(Subject::new(NameId::persistent("x".repeat(300))));
        assert!(check(&assertion).is_err());

        let mut assertion = base_assertion();
        assertion.subject = Some(Subject::new(NameId::persistent("tooshort")));
        assert!(check(&assertion).is_err());

        let mut assertion = base_assertion();
        assertion.subject = Some(Subject::new(NameId::persistent("x".repeat(64))));
        check(&assertion).unwrap();
    }

    #[test]
    fn entity_issuer_rejects_qualifiers_and_overlong_values() {
        let mut assertion = base_assertion();
        assertion.issuer =
            Some(NameId::entity("https://idp.example.com").with_name_qualifier("qualifier"));
        assert!(check(&assertion).is_err());

        let mut assertion = base_assertion();
        assertion.issuer = Some(NameId::entity(format!(
            "https://idp.example.com/{}",
            "x".repeat(1024)
        )));
        assert!(check(&assertion).is_err());
    }

    #[test]
    fn confirmation_method_must_be_absolute_uri() {
        let mut assertion = base_assertion();
        assertion.subject = Some(Subject::new(NameId::email("user@example.com")).with_confirmation(
            SubjectConfirmation {
                method: "bearer".to_string(),
                data: None,
            },
        ));
        assert!(check(&assertion).is_err());
    }

    #[test]
    fn holder_of_key_requires_key_descriptor() {
        let confirmation = SubjectConfirmation {
            method: confirmation_methods::HOLDER_OF_KEY.to_string(),
            data: None,
        };
        let mut assertion = base_assertion();
        assertion.subject =
            Some(Subject::new(NameId::email("user@example.com")).with_confirmation(confirmation));
        assert!(check(&assertion).is_err());

        let confirmation = SubjectConfirmation {
            method: confirmation_methods::HOLDER_OF_KEY.to_string(),
            data: Some(SubjectConfirmationData {
                key_info: Some("MIIBkey".to_string()),
                ..SubjectConfirmationData::default()
            }),
        };
        let mut assertion = base_assertion();
        assertion.subject =
            Some(Subject::new(NameId::email("user@example.com")).with_confirmation(confirmation));
        check(&assertion).unwrap();
    }

    #[test]
    fn inverted_condition_window_fails() {
        let now = Utc::now();
        let mut assertion = base_assertion();
        assertion.conditions = Some(Conditions {
            not_before: Some(now),
            not_on_or_after: Some(now - chrono::Duration::minutes(5)),
            conditions: Vec::new(),
        });
        assert!(check(&assertion).is_err());
    }

    #[test]
    fn duplicate_one_time_use_fails() {
        let mut assertion = base_assertion();
        assertion.conditions = Some(
            Conditions::default()
                .with_condition(Condition::OneTimeUse)
                .with_condition(Condition::OneTimeUse),
        );
        assert!(check(&assertion).is_err());
    }

    #[test]
    fn audience_and_or_semantics() {
        let allowed = vec!["https://sp.example.com".to_string()];

        // OR inside one restriction: one listed audience matching is enough.
        let assertion = base_assertion().with_conditions(
            Conditions::default().with_condition(Condition::AudienceRestriction(
                crate::types::AudienceRestriction {
                    audiences: vec![
                        "https://other.example.com".to_string(),
                        "https://sp.example.com".to_string(),
                    ],
                },
            )),
        );
        validate_structure(&assertion, &allowed).unwrap();

        // AND across restrictions: every restriction must match.
        let both_match = base_assertion().with_conditions(
            Conditions::default()
                .with_audience("https://sp.example.com")
                .with_condition(Condition::AudienceRestriction(
                    crate::types::AudienceRestriction {
                        audiences: vec![
                            "https://sp.example.com".to_string(),
                            "https://extra.example.com".to_string(),
                        ],
                    },
                )),
        );
        validate_structure(&both_match, &allowed).unwrap();

        let one_fails = base_assertion().with_conditions(
            Conditions::default()
                .with_audience("https://sp.example.com")
                .with_audience("https://other.example.com"),
        );
        assert!(matches!(
            validate_structure(&one_fails, &allowed),
            Err(SamlError::InvalidAudience(_))
        ));
    }

    #[test]
    fn restriction_with_no_configured_audiences_fails() {
        let assertion =
            base_assertion().with_conditions(Conditions::default().with_audience("https://sp.example.com"));
        assert!(matches!(
            validate_structure(&assertion, &[]),
            Err(SamlError::InvalidAudience(_))
        ));
    }

    #[test]
    fn authn_statement_rules() {
        // Missing instant.
        let assertion = base_assertion().with_statement(Statement::Authn(AuthnStatement {
            authn_instant: None,
            authn_context: Some(AuthnContext::class_ref("urn:x")),
            ..AuthnStatement::default()
        }));
        assert!(check(&assertion).is_err());

        // Missing context items.
        let assertion = base_assertion().with_statement(Statement::Authn(AuthnStatement {
            authn_instant: Some(Utc::now()),
            authn_context: Some(AuthnContext::default()),
            ..AuthnStatement::default()
        }));
        assert!(check(&assertion).is_err());

        // Inline declaration is unsupported.
        let assertion = base_assertion().with_statement(Statement::Authn(AuthnStatement {
            authn_instant: Some(Utc::now()),
            authn_context: Some(AuthnContext {
                class_ref: Some("urn:x".to_string()),
                decl_ref: None,
                decl: Some("<Decl/>".to_string()),
            }),
            ..AuthnStatement::default()
        }));
        assert!(check(&assertion).is_err());

        // Class ref plus decl ref is fine.
        let assertion = base_assertion().with_statement(Statement::Authn(AuthnStatement {
            authn_instant: Some(Utc::now()),
            authn_context: Some(AuthnContext {
                class_ref: Some("urn:x".to_string()),
                decl_ref: Some("urn:y".to_string()),
                decl: None,
            }),
            ..AuthnStatement::default()
        }));
        check(&assertion).unwrap();
    }

    #[test]
    fn attribute_statement_rules() {
        let assertion =
            base_assertion().with_statement(Statement::Attribute(AttributeStatement::new()));
        assert!(check(&assertion).is_err());

        let assertion = base_assertion().with_statement(Statement::Attribute(
            AttributeStatement::new().with_attribute(Attribute::single("  ", "v")),
        ));
        assert!(check(&assertion).is_err());
    }

    #[test]
    fn authz_statement_rules() {
        let good = AuthzDecisionStatement {
            resource: "https://sp.example.com/doc".to_string(),
            decision: "Permit".to_string(),
            actions: vec![Action {
                namespace: Some("urn:oasis:names:tc:SAML:1.0:action:rwedc".to_string()),
                value: "Read".to_string(),
            }],
        };
        check(&base_assertion().with_statement(Statement::AuthzDecision(good.clone()))).unwrap();

        // Empty resource is allowed.
        let mut empty_resource = good.clone();
        empty_resource.resource = String::new();
        check(&base_assertion().with_statement(Statement::AuthzDecision(empty_resource))).unwrap();

        // Relative resource is not.
        let mut relative = good.clone();
        relative.resource = "relative/path".to_string();
        assert!(check(&base_assertion().with_statement(Statement::AuthzDecision(relative))).is_err());

        // Actions are required, with absolute-URI namespaces.
        let mut no_actions = good.clone();
        no_actions.actions.clear();
        assert!(check(&base_assertion().with_statement(Statement::AuthzDecision(no_actions))).is_err());

        let mut bad_namespace = good;
        bad_namespace.actions[0].namespace = None;
        assert!(
            check(&base_assertion().with_statement(Statement::AuthzDecision(bad_namespace))).is_err()
        );
    }

    #[test]
    fn email_shape_checks() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("with space@example.com"));
    }

    #[test]
    fn absolute_uri_checks() {
        assert!(is_absolute_uri("https://sp.example.com"));
        assert!(is_absolute_uri("urn:oasis:names:tc:SAML:2.0:cm:bearer"));
        assert!(!is_absolute_uri("relative/path"));
        assert!(!is_absolute_uri(""));
    }
}

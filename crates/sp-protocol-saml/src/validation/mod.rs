//! Assertion validation engine.
//!
//! An assertion moves through signature checking, structural validation
//! and time validation before it is accepted; the first violated rule
//! rejects it. The steps are independently callable because callers
//! routinely re-check time bounds on a cached, already signature-verified
//! assertion without repeating the cryptographic work.

mod structural;
mod time;

use chrono::{DateTime, Duration, Utc};
use sp_crypto::VerificationKey;
use tracing::debug;

use crate::error::{SamlError, SamlResult};
use crate::signature::XmlSignatureValidator;
use crate::types::Assertion;

/// Validator for inbound assertions.
pub struct AssertionValidator {
    signature_validator: XmlSignatureValidator,
    allowed_audiences: Vec<String>,
    clock_skew: Duration,
}

impl AssertionValidator {
    /// Creates a validator trusting the given verification keys.
    #[must_use]
    pub fn new(trust_keys: Vec<VerificationKey>) -> Self {
        Self {
            signature_validator: XmlSignatureValidator::new(trust_keys),
            allowed_audiences: Vec::new(),
            clock_skew: Duration::zero(),
        }
    }

    /// Adds an audience this service provider accepts.
    #[must_use]
    pub fn with_allowed_audience(mut self, audience: impl Into<String>) -> Self {
        self.allowed_audiences.push(audience.into());
        self
    }

    /// Sets the clock-skew tolerance, normalized to non-negative.
    #[must_use]
    pub fn with_clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = if skew < Duration::zero() { -skew } else { skew };
        self
    }

    /// Returns the effective clock skew.
    #[must_use]
    pub const fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    /// Checks the assertion's signature against the trust keys, in order.
    ///
    /// The first key that verifies is recorded on the assertion as its
    /// signing key.
    pub fn verify_signature(&self, assertion: &mut Assertion) -> SamlResult<()> {
        let source = assertion.source_xml.as_deref().ok_or_else(|| {
            SamlError::InvalidArgument(
                "assertion carries no source XML; parse it from a document first".to_string(),
            )
        })?;

        let (_, key_index) = self.signature_validator.validate(source).map_err(|e| {
            debug!(assertion = %assertion.id, error = %e, "assertion signature rejected");
            match e {
                SamlError::SignatureMissing(m) => SamlError::SignatureMissing(m),
                _ => SamlError::SignatureInvalid(
                    "assertion signature could not be verified".to_string(),
                ),
            }
        })?;

        assertion.signing_key = Some(self.signature_validator.trust_keys()[key_index].clone());
        Ok(())
    }

    /// Validates the assertion's structure: version, identifiers, issuer,
    /// subject, conditions and statements.
    pub fn validate_structure(&self, assertion: &Assertion) -> SamlResult<()> {
        structural::validate_structure(assertion, &self.allowed_audiences)
    }

    /// Validates the assertion's time bounds against the current instant.
    pub fn validate_time(&self, assertion: &Assertion) -> SamlResult<()> {
        self.validate_time_at(assertion, Utc::now())
    }

    /// Validates time bounds against an explicit instant.
    pub fn validate_time_at(&self, assertion: &Assertion, now: DateTime<Utc>) -> SamlResult<()> {
        time::validate_time(assertion, now, self.clock_skew)
    }

    /// Runs the complete pipeline: signature, structure, time.
    pub fn validate(&self, assertion: &mut Assertion) -> SamlResult<()> {
        self.verify_signature(assertion)?;
        self.validate_structure(assertion)?;
        self.validate_time(assertion)?;
        debug!(assertion = %assertion.id, "assertion accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::XmlSigner;
    use crate::types::{Conditions, NameId, Response, Statement, Subject};
    use sp_crypto::SigningKey;

    fn rsa_key() -> SigningKey {
        SigningKey::Rsa(Box::new(
            rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap(),
        ))
    }

    fn signed_response_with_assertion(key: &SigningKey) -> Response {
        let assertion = Assertion::new("https://idp.example.com")
            .with_subject(Subject::new(NameId::email("user@example.com")))
            .with_conditions(
                Conditions::with_validity(5).with_audience("https://sp.example.com"),
            )
            .with_statement(Statement::Attribute(
                crate::types::AttributeStatement::new()
                    .with_attribute(crate::types::Attribute::single("email", "user@example.com")),
            ));

        let signed_assertion = XmlSigner::new(key)
            .sign(&assertion.to_xml(), &assertion.id)
            .unwrap();

        let response_xml = format!(
            "<samlp:Response xmlns:samlp=\"urn:oasis:names:tc:SAML:2.0:protocol\" ID=\"_r1\" Version=\"2.0\" IssueInstant=\"2026-01-01T00:00:00Z\"><samlp:Status><samlp:StatusCode Value=\"urn:oasis:names:tc:SAML:2.0:status:Success\"/></samlp:Status>{signed_assertion}</samlp:Response>"
        );
        Response::from_xml(&response_xml).unwrap()
    }

    #[test]
    fn full_pipeline_accepts_a_good_assertion() {
        let key = rsa_key();
        let mut response = signed_response_with_assertion(&key);
        let mut assertion = response.assertions.remove(0);

        let validator = AssertionValidator::new(vec![key.verification_key()])
            .with_allowed_audience("https://sp.example.com");

        validator.validate(&mut assertion).unwrap();
        assert!(assertion.signing_key.is_some());
    }

    #[test]
    fn first_matching_trust_key_is_recorded() {
        let key = rsa_key();
        let other = rsa_key();
        let mut response = signed_response_with_assertion(&key);
        let mut assertion = response.assertions.remove(0);

        let validator = AssertionValidator::new(vec![
            other.verification_key(),
            key.verification_key(),
        ]);
        validator.verify_signature(&mut assertion).unwrap();
        assert!(assertion.signing_key.is_some());
    }

    #[test]
    fn no_matching_key_rejects() {
        let key = rsa_key();
        let mut response = signed_response_with_assertion(&key);
        let mut assertion = response.assertions.remove(0);

        let validator = AssertionValidator::new(vec![rsa_key().verification_key()]);
        let err = validator.verify_signature(&mut assertion).unwrap_err();
        assert!(matches!(err, SamlError::SignatureInvalid(_)));
        assert!(assertion.signing_key.is_none());
    }

    #[test]
    fn unparsed_assertion_cannot_be_signature_checked() {
        let validator = AssertionValidator::new(vec![rsa_key().verification_key()]);
        let mut assertion = Assertion::new("https://idp.example.com");
        let err = validator.verify_signature(&mut assertion).unwrap_err();
        assert!(matches!(err, SamlError::InvalidArgument(_)));
    }

    #[test]
    fn negative_skew_is_normalized() {
        let validator = AssertionValidator::new(Vec::new())
            .with_clock_skew(Duration::minutes(-5));
        assert_eq!(validator.clock_skew(), Duration::minutes(5));
    }
}

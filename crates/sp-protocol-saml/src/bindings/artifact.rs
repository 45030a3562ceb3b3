//! HTTP-Artifact binding.
//!
//! The front channel delivers only an opaque artifact; the full message is
//! fetched from the identity provider's artifact resolution service with a
//! signed ArtifactResolve over a blocking SOAP call. Deadlines and retry
//! policy belong to the caller; failures propagate as operation errors
//! with their cause attached.

use sp_crypto::SigningKey;
use tracing::debug;

use super::soap::{wrap_envelope, SoapMessageParser};
use crate::error::{SamlError, SamlResult};
use crate::signature::XmlSigner;
use crate::types::{ArtifactResolve, ArtifactResponse, SOAP_ACTION};
use crate::xml::strip_xml_declaration;

/// Transport error type for SOAP exchanges.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// A blocking SOAP request/response transport.
///
/// The engine depends on this abstraction rather than a concrete HTTP
/// stack; [`HttpSoapClient`] is the production implementation and tests
/// substitute their own.
pub trait SoapClient {
    /// POSTs a SOAP envelope and returns the response body.
    fn call(&self, endpoint: &str, soap_action: &str, body: &str) -> Result<String, TransportError>;
}

/// SOAP transport over a blocking HTTP client.
pub struct HttpSoapClient {
    client: reqwest::blocking::Client,
}

impl HttpSoapClient {
    /// Creates the transport.
    pub fn new() -> SamlResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| SamlError::Transport {
                context: "building HTTP client".to_string(),
                source: Box::new(e),
            })?;
        Ok(Self { client })
    }
}

impl SoapClient for HttpSoapClient {
    fn call(&self, endpoint: &str, soap_action: &str, body: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .header("SOAPAction", soap_action)
            .body(body.to_string())
            .send()?
            .error_for_status()?;
        Ok(response.text()?)
    }
}

/// Checks whether an inbound request is a valid artifact delivery:
/// a GET carrying a non-empty `SAMLart` parameter.
#[must_use]
pub fn is_valid_artifact_request(method: &str, saml_art: Option<&str>) -> bool {
    method.eq_ignore_ascii_case("GET") && saml_art.is_some_and(|artifact| !artifact.is_empty())
}

/// Resolves an artifact into the full protocol message.
///
/// Builds a fresh ArtifactResolve, signs it enveloped (signature placed
/// after the Issuer element), wraps it in a SOAP envelope and POSTs it to
/// the resolution endpoint. The response body is unwrapped and re-parsed
/// as an ArtifactResponse with its embedded message attached.
pub fn resolve_artifact(
    client: &dyn SoapClient,
    artifact: &str,
    endpoint: &str,
    issuer: &str,
    signing_key: &SigningKey,
) -> SamlResult<ArtifactResponse> {
    let resolve = ArtifactResolve::new(issuer, artifact).with_destination(endpoint);
    debug!(id = %resolve.id, endpoint, "resolving artifact");

    let xml = resolve.to_xml();
    let signed = XmlSigner::new(signing_key).sign(strip_xml_declaration(&xml), &resolve.id)?;
    let envelope = wrap_envelope(&signed);

    let body = client
        .call(endpoint, SOAP_ACTION, &envelope)
        .map_err(|source| SamlError::Transport {
            context: format!("artifact resolution against {endpoint}"),
            source,
        })?;

    let parser = SoapMessageParser::parse(&body)?;
    Ok(parser.artifact_response()?.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::XmlSignatureValidator;

    fn rsa_key() -> SigningKey {
        SigningKey::Rsa(Box::new(
            rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap(),
        ))
    }

    #[test]
    fn artifact_request_validity() {
        assert!(is_valid_artifact_request("GET", Some("AAQAAMFbLinl")));
        assert!(is_valid_artifact_request("get", Some("X")));
        assert!(!is_valid_artifact_request("POST", Some("AAQAAMFbLinl")));
        assert!(!is_valid_artifact_request("GET", Some("")));
        assert!(!is_valid_artifact_request("GET", None));
    }

    struct RecordingClient {
        response: String,
        verify_with: sp_crypto::VerificationKey,
    }

    impl SoapClient for RecordingClient {
        fn call(
            &self,
            _endpoint: &str,
            soap_action: &str,
            body: &str,
        ) -> Result<String, TransportError> {
            assert_eq!(soap_action, SOAP_ACTION);

            // The outbound envelope must contain a verifiable signed
            // ArtifactResolve.
            let parser = SoapMessageParser::parse(body).unwrap();
            let resolve = parser.artifact_resolve().unwrap();
            assert!(!resolve.artifact.is_empty());

            let validator = XmlSignatureValidator::new(vec![self.verify_with.clone()]);
            validator.validate(parser.message_xml()).unwrap();

            Ok(self.response.clone())
        }
    }

    struct FailingClient;

    impl SoapClient for FailingClient {
        fn call(&self, _: &str, _: &str, _: &str) -> Result<String, TransportError> {
            Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )))
        }
    }

    fn artifact_response_envelope() -> String {
        wrap_envelope(
            r#"<samlp:ArtifactResponse xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_ar1" Version="2.0" IssueInstant="2026-01-01T00:00:00Z">
                <saml:Issuer>https://idp.example.com</saml:Issuer>
                <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
                <samlp:Response ID="_r1" Version="2.0" IssueInstant="2026-01-01T00:00:00Z">
                    <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
                </samlp:Response>
            </samlp:ArtifactResponse>"#,
        )
    }

    #[test]
    fn resolve_signs_wraps_and_parses() {
        let key = rsa_key();
        let client = RecordingClient {
            response: artifact_response_envelope(),
            verify_with: key.verification_key(),
        };

        let response = resolve_artifact(
            &client,
            "AAQAAMFbLinl",
            "https://idp.example.com/ars",
            "https://sp.example.com",
            &key,
        )
        .unwrap();

        assert!(response.is_success());
        assert_eq!(response.message_name.as_deref(), Some("Response"));
        assert!(response.message_xml.is_some());
    }

    #[test]
    fn transport_failure_becomes_operation_error() {
        let key = rsa_key();
        let err = resolve_artifact(
            &FailingClient,
            "AAQAAMFbLinl",
            "https://idp.example.com/ars",
            "https://sp.example.com",
            &key,
        )
        .unwrap_err();

        assert_eq!(err.category(), crate::error::ErrorCategory::Operation);
        assert!(std::error::Error::source(&err).is_some());
    }
}

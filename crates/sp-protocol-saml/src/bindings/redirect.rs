//! HTTP-Redirect binding.
//!
//! The detached signature covers the exact UTF-8 bytes of the query string
//! as it was built: `SAMLRequest=..&RelayState=..&SigAlg=..`. Verification
//! therefore reconstructs the signed subject from the *original, undecoded*
//! parameter values; re-encoding any of them would silently invalidate the
//! signature.

use base64::engine::general_purpose::{STANDARD as BASE64, URL_SAFE as BASE64_URL};
use base64::Engine;
use sp_crypto::{KeyType, SigningKey, VerificationKey};
use tracing::{debug, warn};

use super::SamlMessageType;
use crate::codec::{compress, decompress, uppercase_percent_encoding};
use crate::error::{SamlError, SamlResult};
use crate::signature::{sign_data, verify_signature, SignatureAlgorithm};
use crate::types::{LogoutRequest, LogoutResponse, Status};
use crate::xml::strip_xml_declaration;

/// Signing parameters for an outbound redirect query.
pub struct RedirectSigning<'a> {
    key: &'a SigningKey,
    algorithm: SignatureAlgorithm,
}

impl<'a> RedirectSigning<'a> {
    /// Creates signing parameters with the key family's default algorithm.
    #[must_use]
    pub fn new(key: &'a SigningKey) -> Self {
        Self {
            algorithm: SignatureAlgorithm::default_for(key.key_type()),
            key,
        }
    }

    /// Overrides the signature algorithm.
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// HTTP-Redirect binding encoder/decoder.
pub struct HttpRedirectBinding;

impl HttpRedirectBinding {
    /// Builds a redirect URL carrying exactly one protocol message.
    ///
    /// Exactly one of `request_xml`/`response_xml` must be supplied. The
    /// message is deflated, base64- and percent-encoded with uppercase hex
    /// escapes; RelayState is deflated and percent-encoded without escape
    /// forcing; when signing parameters are given the query built so far is
    /// signed and `SigAlg`/`Signature` are appended.
    pub fn encode(
        request_xml: Option<&str>,
        response_xml: Option<&str>,
        destination: &str,
        relay_state: Option<&str>,
        signing: Option<RedirectSigning<'_>>,
    ) -> SamlResult<String> {
        let (xml, message_type) = match (request_xml, response_xml) {
            (Some(xml), None) => (xml, SamlMessageType::Request),
            (None, Some(xml)) => (xml, SamlMessageType::Response),
            (Some(_), Some(_)) => {
                return Err(SamlError::InvalidArgument(
                    "both request and response supplied".to_string(),
                ))
            }
            (None, None) => {
                return Err(SamlError::InvalidArgument(
                    "neither request nor response supplied".to_string(),
                ))
            }
        };

        let packed = compress(strip_xml_declaration(xml))?;
        let encoded = uppercase_percent_encoding(&urlencoding::encode(&packed));

        let mut query = format!("{}={encoded}", message_type.form_param());

        if let Some(relay_state) = relay_state {
            let packed = compress(relay_state)?;
            query.push_str(&format!("&RelayState={}", urlencoding::encode(&packed)));
        }

        if let Some(signing) = signing {
            if signing.key.key_type() != signing.algorithm.key_type() {
                return Err(SamlError::InvalidArgument(format!(
                    "{} key cannot produce {}",
                    signing.key.key_type().name(),
                    signing.algorithm.uri()
                )));
            }

            query.push_str(&format!(
                "&SigAlg={}",
                uppercase_percent_encoding(&urlencoding::encode(signing.algorithm.uri()))
            ));

            let signature = sign_data(signing.key, signing.algorithm, query.as_bytes())?;
            query.push_str(&format!("&Signature={}", BASE64_URL.encode(signature)));
        }

        let separator = if destination.contains('?') { '&' } else { '?' };
        Ok(format!("{destination}{separator}{query}"))
    }

    /// Convenience wrapper for requests.
    pub fn encode_request(
        xml: &str,
        destination: &str,
        relay_state: Option<&str>,
        signing: Option<RedirectSigning<'_>>,
    ) -> SamlResult<String> {
        Self::encode(Some(xml), None, destination, relay_state, signing)
    }

    /// Convenience wrapper for responses.
    pub fn encode_response(
        xml: &str,
        destination: &str,
        relay_state: Option<&str>,
        signing: Option<RedirectSigning<'_>>,
    ) -> SamlResult<String> {
        Self::encode(None, Some(xml), destination, relay_state, signing)
    }
}

/// A parsed redirect-binding query string.
#[derive(Debug, Clone)]
pub struct RedirectQuery {
    /// All parameters as received, with values percent-decoded.
    pub parameters: Vec<(String, String)>,

    /// Whether the query carried a request or a response.
    pub kind: SamlMessageType,

    /// The decompressed protocol message.
    pub message_xml: String,

    /// The relay state, decompressed when it was compressed.
    pub relay_state: Option<String>,

    /// The signature algorithm URI, percent-decoded.
    pub sig_alg: Option<String>,

    /// The decoded signature bytes.
    pub signature: Option<Vec<u8>>,

    /// The byte-exact signed subject, rebuilt from original values.
    signed_subject: Option<String>,
}

impl RedirectQuery {
    /// Parses a raw, undecoded query string (a full URL is also accepted).
    pub fn parse(raw: &str) -> SamlResult<Self> {
        let raw_query = raw.rsplit_once('?').map_or(raw, |(_, q)| q);
        let raw_query = raw_query.strip_prefix('?').unwrap_or(raw_query);

        let mut parameters = Vec::new();
        let mut original_message: Option<(&str, SamlMessageType)> = None;
        let mut original_relay_state = None;
        let mut original_sig_alg = None;
        let mut decoded_message = None;
        let mut decoded_relay_state = None;
        let mut decoded_sig_alg = None;
        let mut decoded_signature = None;

        for pair in raw_query.split('&').filter(|p| !p.is_empty()) {
            let (key, original_value) = pair.split_once('=').unwrap_or((pair, ""));
            let decoded_value = urlencoding::decode(original_value)
                .map_err(|e| SamlError::InvalidQuery(format!("percent decoding: {e}")))?
                .into_owned();

            match key.to_ascii_lowercase().as_str() {
                "samlrequest" => {
                    original_message = Some((original_value, SamlMessageType::Request));
                    decoded_message = Some(decoded_value.clone());
                }
                "samlresponse" => {
                    original_message = Some((original_value, SamlMessageType::Response));
                    decoded_message = Some(decoded_value.clone());
                }
                "relaystate" => {
                    original_relay_state = Some(original_value);
                    decoded_relay_state = Some(decoded_value.clone());
                }
                "sigalg" => {
                    original_sig_alg = Some(original_value);
                    decoded_sig_alg = Some(decoded_value.clone());
                }
                "signature" => decoded_signature = Some(decoded_value.clone()),
                _ => {}
            }
            parameters.push((key.to_string(), decoded_value));
        }

        let (original_value, kind) = original_message.ok_or_else(|| {
            SamlError::InvalidQuery("no SAMLRequest or SAMLResponse parameter".to_string())
        })?;

        let message_xml = decompress(&decoded_message.unwrap_or_default())?;

        // Our own builder compresses RelayState; foreign senders often do
        // not, so fall back to the plain value when inflation fails.
        let relay_state = decoded_relay_state.map(|value| match decompress(&value) {
            Ok(inflated) => inflated,
            Err(_) => {
                debug!("RelayState is not deflated, using raw value");
                value
            }
        });

        let signature = decoded_signature
            .map(|value| decode_signature(&value))
            .transpose()?;

        let signed_subject = signature.as_ref().map(|_| {
            let mut subject = format!("{}={original_value}", kind.form_param());
            if let Some(original) = original_relay_state {
                subject.push_str(&format!("&RelayState={original}"));
            }
            if let Some(original) = original_sig_alg {
                subject.push_str(&format!("&SigAlg={original}"));
            }
            subject
        });

        Ok(Self {
            parameters,
            kind,
            message_xml,
            relay_state,
            sig_alg: decoded_sig_alg,
            signature,
            signed_subject,
        })
    }

    /// Returns true if the query carried a signature.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Verifies the detached signature against a trusted key.
    ///
    /// The expected algorithm is derived from the key family: DSA is fixed
    /// to SHA-1, RSA follows the `SigAlg` parameter. A missing or failing
    /// signature is a security error.
    pub fn verify(&self, key: &VerificationKey) -> SamlResult<()> {
        let signature = self.signature.as_deref().ok_or_else(|| {
            SamlError::SignatureMissing("query carries no Signature parameter".to_string())
        })?;
        let signed_subject = self.signed_subject.as_deref().ok_or_else(|| {
            SamlError::SignatureMissing("query carries no signed subject".to_string())
        })?;

        let algorithm = match key.key_type() {
            KeyType::Dsa => SignatureAlgorithm::DsaSha1,
            KeyType::Rsa => {
                let uri = self.sig_alg.as_deref().ok_or_else(|| {
                    SamlError::SignatureInvalid("SigAlg parameter is required".to_string())
                })?;
                let algorithm = SignatureAlgorithm::from_uri(uri).ok_or_else(|| {
                    SamlError::SignatureInvalid(format!("unknown signature algorithm: {uri}"))
                })?;
                if !algorithm.is_rsa() {
                    return Err(SamlError::SignatureInvalid(format!(
                        "SigAlg {uri} does not match the RSA trust key"
                    )));
                }
                algorithm
            }
        };

        let valid = verify_signature(key, algorithm, signed_subject.as_bytes(), signature)?;
        if valid {
            debug!(algorithm = algorithm.uri(), "redirect signature verified");
            Ok(())
        } else {
            warn!(algorithm = algorithm.uri(), "redirect signature rejected");
            Err(SamlError::SignatureInvalid(
                "query signature does not verify".to_string(),
            ))
        }
    }
}

/// Builds the logout response for a redirect-bound logout request.
///
/// The response status reflects the signature check: RequestDenied when
/// the request's signature is missing or does not verify, Success
/// otherwise. The denied status is final; it is not rewritten before the
/// response is returned.
pub fn logout_response_for_request(
    query: &RedirectQuery,
    key: &VerificationKey,
    issuer: &str,
) -> SamlResult<LogoutResponse> {
    if query.kind != SamlMessageType::Request {
        return Err(SamlError::InvalidArgument(
            "query does not carry a LogoutRequest".to_string(),
        ));
    }
    let request = LogoutRequest::from_xml(&query.message_xml)?;

    let status = match query.verify(key) {
        Ok(()) => Status::success(),
        Err(e) => {
            warn!(error = %e, "logout request signature rejected");
            Status::request_denied()
        }
    };

    let mut response = LogoutResponse::with_status(issuer, status);
    response.in_response_to = Some(request.id);
    Ok(response)
}

/// Decodes a signature parameter, accepting both the standard and the
/// URL-safe base64 alphabets.
fn decode_signature(value: &str) -> SamlResult<Vec<u8>> {
    BASE64
        .decode(value)
        .or_else(|_| BASE64_URL.decode(value))
        .map_err(|e| SamlError::Base64Decode(format!("Signature parameter: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthnRequest, NameId};

    fn rsa_key() -> SigningKey {
        SigningKey::Rsa(Box::new(
            rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap(),
        ))
    }

    fn dsa_key() -> SigningKey {
        let components =
            dsa::Components::generate(&mut rand::thread_rng(), dsa::KeySize::DSA_2048_256);
        SigningKey::Dsa(Box::new(dsa::SigningKey::generate(
            &mut rand::thread_rng(),
            components,
        )))
    }

    fn request_xml() -> String {
        AuthnRequest::new("https://sp.example.com")
            .with_destination("https://idp.example.com/sso")
            .to_xml()
    }

    #[test]
    fn unsigned_roundtrip() {
        let xml = request_xml();
        let url = HttpRedirectBinding::encode_request(
            &xml,
            "https://idp.example.com/sso",
            Some("/dashboard"),
            None,
        )
        .unwrap();

        assert!(url.starts_with("https://idp.example.com/sso?SAMLRequest="));

        let query = RedirectQuery::parse(&url).unwrap();
        assert_eq!(query.kind, SamlMessageType::Request);
        assert_eq!(query.message_xml, xml);
        assert_eq!(query.relay_state.as_deref(), Some("/dashboard"));
        assert!(!query.is_signed());
    }

    #[test]
    fn neither_or_both_payloads_is_an_argument_error() {
        let xml = request_xml();
        let err =
            HttpRedirectBinding::encode(None, None, "https://idp.example.com", None, None)
                .unwrap_err();
        assert!(matches!(err, SamlError::InvalidArgument(_)));

        let err = HttpRedirectBinding::encode(
            Some(&xml),
            Some(&xml),
            "https://idp.example.com",
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, SamlError::InvalidArgument(_)));
    }

    #[test]
    fn signed_roundtrip_verifies_with_matching_key() {
        let key = rsa_key();
        let url = HttpRedirectBinding::encode_request(
            &request_xml(),
            "https://idp.example.com/sso",
            Some("state"),
            Some(RedirectSigning::new(&key)),
        )
        .unwrap();

        assert!(url.contains("&SigAlg="));
        assert!(url.contains("&Signature="));

        let query = RedirectQuery::parse(&url).unwrap();
        assert!(query.is_signed());
        query.verify(&key.verification_key()).unwrap();
    }

    #[test]
    fn unrelated_key_is_rejected() {
        let key = rsa_key();
        let url = HttpRedirectBinding::encode_request(
            &request_xml(),
            "https://idp.example.com/sso",
            None,
            Some(RedirectSigning::new(&key)),
        )
        .unwrap();

        let query = RedirectQuery::parse(&url).unwrap();
        let err = query.verify(&rsa_key().verification_key()).unwrap_err();
        assert!(matches!(err, SamlError::SignatureInvalid(_)));
    }

    #[test]
    fn flipped_signature_byte_breaks_verification() {
        let key = rsa_key();
        let url = HttpRedirectBinding::encode_request(
            &request_xml(),
            "https://idp.example.com/sso",
            None,
            Some(RedirectSigning::new(&key)),
        )
        .unwrap();

        let mut query = RedirectQuery::parse(&url).unwrap();
        query.signature.as_mut().unwrap()[0] ^= 0x01;
        assert!(query.verify(&key.verification_key()).is_err());
    }

    #[test]
    fn missing_signature_when_required_is_a_security_error() {
        let url = HttpRedirectBinding::encode_request(
            &request_xml(),
            "https://idp.example.com/sso",
            None,
            None,
        )
        .unwrap();

        let query = RedirectQuery::parse(&url).unwrap();
        let err = query.verify(&rsa_key().verification_key()).unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::Security);
    }

    #[test]
    fn dsa_signed_roundtrip() {
        let key = dsa_key();
        let url = HttpRedirectBinding::encode_request(
            &request_xml(),
            "https://idp.example.com/sso",
            Some("state"),
            Some(RedirectSigning::new(&key)),
        )
        .unwrap();

        let query = RedirectQuery::parse(&url).unwrap();
        // DSA verification ignores SigAlg and pins SHA-1.
        query.verify(&key.verification_key()).unwrap();
    }

    #[test]
    fn sig_alg_escapes_are_uppercase() {
        let key = rsa_key();
        let url = HttpRedirectBinding::encode_request(
            &request_xml(),
            "https://idp.example.com/sso",
            None,
            Some(RedirectSigning::new(&key)),
        )
        .unwrap();

        let sig_alg = url
            .split("&SigAlg=")
            .nth(1)
            .unwrap()
            .split('&')
            .next()
            .unwrap();
        assert!(!sig_alg.contains("%2f"), "lowercase escape in {sig_alg}");
        assert!(sig_alg.contains("%2F"));
    }

    #[test]
    fn parameter_names_are_classified_case_insensitively() {
        let xml = request_xml();
        let url = HttpRedirectBinding::encode_request(&xml, "https://idp.example.com", None, None)
            .unwrap();
        let lowered = url.replace("SAMLRequest=", "samlrequest=");
        let query = RedirectQuery::parse(&lowered).unwrap();
        assert_eq!(query.message_xml, xml);
    }

    #[test]
    fn garbage_message_payload_is_a_format_error() {
        let err = RedirectQuery::parse("SAMLRequest=%21%21%21garbage").unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::Format);
    }

    #[test]
    fn logout_response_reflects_signature_outcome() {
        let sp_key = rsa_key();
        let idp_key = rsa_key();
        let logout_xml = LogoutRequest::new(
            "https://idp.example.com",
            NameId::email("user@example.com"),
        )
        .to_xml();

        // Properly signed request: Success.
        let url = HttpRedirectBinding::encode_request(
            &logout_xml,
            "https://sp.example.com/slo",
            None,
            Some(RedirectSigning::new(&idp_key)),
        )
        .unwrap();
        let query = RedirectQuery::parse(&url).unwrap();
        let response =
            logout_response_for_request(&query, &idp_key.verification_key(), "https://sp.example.com")
                .unwrap();
        assert!(response.is_success());
        assert!(response.in_response_to.is_some());

        // Unsigned request: RequestDenied, and it stays denied.
        let url = HttpRedirectBinding::encode_request(
            &logout_xml,
            "https://sp.example.com/slo",
            None,
            None,
        )
        .unwrap();
        let query = RedirectQuery::parse(&url).unwrap();
        let response =
            logout_response_for_request(&query, &sp_key.verification_key(), "https://sp.example.com")
                .unwrap();
        assert!(!response.is_success());
        assert_eq!(
            response.status.effective_code(),
            crate::types::sub_status_codes::REQUEST_DENIED
        );
    }
}

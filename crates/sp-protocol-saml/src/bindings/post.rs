//! HTTP-POST binding.
//!
//! Responses arrive at the assertion consumer endpoint as base64-encoded
//! form fields; outbound requests are carried by an auto-submitting HTML
//! form.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::SamlMessageType;
use crate::error::{SamlError, SamlResult};

/// A message decoded from POST form fields.
#[derive(Debug, Clone)]
pub struct DecodedPostMessage {
    /// The decoded XML message.
    pub xml: String,
    /// Whether the form carried a request or a response.
    pub kind: SamlMessageType,
    /// The RelayState form field, verbatim.
    pub relay_state: Option<String>,
}

/// HTTP-POST binding encoder/decoder.
pub struct HttpPostBinding;

impl HttpPostBinding {
    /// Decodes a message from POST form fields.
    pub fn decode(
        saml_request: Option<&str>,
        saml_response: Option<&str>,
        relay_state: Option<&str>,
    ) -> SamlResult<DecodedPostMessage> {
        let (encoded, kind) = match (saml_request, saml_response) {
            (Some(value), None) => (value, SamlMessageType::Request),
            (None, Some(value)) => (value, SamlMessageType::Response),
            (Some(_), Some(_)) => {
                return Err(SamlError::InvalidQuery(
                    "both SAMLRequest and SAMLResponse present".to_string(),
                ))
            }
            (None, None) => {
                return Err(SamlError::InvalidQuery(
                    "no SAMLRequest or SAMLResponse field".to_string(),
                ))
            }
        };

        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|e| SamlError::Base64Decode(e.to_string()))?;
        let xml = String::from_utf8(decoded)
            .map_err(|e| SamlError::InvalidMessage(format!("message is not UTF-8: {e}")))?;

        Ok(DecodedPostMessage {
            xml,
            kind,
            relay_state: relay_state.map(String::from),
        })
    }

    /// Encodes a request as an auto-submitting HTML form.
    #[must_use]
    pub fn encode_request(xml: &str, destination: &str, relay_state: Option<&str>) -> String {
        Self::encode(xml, destination, relay_state, SamlMessageType::Request)
    }

    /// Encodes a response as an auto-submitting HTML form.
    #[must_use]
    pub fn encode_response(xml: &str, destination: &str, relay_state: Option<&str>) -> String {
        Self::encode(xml, destination, relay_state, SamlMessageType::Response)
    }

    fn encode(
        xml: &str,
        destination: &str,
        relay_state: Option<&str>,
        kind: SamlMessageType,
    ) -> String {
        let encoded = BASE64.encode(xml);
        let relay_state_input = relay_state
            .map(|rs| {
                format!(
                    r#"<input type="hidden" name="RelayState" value="{}"/>"#,
                    html_escape(rs)
                )
            })
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"><title>SAML POST Binding</title></head>
<body onload="document.forms[0].submit()">
    <noscript><p>JavaScript is disabled. Click the button below to continue.</p></noscript>
    <form method="post" action="{}">
        <input type="hidden" name="{}" value="{encoded}"/>
        {relay_state_input}
        <noscript><input type="submit" value="Continue"/></noscript>
    </form>
</body>
</html>"#,
            html_escape(destination),
            kind.form_param(),
        )
    }
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

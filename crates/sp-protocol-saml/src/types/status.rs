//! SAML Status types.
//!
//! Status information carried by protocol responses. Status codes nest:
//! a top-level code and an optional sub-code with more detail.

use serde::{Deserialize, Serialize};

use super::constants::{status_codes, sub_status_codes};
use crate::xml::{escape_xml, XmlElement};

/// SAML protocol status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// The status code.
    pub status_code: StatusCode,

    /// Optional status message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

impl Status {
    /// Creates a success status.
    #[must_use]
    pub fn success() -> Self {
        Self {
            status_code: StatusCode::success(),
            status_message: None,
        }
    }

    /// Creates a requester-error status with a RequestDenied sub-code.
    #[must_use]
    pub fn request_denied() -> Self {
        Self {
            status_code: StatusCode::requester()
                .with_sub_status(StatusCode::new(sub_status_codes::REQUEST_DENIED)),
            status_message: None,
        }
    }

    /// Creates a responder error status.
    #[must_use]
    pub fn responder_error(message: impl Into<String>) -> Self {
        Self {
            status_code: StatusCode::responder(),
            status_message: Some(message.into()),
        }
    }

    /// Returns true if this status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code.is_success()
    }

    /// Sets the status message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }

    /// Returns the most specific status code value: the sub-code when
    /// present, the top-level code otherwise.
    #[must_use]
    pub fn effective_code(&self) -> &str {
        self.status_code
            .sub_status_value()
            .unwrap_or(&self.status_code.value)
    }

    /// Reads a `Status` element.
    #[must_use]
    pub fn from_element(element: &XmlElement) -> Option<Self> {
        let code = element.child("StatusCode")?;
        let status_code = StatusCode {
            value: code.attr("Value").unwrap_or_default().to_string(),
            status_code: code.child("StatusCode").map(|sub| {
                Box::new(StatusCode::new(sub.attr("Value").unwrap_or_default()))
            }),
        };
        Some(Self {
            status_code,
            status_message: element
                .child("StatusMessage")
                .map(|m| m.text_trimmed().to_string()),
        })
    }

    /// Serializes as a `samlp:Status` element.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let sub = self
            .status_code
            .status_code
            .as_ref()
            .map(|sub| format!("<samlp:StatusCode Value=\"{}\"/>", escape_xml(&sub.value)))
            .unwrap_or_default();
        let message = self
            .status_message
            .as_ref()
            .map(|m| format!("<samlp:StatusMessage>{}</samlp:StatusMessage>", escape_xml(m)))
            .unwrap_or_default();
        format!(
            "<samlp:Status><samlp:StatusCode Value=\"{}\">{sub}</samlp:StatusCode>{message}</samlp:Status>",
            escape_xml(&self.status_code.value)
        )
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::success()
    }
}

/// SAML status code, possibly with a nested sub-code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCode {
    /// The status code URI value.
    pub value: String,

    /// Optional nested status code providing more detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<Box<StatusCode>>,
}

impl StatusCode {
    /// Creates a new status code with the given value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            status_code: None,
        }
    }

    /// Creates a success status code.
    #[must_use]
    pub fn success() -> Self {
        Self::new(status_codes::SUCCESS)
    }

    /// Creates a requester error status code.
    #[must_use]
    pub fn requester() -> Self {
        Self::new(status_codes::REQUESTER)
    }

    /// Creates a responder error status code.
    #[must_use]
    pub fn responder() -> Self {
        Self::new(status_codes::RESPONDER)
    }

    /// Adds a sub-status code.
    #[must_use]
    pub fn with_sub_status(mut self, sub: StatusCode) -> Self {
        self.status_code = Some(Box::new(sub));
        self
    }

    /// Returns true if this is a success status code.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.value == status_codes::SUCCESS
    }

    /// Returns the sub-status code value if present.
    #[must_use]
    pub fn sub_status_value(&self) -> Option<&str> {
        self.status_code.as_ref().map(|s| s.value.as_str())
    }
}

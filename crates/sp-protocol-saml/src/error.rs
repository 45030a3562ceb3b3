//! SAML error types.
//!
//! Every failure mode of the protocol engine maps onto one of five
//! categories: caller error, unparsable content, trust failure,
//! peer-signaled authentication failure, or environment failure. The enum
//! keeps granular variants for matching; [`SamlError::category`] gives the
//! coarse classification.

use thiserror::Error;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid caller input (wrong key type, conflicting arguments).
    Argument,
    /// Unparsable protocol content (bad DEFLATE, missing required element).
    Format,
    /// Cryptographic or trust failure (bad signature, replay, untrusted issuer).
    Security,
    /// Peer-signaled protocol failure (non-Success status).
    Authentication,
    /// Transport or environment failure.
    Operation,
}

/// SAML protocol errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// Invalid caller input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Requested algorithm or key combination is outside the supported set.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Malformed query string or binding parameters.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64Decode(String),

    /// DEFLATE compression or decompression error.
    #[error("deflate error: {0}")]
    Deflate(String),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Missing required element or attribute.
    #[error("missing required element: {0}")]
    MissingElement(String),

    /// Well-formed but semantically invalid protocol message.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A required signature is absent.
    #[error("signature required but not present: {0}")]
    SignatureMissing(String),

    /// Signature verification failed.
    #[error("signature validation failed: {0}")]
    SignatureInvalid(String),

    /// Correlation check failed; the message does not answer our request.
    #[error("replay check failed: {0}")]
    ReplayDetected(String),

    /// Issuer does not match the expected entity.
    #[error("untrusted issuer: expected {expected}, got {actual}")]
    UntrustedIssuer {
        /// The entity ID we expected.
        expected: String,
        /// The entity ID the message carried.
        actual: String,
    },

    /// Assertion failed structural validation.
    #[error("invalid assertion: {0}")]
    InvalidAssertion(String),

    /// Assertion conditions were not met.
    #[error("assertion conditions not met: {0}")]
    ConditionsNotMet(String),

    /// Assertion expired.
    #[error("assertion expired")]
    AssertionExpired,

    /// Assertion not yet valid.
    #[error("assertion not yet valid")]
    AssertionNotYetValid,

    /// No audience restriction matched the allowed audiences.
    #[error("invalid audience: {0}")]
    InvalidAudience(String),

    /// The peer answered NoPassive: it could not authenticate without
    /// user interaction.
    #[error("identity provider returned NoPassive")]
    NoPassive,

    /// The peer signaled a non-Success status.
    #[error("authentication failed with status {status_code}")]
    AuthnFailed {
        /// The status code URI the peer returned.
        status_code: String,
        /// The status message, if any.
        message: Option<String>,
    },

    /// Transport failure during a back-channel exchange.
    #[error("transport failure during {context}")]
    Transport {
        /// What the engine was doing when the transport failed.
        context: String,
        /// The underlying cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Cryptographic operation error.
    #[error("crypto error: {0}")]
    Crypto(String),
}

impl SamlError {
    /// Returns the coarse category of this error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument(_) | Self::UnsupportedAlgorithm(_) => ErrorCategory::Argument,
            Self::InvalidQuery(_)
            | Self::Base64Decode(_)
            | Self::Deflate(_)
            | Self::XmlParse(_)
            | Self::MissingElement(_)
            | Self::InvalidMessage(_) => ErrorCategory::Format,
            Self::SignatureMissing(_)
            | Self::SignatureInvalid(_)
            | Self::ReplayDetected(_)
            | Self::UntrustedIssuer { .. }
            | Self::InvalidAssertion(_)
            | Self::ConditionsNotMet(_)
            | Self::AssertionExpired
            | Self::AssertionNotYetValid
            | Self::InvalidAudience(_) => ErrorCategory::Security,
            Self::NoPassive | Self::AuthnFailed { .. } => ErrorCategory::Authentication,
            Self::Transport { .. } | Self::Crypto(_) => ErrorCategory::Operation,
        }
    }
}

impl From<quick_xml::Error> for SamlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64Decode(err.to_string())
    }
}

impl From<std::io::Error> for SamlError {
    fn from(err: std::io::Error) -> Self {
        Self::Deflate(err.to_string())
    }
}

impl From<sp_crypto::CryptoError> for SamlError {
    fn from(err: sp_crypto::CryptoError) -> Self {
        Self::Crypto(err.to_string())
    }
}

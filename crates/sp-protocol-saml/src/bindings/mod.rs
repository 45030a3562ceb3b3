//! SAML binding implementations.
//!
//! - **HTTP-Redirect** — messages travel deflated and base64-encoded in
//!   query parameters, with an optional detached signature over the query.
//! - **HTTP-POST** — messages travel base64-encoded in auto-submitting
//!   HTML forms.
//! - **Artifact/SOAP** — an opaque artifact is traded for the full message
//!   over a signed SOAP back-channel call.

mod artifact;
mod post;
mod redirect;
mod soap;

pub use artifact::*;
pub use post::*;
pub use redirect::*;
pub use soap::*;

/// SAML message type for binding operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamlMessageType {
    /// A protocol request (AuthnRequest, LogoutRequest, ArtifactResolve).
    Request,
    /// A protocol response (Response, LogoutResponse).
    Response,
}

impl SamlMessageType {
    /// Returns the query/form parameter name for this message type.
    #[must_use]
    pub const fn form_param(&self) -> &'static str {
        match self {
            Self::Request => "SAMLRequest",
            Self::Response => "SAMLResponse",
        }
    }
}

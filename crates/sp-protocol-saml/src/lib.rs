//! SAML 2.0 service-provider protocol engine.
//!
//! This crate implements the relying-party side of the SAML 2.0 web
//! browser SSO and single logout profiles:
//!
//! - **Bindings** - HTTP-Redirect (signed query strings), HTTP-POST and
//!   HTTP-Artifact over a SOAP back channel
//! - **Signature trust** - RSA-SHA1/SHA256/SHA512 and DSA-SHA1 signing and
//!   verification, embedded and detached
//! - **Assertion validation** - structural, temporal and audience rules
//!   with clock-skew tolerance
//! - **Encrypted assertions** - XML-Encryption with RSA key transport
//! - **Replay and status handling** - request correlation and status-code
//!   interpretation
//!
//! # Architecture
//!
//! - [`types`] - the SAML data model and constants
//! - [`bindings`] - binding codecs and the artifact resolver
//! - [`signature`] - the trust service, signer and validator
//! - [`validation`] - the assertion validation engine
//! - [`encryption`] - the encrypted-assertion engine
//! - [`replay`] - replay protection and status interpretation
//! - [`codec`] - DEFLATE/base64/percent-encoding primitives
//! - [`error`] - the error taxonomy
//!
//! All operations are synchronous and scoped to one request; the only
//! blocking network call is artifact resolution.
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [SAML 2.0 Bindings](https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf)
//! - [SAML 2.0 Profiles](https://docs.oasis-open.org/security/saml/v2.0/saml-profiles-2.0-os.pdf)
//! - [XML Signature](https://www.w3.org/TR/xmldsig-core1/)
//! - [XML Encryption](https://www.w3.org/TR/xmlenc-core1/)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod codec;
pub mod encryption;
pub mod error;
pub mod replay;
pub mod signature;
pub mod types;
pub mod validation;
pub mod xml;

pub use error::{ErrorCategory, SamlError, SamlResult};
pub use types::*;
pub use validation::AssertionValidator;

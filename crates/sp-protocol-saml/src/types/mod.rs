//! Core SAML types and data structures.

pub mod assertion;
pub mod authn_request;
pub mod artifact;
pub mod constants;
pub mod encrypted;
pub mod logout;
pub mod name_id;
pub mod response;
pub mod status;

pub use assertion::*;
pub use authn_request::*;
pub use artifact::*;
pub use constants::*;
pub use encrypted::*;
pub use logout::*;
pub use name_id::*;
pub use response::*;
pub use status::*;

use chrono::{DateTime, Utc};

/// Parses a SAML instant (`xsd:dateTime`, UTC).
pub(crate) fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Formats a SAML instant the way identity providers expect it.
pub(crate) fn format_instant(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

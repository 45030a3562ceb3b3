//! Replay protection and status interpretation.
//!
//! The correlation store is externally owned; the engine only checks that
//! an inbound `InResponseTo` answers the request id the caller stashed
//! when it sent the message.

use std::collections::HashMap;

use crate::error::{SamlError, SamlResult};
use crate::types::{sub_status_codes, Status};

/// Checks that a response correlates with the request it claims to answer.
///
/// Both identifiers are required; comparison is case-insensitive. Any
/// mismatch is treated as a replayed or unsolicited message.
pub fn check_replay_attack(in_response_to: &str, original_request_id: &str) -> SamlResult<()> {
    if in_response_to.is_empty() {
        return Err(SamlError::ReplayDetected(
            "response carries no InResponseTo".to_string(),
        ));
    }
    if original_request_id.is_empty() {
        return Err(SamlError::ReplayDetected(
            "no original request id to correlate against".to_string(),
        ));
    }
    if !in_response_to.eq_ignore_ascii_case(original_request_id) {
        return Err(SamlError::ReplayDetected(format!(
            "InResponseTo '{in_response_to}' does not answer request '{original_request_id}'"
        )));
    }
    Ok(())
}

/// Interprets a response status.
///
/// Success passes; NoPassive is surfaced as its own error so callers can
/// fall back to interactive authentication; anything else is an
/// authentication failure carrying the peer's status code.
pub fn check_status(status: &Status) -> SamlResult<()> {
    if status.is_success() {
        return Ok(());
    }
    if status.effective_code() == sub_status_codes::NO_PASSIVE {
        return Err(SamlError::NoPassive);
    }
    Err(SamlError::AuthnFailed {
        status_code: status.effective_code().to_string(),
        message: status.status_message.clone(),
    })
}

/// Checks that a logout request comes from the expected identity provider.
pub fn validate_logout_request_issuer(issuer: &str, expected_entity_id: &str) -> SamlResult<()> {
    if issuer.is_empty() || expected_entity_id.is_empty() {
        return Err(SamlError::UntrustedIssuer {
            expected: expected_entity_id.to_string(),
            actual: issuer.to_string(),
        });
    }
    if !issuer.eq_ignore_ascii_case(expected_entity_id) {
        return Err(SamlError::UntrustedIssuer {
            expected: expected_entity_id.to_string(),
            actual: issuer.to_string(),
        });
    }
    Ok(())
}

/// The correlation-id store the replay check reads from.
///
/// Keys are caller-chosen prefixes (for example one per pending flow);
/// session isolation and expiry discipline belong to the implementation.
pub trait CorrelationStore {
    /// Stores the id of a message the caller just sent.
    fn put(&mut self, prefix: &str, id: &str);

    /// Removes and returns the stored id for a prefix.
    fn take(&mut self, prefix: &str) -> Option<String>;
}

/// A process-local correlation store for tests and single-node setups.
#[derive(Debug, Default)]
pub struct InMemoryCorrelationStore {
    entries: HashMap<String, String>,
}

impl InMemoryCorrelationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CorrelationStore for InMemoryCorrelationStore {
    fn put(&mut self, prefix: &str, id: &str) {
        self.entries.insert(prefix.to_string(), id.to_string());
    }

    fn take(&mut self, prefix: &str) -> Option<String> {
        self.entries.remove(prefix)
    }
}

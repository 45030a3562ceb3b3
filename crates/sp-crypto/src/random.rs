//! Cryptographically secure random generation.
//!
//! Protocol message identifiers, artifact handles and session keys all
//! require unpredictable values; everything here draws from the OS CSPRNG.

use rand::distributions::{Alphanumeric, DistString};
use rand::RngCore;

/// Generates `len` cryptographically secure random bytes.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Generates a random alphanumeric string of `len` characters.
#[must_use]
pub fn random_alphanumeric(len: usize) -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), len)
}

/// Generates a SAML message identifier.
///
/// 20 random bytes (160 bits of entropy) rendered as lowercase hex with a
/// leading underscore, so the value is a valid `xsd:ID` (NCNames must not
/// start with a digit).
#[must_use]
pub fn secure_id() -> String {
    let bytes = random_bytes(20);
    let mut id = String::with_capacity(1 + bytes.len() * 2);
    id.push('_');
    for b in bytes {
        id.push_str(&format!("{b:02x}"));
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn random_bytes_length() {
        assert_eq!(random_bytes(16).len(), 16);
        assert_eq!(random_bytes(32).len(), 32);
    }

    #[test]
    fn random_bytes_differ() {
        assert_ne!(random_bytes(32), random_bytes(32));
    }

    #[test]
    fn alphanumeric_only_valid_chars() {
        let s = random_alphanumeric(256);
        assert_eq!(s.len(), 256);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn secure_id_shape() {
        let id = secure_id();
        assert!(id.starts_with('_'));
        assert_eq!(id.len(), 41);
        assert!(id[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn secure_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| secure_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}

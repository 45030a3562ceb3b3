//! Encrypted-assertion engine.
//!
//! Encryption generates a fresh session key, encrypts the serialized
//! assertion, and wraps the session key with the recipient's RSA
//! transport key. Decryption reverses the process, honoring both legal
//! EncryptedKey placements and both key-transport schemes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sp_crypto::{symmetric, AeadAlgorithm, KeyTransport, SigningKey, VerificationKey};
use tracing::debug;

use crate::error::{SamlError, SamlResult};
use crate::types::encryption_algorithms as enc;
use crate::types::key_transport_algorithms as kt;
use crate::types::{Assertion, EncryptedAssertion, EncryptedData, EncryptedKey, KeyInfo};

/// Maps an EncryptionMethod URI onto a supported session algorithm.
///
/// The CBC and TripleDES URIs are recognized but rejected: the engine
/// produces and consumes the XML-Enc 1.1 AES-GCM family only.
pub fn session_algorithm_from_uri(uri: &str) -> SamlResult<AeadAlgorithm> {
    match uri {
        enc::AES128_GCM => Ok(AeadAlgorithm::Aes128Gcm),
        enc::AES192_GCM => Ok(AeadAlgorithm::Aes192Gcm),
        enc::AES256_GCM => Ok(AeadAlgorithm::Aes256Gcm),
        enc::AES128_CBC | enc::AES192_CBC | enc::AES256_CBC | enc::TRIPLEDES_CBC => Err(
            SamlError::UnsupportedAlgorithm(format!("legacy block mode not supported: {uri}")),
        ),
        other => Err(SamlError::UnsupportedAlgorithm(format!(
            "unknown encryption algorithm: {other}"
        ))),
    }
}

/// Returns the EncryptionMethod URI for a session algorithm.
#[must_use]
pub const fn session_algorithm_uri(algorithm: AeadAlgorithm) -> &'static str {
    match algorithm {
        AeadAlgorithm::Aes128Gcm => enc::AES128_GCM,
        AeadAlgorithm::Aes192Gcm => enc::AES192_GCM,
        AeadAlgorithm::Aes256Gcm => enc::AES256_GCM,
    }
}

/// Maps an EncryptedKey method URI onto a key-transport scheme.
///
/// An absent method falls back to PKCS#1 v1.5, the XML-Enc default.
pub fn key_transport_from_uri(uri: Option<&str>) -> SamlResult<KeyTransport> {
    match uri {
        None | Some(kt::RSA_1_5) => Ok(KeyTransport::Pkcs1v15),
        Some(kt::RSA_OAEP_MGF1P) => Ok(KeyTransport::OaepSha1),
        Some(other) => Err(SamlError::UnsupportedAlgorithm(format!(
            "unknown key transport algorithm: {other}"
        ))),
    }
}

/// Returns the EncryptedKey method URI for a key-transport scheme.
#[must_use]
pub const fn key_transport_uri(scheme: KeyTransport) -> &'static str {
    match scheme {
        KeyTransport::Pkcs1v15 => kt::RSA_1_5,
        KeyTransport::OaepSha1 => kt::RSA_OAEP_MGF1P,
    }
}

impl EncryptedAssertion {
    /// Encrypts an assertion with the defaults: AES-256-GCM session
    /// encryption and PKCS#1 v1.5 key transport.
    pub fn encrypt(assertion: &Assertion, transport_key: &VerificationKey) -> SamlResult<Self> {
        Self::encrypt_with(
            assertion,
            transport_key,
            AeadAlgorithm::Aes256Gcm,
            KeyTransport::Pkcs1v15,
        )
    }

    /// Encrypts an assertion with explicit algorithm choices.
    pub fn encrypt_with(
        assertion: &Assertion,
        transport_key: &VerificationKey,
        session_algorithm: AeadAlgorithm,
        key_transport: KeyTransport,
    ) -> SamlResult<Self> {
        let VerificationKey::Rsa(rsa_key) = transport_key else {
            return Err(SamlError::InvalidArgument(
                "assertion encryption requires an RSA transport key".to_string(),
            ));
        };

        let session_key = session_algorithm.generate_key();
        let ciphertext = symmetric::encrypt(
            session_algorithm,
            &session_key,
            assertion.to_xml().as_bytes(),
        )?;
        let wrapped_key = sp_crypto::keywrap::rsa_wrap(rsa_key, &session_key, key_transport)?;

        debug!(
            assertion = %assertion.id,
            algorithm = session_algorithm_uri(session_algorithm),
            "assertion encrypted"
        );

        Ok(Self {
            encrypted_data: EncryptedData {
                encryption_method: Some(session_algorithm_uri(session_algorithm).to_string()),
                key_info: Some(KeyInfo {
                    encrypted_key: Some(EncryptedKey {
                        encryption_method: Some(key_transport_uri(key_transport).to_string()),
                        cipher_value: BASE64.encode(wrapped_key),
                    }),
                }),
                cipher_value: BASE64.encode(ciphertext),
            },
            encrypted_keys: Vec::new(),
        })
    }

    /// Decrypts the assertion with the SP's RSA transport key.
    ///
    /// The session algorithm comes from the EncryptedData's
    /// EncryptionMethod (default AES-256-GCM); the EncryptedKey is taken
    /// from either legal placement, the direct child winning; its own
    /// method selects OAEP or PKCS#1 v1.5 unwrapping.
    pub fn decrypt(&self, transport_key: &SigningKey) -> SamlResult<Assertion> {
        let SigningKey::Rsa(rsa_key) = transport_key else {
            return Err(SamlError::InvalidArgument(
                "assertion decryption requires an RSA transport key".to_string(),
            ));
        };

        let session_algorithm = match self.encrypted_data.encryption_method.as_deref() {
            Some(uri) => session_algorithm_from_uri(uri)?,
            None => AeadAlgorithm::Aes256Gcm,
        };

        let encrypted_key = self
            .encrypted_key()
            .ok_or_else(|| SamlError::MissingElement("EncryptedKey".to_string()))?;
        let key_transport = key_transport_from_uri(encrypted_key.encryption_method.as_deref())?;

        let wrapped = BASE64
            .decode(&encrypted_key.cipher_value)
            .map_err(|e| SamlError::Base64Decode(format!("EncryptedKey cipher value: {e}")))?;
        let session_key = sp_crypto::keywrap::rsa_unwrap(rsa_key, &wrapped, key_transport)?;

        let ciphertext = BASE64
            .decode(&self.encrypted_data.cipher_value)
            .map_err(|e| SamlError::Base64Decode(format!("EncryptedData cipher value: {e}")))?;
        let plaintext = symmetric::decrypt(session_algorithm, &session_key, &ciphertext)?;

        let xml = String::from_utf8(plaintext)
            .map_err(|e| SamlError::InvalidMessage(format!("decrypted payload is not UTF-8: {e}")))?;
        Assertion::from_xml(&xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NameId, Subject};

    fn transport_keypair() -> (SigningKey, VerificationKey) {
        let key = SigningKey::Rsa(Box::new(
            rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap(),
        ));
        let public = key.verification_key();
        (key, public)
    }

    fn dsa_keypair() -> (SigningKey, VerificationKey) {
        let components =
            dsa::Components::generate(&mut rand::thread_rng(), dsa::KeySize::DSA_2048_256);
        let key = SigningKey::Dsa(Box::new(dsa::SigningKey::generate(
            &mut rand::thread_rng(),
            components,
        )));
        let public = key.verification_key();
        (key, public)
    }

    fn sample_assertion() -> Assertion {
        Assertion::new("https://idp.example.com")
            .with_subject(Subject::new(NameId::email("user@example.com")))
    }

    #[test]
    fn encrypt_then_decrypt_reproduces_the_assertion() {
        let (private, public) = transport_keypair();
        let assertion = sample_assertion();

        let encrypted = EncryptedAssertion::encrypt(&assertion, &public).unwrap();
        let decrypted = encrypted.decrypt(&private).unwrap();

        assert_eq!(decrypted.id, assertion.id);
        assert_eq!(
            decrypted.issuer.as_ref().unwrap().value,
            "https://idp.example.com"
        );
        assert_eq!(
            decrypted.subject.as_ref().unwrap().name_id().unwrap().value,
            "user@example.com"
        );
    }

    #[test]
    fn xml_roundtrip_between_encrypt_and_decrypt() {
        let (private, public) = transport_keypair();
        let assertion = sample_assertion();

        let encrypted = EncryptedAssertion::encrypt(&assertion, &public).unwrap();
        let reparsed = EncryptedAssertion::from_xml(&encrypted.to_xml()).unwrap();
        let decrypted = reparsed.decrypt(&private).unwrap();
        assert_eq!(decrypted.id, assertion.id);
    }

    #[test]
    fn oaep_and_every_session_size_roundtrip() {
        let (private, public) = transport_keypair();
        let assertion = sample_assertion();

        for algorithm in [
            AeadAlgorithm::Aes128Gcm,
            AeadAlgorithm::Aes192Gcm,
            AeadAlgorithm::Aes256Gcm,
        ] {
            let encrypted = EncryptedAssertion::encrypt_with(
                &assertion,
                &public,
                algorithm,
                KeyTransport::OaepSha1,
            )
            .unwrap();
            let decrypted = encrypted.decrypt(&private).unwrap();
            assert_eq!(decrypted.id, assertion.id);
        }
    }

    #[test]
    fn wrong_private_key_fails() {
        let (_, public) = transport_keypair();
        let (other_private, _) = transport_keypair();

        let encrypted = EncryptedAssertion::encrypt(&sample_assertion(), &public).unwrap();
        assert!(encrypted.decrypt(&other_private).is_err());
    }

    #[test]
    fn dsa_transport_key_is_an_argument_error() {
        let (dsa_private, dsa_public) = dsa_keypair();
        let err = EncryptedAssertion::encrypt(&sample_assertion(), &dsa_public).unwrap_err();
        assert!(matches!(err, SamlError::InvalidArgument(_)));

        let (_, rsa_public) = transport_keypair();
        let encrypted = EncryptedAssertion::encrypt(&sample_assertion(), &rsa_public).unwrap();
        assert!(matches!(
            encrypted.decrypt(&dsa_private).unwrap_err(),
            SamlError::InvalidArgument(_)
        ));
    }

    #[test]
    fn missing_encrypted_key_is_a_format_error() {
        let (private, public) = transport_keypair();
        let mut encrypted = EncryptedAssertion::encrypt(&sample_assertion(), &public).unwrap();
        encrypted.encrypted_data.key_info = None;
        encrypted.encrypted_keys.clear();

        assert!(matches!(
            encrypted.decrypt(&private).unwrap_err(),
            SamlError::MissingElement(_)
        ));
    }

    #[test]
    fn cbc_method_is_rejected_as_unsupported() {
        let (private, public) = transport_keypair();
        let mut encrypted = EncryptedAssertion::encrypt(&sample_assertion(), &public).unwrap();
        encrypted.encrypted_data.encryption_method = Some(enc::AES256_CBC.to_string());

        assert!(matches!(
            encrypted.decrypt(&private).unwrap_err(),
            SamlError::UnsupportedAlgorithm(_)
        ));
    }

    #[test]
    fn direct_child_key_placement_decrypts() {
        let (private, public) = transport_keypair();
        let mut encrypted = EncryptedAssertion::encrypt(&sample_assertion(), &public).unwrap();

        // Move the key from the nested placement to the direct child.
        let key = encrypted
            .encrypted_data
            .key_info
            .take()
            .unwrap()
            .encrypted_key
            .unwrap();
        encrypted.encrypted_keys.push(key);

        encrypted.decrypt(&private).unwrap();
    }

    #[test]
    fn corrupted_cipher_value_is_a_format_error() {
        let (private, public) = transport_keypair();
        let mut encrypted = EncryptedAssertion::encrypt(&sample_assertion(), &public).unwrap();
        encrypted.encrypted_data.cipher_value = "***".to_string();

        assert!(matches!(
            encrypted.decrypt(&private).unwrap_err(),
            SamlError::Base64Decode(_)
        ));
    }
}

//! RSA key transport for XML encryption.
//!
//! EncryptedKey elements carry a symmetric session key wrapped with the
//! recipient's RSA transport key, using either PKCS#1 v1.5 (the XML-Enc
//! default) or OAEP with the MGF1/SHA-1 parameters XML-Enc declares.

use rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;

use crate::signature::CryptoError;

/// RSA key-transport scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyTransport {
    /// RSA PKCS#1 v1.5 (XML-Enc `rsa-1_5`, the default).
    #[default]
    Pkcs1v15,
    /// RSA OAEP with MGF1/SHA-1 (XML-Enc `rsa-oaep-mgf1p`).
    OaepSha1,
}

/// Wraps a session key with the RSA transport key.
pub fn rsa_wrap(
    key: &RsaPublicKey,
    session_key: &[u8],
    scheme: KeyTransport,
) -> Result<Vec<u8>, CryptoError> {
    let mut rng = rand::thread_rng();
    let wrapped = match scheme {
        KeyTransport::Pkcs1v15 => key.encrypt(&mut rng, Pkcs1v15Encrypt, session_key),
        KeyTransport::OaepSha1 => key.encrypt(&mut rng, Oaep::new::<Sha1>(), session_key),
    };
    wrapped.map_err(|e| CryptoError::Cipher(format!("RSA key wrap failed: {e}")))
}

/// Unwraps a session key with the RSA transport key.
pub fn rsa_unwrap(
    key: &RsaPrivateKey,
    wrapped: &[u8],
    scheme: KeyTransport,
) -> Result<Vec<u8>, CryptoError> {
    let unwrapped = match scheme {
        KeyTransport::Pkcs1v15 => key.decrypt(Pkcs1v15Encrypt, wrapped),
        KeyTransport::OaepSha1 => key.decrypt(Oaep::new::<Sha1>(), wrapped),
    };
    unwrapped.map_err(|e| CryptoError::Cipher(format!("RSA key unwrap failed: {e}")))
}

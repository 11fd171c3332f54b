//! HMAC shared-secret keys

use std::fmt;

use ring::hmac;
use serde::{Deserialize, Serialize};

use crate::b64::Base64Url;
use crate::error::{AuthError, SigningError};
use crate::jwa::Algorithm;
use crate::jws;

/// A symmetric HMAC shared secret
#[derive(Clone, Serialize, Deserialize)]
#[must_use]
pub struct Hmac {
    #[serde(rename = "k")]
    secret: Base64Url,
}

impl Hmac {
    /// Constructs a key from the raw shared secret
    pub fn new(secret: impl Into<Base64Url>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn hmac_algorithm(alg: Algorithm) -> Option<hmac::Algorithm> {
        match alg {
            Algorithm::HS256 => Some(hmac::HMAC_SHA256),
            Algorithm::HS384 => Some(hmac::HMAC_SHA384),
            Algorithm::HS512 => Some(hmac::HMAC_SHA512),
            _ => None,
        }
    }
}

impl From<Vec<u8>> for Hmac {
    fn from(secret: Vec<u8>) -> Self {
        Self::new(secret)
    }
}

impl From<&'_ [u8]> for Hmac {
    fn from(secret: &[u8]) -> Self {
        Self::new(secret)
    }
}

// The secret never appears in logs.
impl fmt::Debug for Hmac {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Hmac").finish_non_exhaustive()
    }
}

impl jws::Verifier for Hmac {
    fn can_verify(&self, alg: Algorithm) -> bool {
        alg.is_hmac()
    }

    fn verify(&self, alg: Algorithm, data: &[u8], signature: &[u8]) -> Result<(), AuthError> {
        let alg = Self::hmac_algorithm(alg).ok_or(AuthError::InvalidSignature)?;
        let key = hmac::Key::new(alg, self.secret.as_slice());
        hmac::verify(&key, data, signature).map_err(|_| AuthError::InvalidSignature)
    }
}

impl jws::Signer for Hmac {
    fn can_sign(&self, alg: Algorithm) -> bool {
        alg.is_hmac()
    }

    fn sign(&self, alg: Algorithm, data: &[u8]) -> Result<Vec<u8>, SigningError> {
        let alg = Self::hmac_algorithm(alg).ok_or(SigningError::IncompatibleKey)?;
        let key = hmac::Key::new(alg, self.secret.as_slice());
        Ok(hmac::sign(&key, data).as_ref().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jws::{Signer as _, Verifier as _};

    #[test]
    fn sign_then_verify() {
        let key = Hmac::new(b"it's a secret to everybody".as_slice());
        let sig = key.sign(Algorithm::HS256, b"payload").unwrap();
        key.verify(Algorithm::HS256, b"payload", &sig).unwrap();
    }

    #[test]
    fn tampered_payload_fails() {
        let key = Hmac::new(b"it's a secret to everybody".as_slice());
        let sig = key.sign(Algorithm::HS256, b"payload").unwrap();
        let err = key.verify(Algorithm::HS256, b"payload!", &sig).unwrap_err();
        assert_eq!(err, AuthError::InvalidSignature);
    }

    #[test]
    fn wrong_family_cannot_sign() {
        let key = Hmac::new(b"secret".as_slice());
        assert!(!key.can_sign(Algorithm::RS256));
        assert!(key.sign(Algorithm::RS256, b"payload").is_err());
    }
}

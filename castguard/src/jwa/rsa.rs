//! RSA public keys
//!
//! Only the public half is modeled; token issuance with RSA stays with
//! the identity provider.

use std::fmt;

use ring::signature::{
    RsaPublicKeyComponents, RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_2048_8192_SHA384,
    RSA_PKCS1_2048_8192_SHA512,
};
use serde::{Deserialize, Serialize};

use crate::b64::Base64Url;
use crate::error::AuthError;
use crate::jwa::Algorithm;
use crate::jws;

/// An RSA public key given by its modulus and exponent
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct PublicKey {
    #[serde(rename = "n")]
    modulus: Base64Url,
    #[serde(rename = "e")]
    exponent: Base64Url,
}

impl PublicKey {
    /// Constructs a public key from the raw big-endian modulus and
    /// exponent bytes
    pub fn new(modulus: impl Into<Base64Url>, exponent: impl Into<Base64Url>) -> Self {
        Self {
            modulus: modulus.into(),
            exponent: exponent.into(),
        }
    }

    fn verification_params(
        alg: Algorithm,
    ) -> Option<&'static ring::signature::RsaParameters> {
        match alg {
            Algorithm::RS256 => Some(&RSA_PKCS1_2048_8192_SHA256),
            Algorithm::RS384 => Some(&RSA_PKCS1_2048_8192_SHA384),
            Algorithm::RS512 => Some(&RSA_PKCS1_2048_8192_SHA512),
            _ => None,
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "rsa:{}", self.modulus)
    }
}

impl jws::Verifier for PublicKey {
    fn can_verify(&self, alg: Algorithm) -> bool {
        alg.is_rsa()
    }

    fn verify(&self, alg: Algorithm, data: &[u8], signature: &[u8]) -> Result<(), AuthError> {
        let params = Self::verification_params(alg).ok_or(AuthError::InvalidSignature)?;
        let components = RsaPublicKeyComponents {
            n: self.modulus.as_slice(),
            e: self.exponent.as_slice(),
        };
        components
            .verify(params, data, signature)
            .map_err(|_| AuthError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jws::Verifier as _;

    #[test]
    fn wrong_family_is_rejected() {
        let key = PublicKey::new(vec![0x01; 256], vec![0x01, 0x00, 0x01]);
        assert!(!key.can_verify(Algorithm::HS256));
        let err = key
            .verify(Algorithm::HS256, b"payload", b"sig")
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidSignature);
    }

    #[test]
    fn garbage_signature_is_rejected() {
        let key = PublicKey::new(vec![0xab; 256], vec![0x01, 0x00, 0x01]);
        let err = key
            .verify(Algorithm::RS256, b"payload", &[0u8; 256])
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidSignature);
    }
}

//! Individual signing keys
//!
//! A [`Jwk`] pairs key material with its identifier and, when the
//! publisher provides one, the single algorithm the key is bound to.
//! The binding is enforced at verification time so that a token cannot
//! pick a different algorithm than the key was published for.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, SigningError};
use crate::jwa::{self, Algorithm};
use crate::jws;

/// An identifier for a key within a key set
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[must_use]
pub struct KeyId(String);

impl KeyId {
    /// Wraps the identifier string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'_ str> for KeyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The key material underlying a [`Jwk`], discriminated by key type
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kty")]
pub enum Key {
    /// A symmetric HMAC shared secret (`kty: oct`)
    #[serde(rename = "oct")]
    Hmac(jwa::Hmac),
    /// An RSA public key (`kty: RSA`)
    #[serde(rename = "RSA")]
    Rsa(jwa::Rsa),
}

/// A signing key together with its published parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
#[must_use]
pub struct Jwk {
    #[serde(rename = "kid", skip_serializing_if = "Option::is_none")]
    key_id: Option<KeyId>,
    #[serde(rename = "alg", skip_serializing_if = "Option::is_none")]
    algorithm: Option<Algorithm>,
    #[serde(flatten)]
    key: Key,
}

impl Jwk {
    /// The key's identifier, if it has one
    #[must_use]
    pub fn key_id(&self) -> Option<&KeyId> {
        self.key_id.as_ref()
    }

    /// The single algorithm the key is bound to, if the publisher
    /// specified one
    #[must_use]
    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    /// Attaches a key identifier
    pub fn with_key_id(self, kid: impl Into<KeyId>) -> Self {
        Self {
            key_id: Some(kid.into()),
            ..self
        }
    }

    /// Binds the key to a single algorithm
    pub fn with_algorithm(self, alg: Algorithm) -> Self {
        Self {
            algorithm: Some(alg),
            ..self
        }
    }

    /// Whether the key could be used to verify a token signed with `alg`
    ///
    /// A key bound to a specific algorithm is only compatible with that
    /// algorithm; an unbound key is compatible with its whole family.
    #[must_use]
    pub fn is_compatible(&self, alg: Algorithm) -> bool {
        match self.algorithm {
            Some(bound) => bound == alg,
            None => match &self.key {
                Key::Hmac(_) => alg.is_hmac(),
                Key::Rsa(_) => alg.is_rsa(),
            },
        }
    }
}

impl From<jwa::Hmac> for Jwk {
    fn from(key: jwa::Hmac) -> Self {
        Self {
            key_id: None,
            algorithm: None,
            key: Key::Hmac(key),
        }
    }
}

impl From<jwa::Rsa> for Jwk {
    fn from(key: jwa::Rsa) -> Self {
        Self {
            key_id: None,
            algorithm: None,
            key: Key::Rsa(key),
        }
    }
}

impl jws::Verifier for Jwk {
    fn can_verify(&self, alg: Algorithm) -> bool {
        self.is_compatible(alg)
    }

    fn verify(&self, alg: Algorithm, data: &[u8], signature: &[u8]) -> Result<(), AuthError> {
        if !self.is_compatible(alg) {
            return Err(AuthError::InvalidSignature);
        }

        match &self.key {
            Key::Hmac(key) => key.verify(alg, data, signature),
            Key::Rsa(key) => key.verify(alg, data, signature),
        }
    }
}

impl jws::Signer for Jwk {
    fn can_sign(&self, alg: Algorithm) -> bool {
        self.is_compatible(alg) && matches!(&self.key, Key::Hmac(_))
    }

    fn sign(&self, alg: Algorithm, data: &[u8]) -> Result<Vec<u8>, SigningError> {
        if !self.is_compatible(alg) {
            return Err(SigningError::IncompatibleKey);
        }

        match &self.key {
            Key::Hmac(key) => key.sign(alg, data),
            Key::Rsa(_) => Err(SigningError::IncompatibleKey),
        }
    }
}

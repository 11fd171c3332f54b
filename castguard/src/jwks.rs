//! Key sets published by the token issuer
//!
//! Issuers commonly publish keys this library does not support (other
//! key families, encryption keys). Deserialization keeps the keys it
//! understands and skips the rest with a warning rather than rejecting
//! the whole document.

use serde::{Deserialize, Deserializer, Serialize};

use crate::jwa::Algorithm;
use crate::jwk::{Jwk, KeyId};

/// A set of signing keys, keyed by identifier
#[derive(Clone, Debug, Default, Serialize)]
#[must_use]
pub struct Jwks {
    keys: Vec<Jwk>,
}

impl Jwks {
    /// Adds a key to the set
    pub fn add_key(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// The keys in the set
    #[must_use]
    pub fn keys(&self) -> &[Jwk] {
        &self.keys
    }

    /// Looks up the key with identifier `kid` that is compatible with
    /// `alg`
    #[must_use]
    pub fn get_key_by_id(&self, kid: &KeyId, alg: Algorithm) -> Option<&Jwk> {
        self.keys
            .iter()
            .find(|k| k.key_id() == Some(kid) && k.is_compatible(alg))
    }
}

impl<'de> Deserialize<'de> for Jwks {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum MaybeJwk {
            Jwk(Jwk),
            Unknown(serde_json::Value),
        }

        #[derive(Deserialize)]
        struct JwksDto {
            keys: Vec<MaybeJwk>,
        }

        let dto = JwksDto::deserialize(deserializer)?;

        let keys = dto
            .keys
            .into_iter()
            .filter_map(|k| match k {
                MaybeJwk::Jwk(key) => Some(key),
                MaybeJwk::Unknown(value) => {
                    tracing::warn!(
                        key = %value,
                        "unsupported key in key set, ignoring"
                    );
                    None
                }
            })
            .collect();

        Ok(Self { keys })
    }
}

//! Owned byte buffers that serialize as URL-safe base64 without padding
//!
//! Token segments and JWK parameters are carried on the wire in this
//! encoding. The wrapper stores the decoded bytes and only pays for the
//! string conversion when a value is actually encoded or displayed.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An owned byte buffer, represented externally as URL-safe base64
/// with no padding
#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[must_use]
pub struct Base64Url(Vec<u8>);

impl Base64Url {
    /// Wraps raw bytes without any decoding
    #[inline]
    pub fn from_raw(raw: impl Into<Vec<u8>>) -> Self {
        Self(raw.into())
    }

    /// Decodes a base64url string (no padding) into the underlying bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid base64url.
    pub fn from_encoded(enc: &str) -> Result<Self, base64::DecodeError> {
        Ok(Self(URL_SAFE_NO_PAD.decode(enc)?))
    }

    /// The underlying bytes
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// A mutable view of the underlying bytes
    #[inline]
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Unwraps the underlying buffer
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Base64Url {
    #[inline]
    fn from(raw: Vec<u8>) -> Self {
        Self(raw)
    }
}

impl From<&'_ [u8]> for Base64Url {
    #[inline]
    fn from(raw: &[u8]) -> Self {
        Self(raw.to_vec())
    }
}

impl fmt::Display for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(&self.0))
    }
}

impl fmt::Debug for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "`{self}`")
    }
}

impl Serialize for Base64Url {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&URL_SAFE_NO_PAD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Base64Url {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_encoded(&s).map_err(serde::de::Error::custom)
    }
}

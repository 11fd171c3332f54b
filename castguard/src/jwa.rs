//! Signature algorithms and the key material backing them
//!
//! Only the HMAC and RSA families used by the token issuer are
//! supported. A key advertises which algorithms it is compatible with,
//! and a token is only ever verified with an algorithm its key agrees
//! to.

use std::fmt;

use serde::{Deserialize, Serialize};

mod hmac;
mod rsa;

pub use hmac::Hmac;
pub use rsa::PublicKey as Rsa;

/// A signature algorithm from the HMAC or RSA family
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum Algorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
    /// RSASSA-PKCS1-v1_5 using SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    RS512,
}

impl Algorithm {
    /// The algorithm's name as it appears in a token header
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
        }
    }

    /// Whether the algorithm belongs to the symmetric HMAC family
    #[must_use]
    pub fn is_hmac(self) -> bool {
        matches!(self, Self::HS256 | Self::HS384 | Self::HS512)
    }

    /// Whether the algorithm belongs to the asymmetric RSA family
    #[must_use]
    pub fn is_rsa(self) -> bool {
        !self.is_hmac()
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

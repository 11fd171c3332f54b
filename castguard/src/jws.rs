//! Signing and verification seams
//!
//! The token pipeline only ever talks to keys through these traits, so
//! the verification logic is independent of which key family backs a
//! particular `kid`.

use crate::error::{AuthError, SigningError};
use crate::jwa::Algorithm;

/// A key that can verify the signature over a token's signing input
pub trait Verifier {
    /// Whether this key can verify signatures produced with `alg`
    fn can_verify(&self, alg: Algorithm) -> bool;

    /// Verifies `signature` over `data` using `alg`
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidSignature`] if the signature does
    /// not verify or the key is incompatible with `alg`.
    fn verify(&self, alg: Algorithm, data: &[u8], signature: &[u8]) -> Result<(), AuthError>;
}

/// A key that can produce a signature over a token's signing input
pub trait Signer {
    /// Whether this key can produce signatures with `alg`
    fn can_sign(&self, alg: Algorithm) -> bool;

    /// Signs `data` using `alg`
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot sign with `alg`.
    fn sign(&self, alg: Algorithm, data: &[u8]) -> Result<Vec<u8>, SigningError>;
}

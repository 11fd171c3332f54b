//! Classified authorization failures
//!
//! Every check in the verification pipeline reports its own failure
//! kind at the point of detection. Callers never see a partially
//! verified state; they see exactly one of these kinds, already
//! classified into the authentication (401) or authorization (403)
//! class. The display strings are the user-visible messages carried in
//! the error body.

use thiserror::Error;

/// A classified failure from the token verification pipeline
///
/// The variants are ordered the way the pipeline runs: header
/// extraction, token decoding, key lookup, signature verification,
/// claims validation, and finally the scope check. A failure at any
/// stage short-circuits the rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// No `Authorization` header was present on the request
    #[error("Authorization header is expected.")]
    MissingHeader,

    /// The `Authorization` header was not a two-part `Bearer <token>` value
    #[error("Authorization header must be a bearer token.")]
    MalformedHeader,

    /// The token did not decode into a three-segment signed token with
    /// a key identifier in its header
    #[error("Unable to parse authentication token.")]
    MalformedToken,

    /// The key identifier named by the token is not in the signing key set
    #[error("Unable to find a matching signing key.")]
    UnknownSigningKey,

    /// The signature did not verify against the located public key
    #[error("Token signature verification failed.")]
    InvalidSignature,

    /// The expiry claim is at or before the current time
    #[error("Token expired.")]
    Expired,

    /// The audience claim does not contain the expected audience
    #[error("Incorrect claims. Please, check the audience.")]
    InvalidAudience,

    /// The issuer claim does not match the expected issuer
    #[error("Incorrect claims. Please, check the issuer.")]
    InvalidIssuer,

    /// The payload carries no `permissions` claim at all
    ///
    /// Distinct from an empty permissions set: a token issued without
    /// any scope information points at an issuer misconfiguration, not
    /// at a caller asking for more than they were granted.
    #[error("Permissions not included in JWT.")]
    NoPermissionsClaim,

    /// The `permissions` claim does not contain the required scope
    #[error("Permission not found.")]
    PermissionDenied,
}

impl AuthError {
    /// The HTTP-equivalent status for this failure class
    #[must_use]
    pub fn status(&self) -> u16 {
        if self.is_authorization_failure() {
            403
        } else {
            401
        }
    }

    /// Whether the failure is in the authentication class (401)
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        !self.is_authorization_failure()
    }

    /// Whether the failure is in the authorization class (403)
    #[must_use]
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, Self::NoPermissionsClaim | Self::PermissionDenied)
    }
}

/// An error occurring while producing a signed token
#[derive(Debug, Error)]
pub enum SigningError {
    /// The key holds no secret material usable for signing
    #[error("key cannot be used for signing")]
    IncompatibleKey,

    /// The header or payload could not be serialized
    #[error("unable to serialize token part")]
    Serialization(#[from] serde_json::Error),
}

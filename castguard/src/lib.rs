//! Bearer-token verification and scope authorization for the casting
//! agency API.
//!
//! The crate implements the pipeline a protected route runs for every
//! request: split the compact token out of the `Authorization` header,
//! locate the signing key named by the token header, verify the
//! signature and the standard claims (expiry, audience, issuer), and
//! finally check that the granted `permissions` cover the scope the
//! route requires.
//!
//! ```
//! use castguard::{jwa, jwk, jwt, Authority, ClaimsValidator, Jwk, Jwks, Jwt, ScopeToken};
//! use castguard::clock::UnixTime;
//!
//! let key = Jwk::from(jwa::Hmac::new(b"test".as_slice()))
//!     .with_algorithm(jwa::Algorithm::HS256)
//!     .with_key_id(jwk::KeyId::new("test key"));
//!
//! let headers = jwt::Headers::with_key_id(jwa::Algorithm::HS256, jwk::KeyId::new("test key"));
//! let claims = jwt::Claims::new(UnixTime(u64::MAX))
//!     .with_audience(jwt::Audience::new("casting"))
//!     .with_issuer(jwt::Issuer::new("https://issuer.example.com/"))
//!     .with_permissions("read:actors".parse().unwrap());
//! let token = Jwt::try_from_parts_with_signature(&headers, &claims, &key).unwrap();
//!
//! let mut jwks = Jwks::default();
//! jwks.add_key(key);
//!
//! let validator = ClaimsValidator::new(
//!     jwt::Issuer::new("https://issuer.example.com/"),
//!     jwt::Audience::new("casting"),
//! );
//!
//! let authority = Authority::new(jwks, validator);
//! let verified = authority
//!     .verify_token(&token, &ScopeToken::from_static("read:actors"))
//!     .expect("token was valid and in scope");
//! # let _ = verified;
//! ```
//!
//! Every failure along the way is classified at the point of detection
//! into one of the [`AuthError`] kinds, which split into the
//! authentication class (401) and the authorization class (403).

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod authority;
pub mod b64;
pub mod clock;
pub mod error;
pub mod jwa;
pub mod jwk;
mod jwks;
pub mod jws;
pub mod jwt;
pub mod scope;

pub use authority::Authority;
#[cfg(feature = "reqwest")]
pub use authority::RefreshError;
#[doc(inline)]
pub use error::AuthError;
#[doc(inline)]
pub use jwk::Jwk;
#[doc(inline)]
pub use jwks::Jwks;
#[doc(inline)]
pub use jwt::{ClaimsValidator, Jwt};
#[doc(inline)]
pub use scope::{Scope, ScopeToken};

//! Compact token decoding, claims, and claims validation
//!
//! A [`Jwt`] is an opaque compact token. [`Jwt::decompose`] splits it
//! into its three segments and decodes the header, which is enough to
//! locate the signing key; [`Decomposed::verify`] then checks the
//! signature and only afterwards decodes and validates the payload, so
//! no claim is ever observable from a token whose signature has not
//! been verified.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::b64::Base64Url;
use crate::clock::{Clock, System, UnixTime};
use crate::error::{AuthError, SigningError};
use crate::jwa::Algorithm;
use crate::jwk::KeyId;
use crate::jws::{Signer, Verifier};
use crate::scope::Scope;

macro_rules! expect_two {
    ($iter:expr) => {{
        let mut iter = $iter;
        match (iter.next(), iter.next(), iter.next()) {
            (Some(first), Some(second), None) => (first, second),
            _ => return Err(AuthError::MalformedToken),
        }
    }};
}

/// An unverified compact bearer token
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[must_use]
pub struct Jwt(String);

impl Jwt {
    /// Wraps a compact token without inspecting it
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Extracts the bearer token from an `Authorization` header value
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingHeader`] when no header value is
    /// given, and [`AuthError::MalformedHeader`] when the value is not
    /// exactly a `Bearer` scheme followed by a single token.
    pub fn from_authorization_header(header: Option<&str>) -> Result<Self, AuthError> {
        let header = header.ok_or(AuthError::MissingHeader)?;

        let mut parts = header.split_whitespace();
        let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(token), None) => (scheme, token),
            _ => return Err(AuthError::MalformedHeader),
        };

        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::MalformedHeader);
        }

        Ok(Self(token.to_owned()))
    }

    /// The compact token string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the token into its segments and decodes the header
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MalformedToken`] if the token does not have
    /// exactly three segments, or if the header segment does not decode
    /// into a header naming a supported algorithm and a key identifier.
    pub fn decompose(&self) -> Result<Decomposed<'_>, AuthError> {
        let (s_str, message) = expect_two!(self.0.rsplitn(2, '.'));
        let (p_str, h_str) = expect_two!(message.rsplitn(2, '.'));

        let h_raw = Base64Url::from_encoded(h_str).map_err(|_| AuthError::MalformedToken)?;
        let header: Headers =
            serde_json::from_slice(h_raw.as_slice()).map_err(|_| AuthError::MalformedToken)?;
        let signature =
            Base64Url::from_encoded(s_str).map_err(|_| AuthError::MalformedToken)?;

        Ok(Decomposed {
            header,
            message,
            payload: p_str,
            signature,
        })
    }

    /// Signs `headers` and `claims` with `key`, producing a compact
    /// token
    ///
    /// # Errors
    ///
    /// Returns an error if a part cannot be serialized or the key
    /// cannot sign with the header's algorithm.
    pub fn try_from_parts_with_signature<C: Serialize>(
        headers: &Headers,
        claims: &C,
        key: &impl Signer,
    ) -> Result<Self, SigningError> {
        let h_raw = Base64Url::from_raw(serde_json::to_vec(headers)?);
        let p_raw = Base64Url::from_raw(serde_json::to_vec(claims)?);

        let message = format!("{h_raw}.{p_raw}");
        let signature = Base64Url::from_raw(key.sign(headers.algorithm(), message.as_bytes())?);

        Ok(Self(format!("{message}.{signature}")))
    }
}

impl fmt::Display for Jwt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens are credentials; Debug output keeps them out of logs.
impl fmt::Debug for Jwt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("***JWT***")
    }
}

/// The decoded header of a compact token
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Headers {
    alg: Algorithm,
    kid: KeyId,
}

impl Headers {
    /// Constructs a header naming the signing algorithm and key
    pub fn with_key_id(alg: Algorithm, kid: KeyId) -> Self {
        Self { alg, kid }
    }

    /// The signing algorithm named by the token
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.alg
    }

    /// The identifier of the signing key named by the token
    #[must_use]
    pub fn key_id(&self) -> &KeyId {
        &self.kid
    }
}

/// A token split into its segments with the header decoded
///
/// The payload is still raw: it is only decoded after the signature
/// over the signing input has been verified.
#[derive(Clone, Debug)]
#[must_use]
pub struct Decomposed<'a> {
    header: Headers,
    message: &'a str,
    payload: &'a str,
    signature: Base64Url,
}

impl Decomposed<'_> {
    /// The decoded token header
    #[must_use]
    pub fn header(&self) -> &Headers {
        &self.header
    }

    /// Verifies the signature with `key`, then decodes and validates
    /// the claims, using the system clock for the expiry check
    ///
    /// # Errors
    ///
    /// Returns the first failure among signature verification, payload
    /// decoding, and claims validation.
    pub fn verify(
        self,
        key: &impl Verifier,
        validator: &ClaimsValidator,
    ) -> Result<Verified, AuthError> {
        self.verify_with_clock(key, validator, &System)
    }

    /// Verifies the signature and validates the claims against the
    /// time reported by `clock`
    ///
    /// # Errors
    ///
    /// Returns the first failure among signature verification, payload
    /// decoding, and claims validation.
    pub fn verify_with_clock(
        self,
        key: &impl Verifier,
        validator: &ClaimsValidator,
        clock: &impl Clock,
    ) -> Result<Verified, AuthError> {
        key.verify(
            self.header.alg,
            self.message.as_bytes(),
            self.signature.as_slice(),
        )?;

        let p_raw =
            Base64Url::from_encoded(self.payload).map_err(|_| AuthError::MalformedToken)?;
        let claims: Claims =
            serde_json::from_slice(p_raw.as_slice()).map_err(|_| AuthError::MalformedToken)?;

        validator.validate_with_clock(&claims, clock)?;

        Ok(Verified { claims })
    }
}

/// The audience of a token
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[must_use]
pub struct Audience(String);

impl Audience {
    /// Wraps the audience string
    pub fn new(aud: impl Into<String>) -> Self {
        Self(aud.into())
    }

    /// The audience as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The issuer of a token
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[must_use]
pub struct Issuer(String);

impl Issuer {
    /// Wraps the issuer string
    pub fn new(iss: impl Into<String>) -> Self {
        Self(iss.into())
    }

    /// The issuer as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The subject of a token
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[must_use]
pub struct Subject(String);

impl Subject {
    /// Wraps the subject string
    pub fn new(sub: impl Into<String>) -> Self {
        Self(sub.into())
    }

    /// The subject as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of audiences named by a token
///
/// On the wire this is either a single string or an array of strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AudiencesDto", into = "AudiencesDto")]
#[must_use]
pub struct Audiences(Vec<Audience>);

impl Audiences {
    /// The empty audience set
    pub fn empty() -> Self {
        Self::default()
    }

    /// An audience set holding a single audience
    pub fn single(aud: Audience) -> Self {
        Self(vec![aud])
    }

    /// Whether the set holds no audiences
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the set contains `aud`
    #[must_use]
    pub fn contains(&self, aud: &Audience) -> bool {
        self.0.contains(aud)
    }
}

impl From<Audience> for Audiences {
    fn from(aud: Audience) -> Self {
        Self::single(aud)
    }
}

impl FromIterator<Audience> for Audiences {
    fn from_iter<I: IntoIterator<Item = Audience>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AudiencesDto {
    Single(Audience),
    Many(Vec<Audience>),
}

impl From<AudiencesDto> for Audiences {
    fn from(dto: AudiencesDto) -> Self {
        match dto {
            AudiencesDto::Single(aud) => Self(vec![aud]),
            AudiencesDto::Many(auds) => Self(auds),
        }
    }
}

impl From<Audiences> for AudiencesDto {
    fn from(mut auds: Audiences) -> Self {
        if auds.0.len() == 1 {
            AudiencesDto::Single(auds.0.remove(0))
        } else {
            AudiencesDto::Many(auds.0)
        }
    }
}

/// The payload claims of a token
///
/// The expiry claim is mandatory; a token without one does not parse.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[must_use]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Audiences::is_empty")]
    aud: Audiences,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<Issuer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<Subject>,
    exp: UnixTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    permissions: Option<Scope>,
}

impl Claims {
    /// Constructs a claim set expiring at `exp`
    pub fn new(exp: UnixTime) -> Self {
        Self {
            aud: Audiences::empty(),
            iss: None,
            sub: None,
            exp,
            permissions: None,
        }
    }

    /// Adds an audience
    pub fn with_audience(mut self, aud: Audience) -> Self {
        self.aud = Audiences::single(aud);
        self
    }

    /// Sets the issuer
    pub fn with_issuer(mut self, iss: Issuer) -> Self {
        self.iss = Some(iss);
        self
    }

    /// Sets the subject
    pub fn with_subject(mut self, sub: Subject) -> Self {
        self.sub = Some(sub);
        self
    }

    /// Sets the permissions claim
    pub fn with_permissions(mut self, permissions: Scope) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// The audiences named by the token
    #[must_use]
    pub fn audiences(&self) -> &Audiences {
        &self.aud
    }

    /// The token's issuer, if present
    #[must_use]
    pub fn issuer(&self) -> Option<&Issuer> {
        self.iss.as_ref()
    }

    /// The token's subject, if present
    #[must_use]
    pub fn subject(&self) -> Option<&Subject> {
        self.sub.as_ref()
    }

    /// The token's expiry
    #[must_use]
    pub fn expiry(&self) -> UnixTime {
        self.exp
    }

    /// The token's permissions claim, if present
    ///
    /// `None` means the claim was absent entirely, which is reported
    /// differently from an empty permission set.
    #[must_use]
    pub fn permissions(&self) -> Option<&Scope> {
        self.permissions.as_ref()
    }
}

/// Claims that have passed signature verification and validation
///
/// Values of this type are only produced by [`Decomposed::verify`], so
/// holding one is proof the whole pipeline ran.
#[derive(Clone, Debug)]
#[must_use]
pub struct Verified {
    claims: Claims,
}

impl Verified {
    /// The validated claims
    #[must_use]
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Unwraps the validated claims
    #[must_use]
    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

impl Deref for Verified {
    type Target = Claims;

    fn deref(&self) -> &Claims {
        &self.claims
    }
}

/// Validates the standard claims of a verified token
///
/// Checks run in a fixed order and stop at the first failure: expiry,
/// then audience, then issuer.
#[derive(Clone, Debug)]
#[must_use]
pub struct ClaimsValidator {
    issuer: Issuer,
    audience: Audience,
    leeway: u64,
}

impl ClaimsValidator {
    /// Constructs a validator requiring the given issuer and audience
    pub fn new(issuer: Issuer, audience: Audience) -> Self {
        Self {
            issuer,
            audience,
            leeway: 0,
        }
    }

    /// Allows the expiry check to lag the clock by `leeway` seconds
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    /// Validates `claims` against the system clock
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate(&self, claims: &Claims) -> Result<(), AuthError> {
        self.validate_with_clock(claims, &System)
    }

    /// Validates `claims` against the time reported by `clock`
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate_with_clock(
        &self,
        claims: &Claims,
        clock: &impl Clock,
    ) -> Result<(), AuthError> {
        let now = clock.now();

        // A token expiring exactly now is already expired.
        if claims.exp.0.saturating_add(self.leeway) <= now.0 {
            return Err(AuthError::Expired);
        }

        if !claims.aud.contains(&self.audience) {
            return Err(AuthError::InvalidAudience);
        }

        if claims.iss.as_ref() != Some(&self.issuer) {
            return Err(AuthError::InvalidIssuer);
        }

        Ok(())
    }
}

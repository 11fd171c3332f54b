//! OAuth2 scopes and the permission check
//!
//! Scope tokens follow the RFC 6749 section 3.3 grammar: one or more
//! printable ASCII characters, excluding space, double quote, and
//! backslash. A [`Scope`] is an unordered set of such tokens.

use std::collections::hash_set;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AuthError;

/// A scope token contained characters outside the allowed grammar
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum InvalidScopeToken {
    /// The scope token was the empty string
    #[error("scope token cannot be empty")]
    EmptyString,
    /// The scope token contained a byte outside the allowed grammar
    #[error("invalid scope token byte at position {position}: 0x{value:02x}")]
    InvalidByte {
        /// The index of the offending byte
        position: usize,
        /// The offending byte value
        value: u8,
    },
}

/// A single scope token, such as `read:actors`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[must_use]
pub struct ScopeToken(String);

impl ScopeToken {
    /// Validates and wraps a scope token
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty or contains a character
    /// outside the RFC 6749 grammar.
    pub fn new(token: impl Into<String>) -> Result<Self, InvalidScopeToken> {
        let token = token.into();
        if token.is_empty() {
            return Err(InvalidScopeToken::EmptyString);
        }

        for (position, &value) in token.as_bytes().iter().enumerate() {
            if value <= 0x20 || value == 0x22 || value == 0x5C || value >= 0x7F {
                return Err(InvalidScopeToken::InvalidByte { position, value });
            }
        }

        Ok(Self(token))
    }

    /// Wraps a scope token known at compile time
    ///
    /// # Panics
    ///
    /// Panics if the string is not a valid scope token.
    pub fn from_static(token: &'static str) -> Self {
        match Self::new(token) {
            Ok(t) => t,
            Err(err) => panic!("invalid static scope token {token:?}: {err}"),
        }
    }

    /// The token as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ScopeToken {
    type Err = InvalidScopeToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ScopeToken {
    type Error = InvalidScopeToken;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ScopeToken> for String {
    fn from(token: ScopeToken) -> Self {
        token.0
    }
}

/// An unordered set of scope tokens
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ScopeDto", into = "ScopeDto")]
#[must_use]
pub struct Scope(HashSet<ScopeToken>);

impl Scope {
    /// The empty scope
    pub fn empty() -> Self {
        Self::default()
    }

    /// A scope holding a single token
    pub fn single(token: ScopeToken) -> Self {
        let mut s = Self::empty();
        s.insert(token);
        s
    }

    /// Adds a token to the scope
    pub fn insert(&mut self, token: ScopeToken) {
        self.0.insert(token);
    }

    /// Adds a token, consuming and returning the scope
    pub fn and(mut self, token: ScopeToken) -> Self {
        self.insert(token);
        self
    }

    /// Whether the scope contains `token`
    #[must_use]
    pub fn contains(&self, token: &ScopeToken) -> bool {
        self.0.contains(token)
    }

    /// Whether the scope holds no tokens
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the tokens in the scope
    pub fn iter(&self) -> hash_set::Iter<'_, ScopeToken> {
        self.0.iter()
    }
}

impl FromIterator<ScopeToken> for Scope {
    fn from_iter<I: IntoIterator<Item = ScopeToken>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for Scope {
    type Err = InvalidScopeToken;

    /// Parses a space-delimited scope string
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace().map(ScopeToken::new).collect()
    }
}

/// The wire shapes a scope claim arrives in
///
/// Issuers serialize the claim either as a single space-delimited
/// string or as an array of tokens. Tokens that fail the grammar are
/// dropped with a warning rather than failing the whole claim.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ScopeDto {
    String(String),
    Array(Vec<String>),
}

impl From<ScopeDto> for Scope {
    fn from(dto: ScopeDto) -> Self {
        let keep = |t: String| match ScopeToken::new(t) {
            Ok(token) => Some(token),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring invalid scope token in claim");
                None
            }
        };

        match dto {
            ScopeDto::String(s) => s
                .split_whitespace()
                .filter_map(|t| keep(t.to_owned()))
                .collect(),
            ScopeDto::Array(arr) => arr.into_iter().filter_map(keep).collect(),
        }
    }
}

impl From<Scope> for ScopeDto {
    fn from(scope: Scope) -> Self {
        ScopeDto::Array(scope.0.into_iter().map(String::from).collect())
    }
}

/// Checks that the granted permissions cover the required scope
///
/// # Errors
///
/// Returns [`AuthError::NoPermissionsClaim`] when the token carried no
/// permissions claim at all, and [`AuthError::PermissionDenied`] when
/// the claim is present but does not contain `required`.
pub fn authorize(permissions: Option<&Scope>, required: &ScopeToken) -> Result<(), AuthError> {
    let granted = permissions.ok_or(AuthError::NoPermissionsClaim)?;
    if granted.contains(required) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied)
    }
}

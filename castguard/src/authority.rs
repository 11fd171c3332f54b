//! The authority that verifies tokens against a managed key set
//!
//! An [`Authority`] owns the current signing key set and the claims
//! validator, and runs the whole pipeline for a request: decompose the
//! token, find the key it names, verify the signature and claims, and
//! check the required scope. The key set can be held locally or
//! fetched from a remote JWKS endpoint and refreshed in the
//! background; readers never block on a refresh because the live data
//! sits behind an [`ArcSwap`].

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::clock::Clock;
use crate::error::AuthError;
use crate::jwks::Jwks;
use crate::jwt::{ClaimsValidator, Jwt, Verified};
use crate::scope::{self, ScopeToken};

#[cfg(feature = "reqwest")]
use reqwest::header::{self, HeaderValue};
#[cfg(feature = "reqwest")]
use reqwest::StatusCode;

/// An error while fetching a remote key set
#[cfg(feature = "reqwest")]
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// The request failed or the body was not a valid key set
    #[error("unable to fetch JWKS")]
    Request(#[from] reqwest::Error),
    /// The endpoint answered with an unexpected status
    #[error("unexpected status {0} from JWKS endpoint")]
    UnexpectedStatus(StatusCode),
}

#[derive(Debug)]
struct VolatileData {
    jwks: Jwks,
    #[cfg(feature = "reqwest")]
    etag: Option<HeaderValue>,
    #[cfg(feature = "reqwest")]
    last_modified: Option<HeaderValue>,
}

impl VolatileData {
    fn new(jwks: Jwks) -> Self {
        Self {
            jwks,
            #[cfg(feature = "reqwest")]
            etag: None,
            #[cfg(feature = "reqwest")]
            last_modified: None,
        }
    }
}

#[cfg(feature = "reqwest")]
#[derive(Debug)]
struct RemoteOptions {
    jwks_url: reqwest::Url,
    client: reqwest::Client,
}

#[derive(Debug)]
struct Inner {
    data: ArcSwap<VolatileData>,
    #[cfg(feature = "reqwest")]
    remote: Option<RemoteOptions>,
    validator: ClaimsValidator,
}

/// Verifies bearer tokens against the current key set
///
/// Cloning is cheap; all clones share the same live key set.
#[derive(Clone, Debug)]
#[must_use]
pub struct Authority {
    inner: Arc<Inner>,
}

impl Authority {
    /// Constructs an authority over a locally held key set
    pub fn new(jwks: Jwks, validator: ClaimsValidator) -> Self {
        Self {
            inner: Arc::new(Inner {
                data: ArcSwap::from_pointee(VolatileData::new(jwks)),
                #[cfg(feature = "reqwest")]
                remote: None,
                validator,
            }),
        }
    }

    /// Constructs an authority that fetches its key set from a remote
    /// JWKS endpoint, performing the initial fetch before returning
    ///
    /// # Errors
    ///
    /// Returns an error if the initial fetch fails.
    #[cfg(feature = "reqwest")]
    pub async fn new_from_url(
        jwks_url: impl reqwest::IntoUrl,
        validator: ClaimsValidator,
    ) -> Result<Self, RefreshError> {
        let jwks_url = jwks_url.into_url()?;
        let authority = Self {
            inner: Arc::new(Inner {
                data: ArcSwap::from_pointee(VolatileData::new(Jwks::default())),
                remote: Some(RemoteOptions {
                    jwks_url,
                    client: reqwest::Client::new(),
                }),
                validator,
            }),
        };

        authority.refresh().await?;

        Ok(authority)
    }

    /// Replaces the current key set
    pub fn set_jwks(&self, jwks: Jwks) {
        self.inner.data.store(Arc::new(VolatileData::new(jwks)));
    }

    /// Refetches the key set from the remote endpoint
    ///
    /// Conditional request headers are used when the endpoint provided
    /// them, so an unchanged key set costs a 304 round trip. Does
    /// nothing for a locally held key set.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a
    /// valid key set.
    #[cfg(feature = "reqwest")]
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        let Some(remote) = &self.inner.remote else {
            return Ok(());
        };

        let mut request = remote.client.get(remote.jwks_url.clone());

        {
            let data = self.inner.data.load();
            if let Some(etag) = &data.etag {
                request = request.header(header::IF_NONE_MATCH, etag.clone());
            }
            if let Some(last_modified) = &data.last_modified {
                request = request.header(header::IF_MODIFIED_SINCE, last_modified.clone());
            }
        }

        let response = request.send().await?;

        match response.status() {
            StatusCode::NOT_MODIFIED => {
                tracing::debug!("JWKS not modified since last fetch");
                Ok(())
            }
            StatusCode::OK => {
                let etag = response.headers().get(header::ETAG).cloned();
                let last_modified = response.headers().get(header::LAST_MODIFIED).cloned();
                let jwks = response.json::<Jwks>().await?;

                tracing::debug!(keys = jwks.keys().len(), "refreshed JWKS");
                self.inner.data.store(Arc::new(VolatileData {
                    jwks,
                    etag,
                    last_modified,
                }));
                Ok(())
            }
            status => Err(RefreshError::UnexpectedStatus(status)),
        }
    }

    /// Spawns a background task that refreshes the key set on a fixed
    /// interval
    ///
    /// Failed refreshes are logged and retried on the next tick; the
    /// last good key set stays live in the meantime.
    #[cfg(all(feature = "reqwest", feature = "tokio"))]
    pub fn spawn_refresh(&self, interval: std::time::Duration) -> tokio::task::JoinHandle<()> {
        let authority = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(error) = authority.refresh().await {
                    tracing::warn!(%error, "JWKS refresh failed");
                }
            }
        })
    }

    /// Runs the full verification pipeline for `token`, requiring the
    /// `required` scope, against the system clock
    ///
    /// # Errors
    ///
    /// Returns the first failure in the pipeline.
    pub fn verify_token(&self, token: &Jwt, required: &ScopeToken) -> Result<Verified, AuthError> {
        self.verify_token_with_clock(token, required, &crate::clock::System)
    }

    /// Runs the full verification pipeline against the time reported
    /// by `clock`
    ///
    /// # Errors
    ///
    /// Returns the first failure in the pipeline.
    pub fn verify_token_with_clock(
        &self,
        token: &Jwt,
        required: &ScopeToken,
        clock: &impl Clock,
    ) -> Result<Verified, AuthError> {
        let decomposed = token.decompose()?;

        let data = self.inner.data.load();
        let key = data
            .jwks
            .get_key_by_id(decomposed.header().key_id(), decomposed.header().algorithm())
            .ok_or_else(|| {
                tracing::debug!(
                    kid = %decomposed.header().key_id(),
                    alg = %decomposed.header().algorithm(),
                    "no matching signing key"
                );
                AuthError::UnknownSigningKey
            })?;

        let verified = decomposed.verify_with_clock(key, &self.inner.validator, clock)?;

        scope::authorize(verified.permissions(), required)?;

        Ok(verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{TestClock, UnixTime};
    use crate::jwa::{self, Algorithm};
    use crate::jwk::{Jwk, KeyId};
    use crate::jwt::{Audience, Claims, Headers, Issuer};
    use crate::scope::Scope;

    const ISSUER: &str = "https://issuer.example.com/";
    const AUDIENCE: &str = "casting";

    fn test_key() -> Jwk {
        Jwk::from(jwa::Hmac::new(b"test".as_slice()))
            .with_key_id(KeyId::new("test"))
            .with_algorithm(Algorithm::HS256)
    }

    fn authority() -> Authority {
        let mut jwks = Jwks::default();
        jwks.add_key(test_key());

        Authority::new(
            jwks,
            ClaimsValidator::new(Issuer::new(ISSUER), Audience::new(AUDIENCE)),
        )
    }

    fn claims(permissions: Option<Scope>) -> Claims {
        let claims = Claims::new(UnixTime(1000))
            .with_audience(Audience::new(AUDIENCE))
            .with_issuer(Issuer::new(ISSUER));

        match permissions {
            Some(p) => claims.with_permissions(p),
            None => claims,
        }
    }

    fn mint(claims: &Claims, key: &Jwk) -> Jwt {
        let kid = key.key_id().cloned().unwrap();
        let headers = Headers::with_key_id(Algorithm::HS256, kid);
        Jwt::try_from_parts_with_signature(&headers, claims, key).unwrap()
    }

    fn clock() -> TestClock {
        TestClock::new(UnixTime(500))
    }

    #[test]
    fn accepts_a_token_with_the_required_scope() {
        let scope = Scope::single(ScopeToken::from_static("read:actors"));
        let token = mint(&claims(Some(scope)), &test_key());
        let authority = authority();

        let verified = authority
            .verify_token_with_clock(&token, &ScopeToken::from_static("read:actors"), &clock())
            .unwrap();
        assert_eq!(verified.expiry(), UnixTime(1000));

        // A second verification of the same token is just as good.
        let _ = authority
            .verify_token_with_clock(&token, &ScopeToken::from_static("read:actors"), &clock())
            .unwrap();
    }

    #[test]
    fn unknown_key_id_is_reported_before_signature() {
        let rogue = Jwk::from(jwa::Hmac::new(b"rogue".as_slice()))
            .with_key_id(KeyId::new("rogue"))
            .with_algorithm(Algorithm::HS256);
        let token = mint(&claims(None), &rogue);

        let err = authority()
            .verify_token_with_clock(&token, &ScopeToken::from_static("read:actors"), &clock())
            .unwrap_err();
        assert_eq!(err, AuthError::UnknownSigningKey);
    }

    #[test]
    fn forged_signature_is_rejected() {
        let forger = Jwk::from(jwa::Hmac::new(b"forged".as_slice()))
            .with_key_id(KeyId::new("test"))
            .with_algorithm(Algorithm::HS256);
        let token = mint(&claims(None), &forger);

        let err = authority()
            .verify_token_with_clock(&token, &ScopeToken::from_static("read:actors"), &clock())
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidSignature);
    }

    #[test]
    fn missing_permissions_claim_is_a_distinct_failure() {
        let token = mint(&claims(None), &test_key());

        let err = authority()
            .verify_token_with_clock(&token, &ScopeToken::from_static("read:actors"), &clock())
            .unwrap_err();
        assert_eq!(err, AuthError::NoPermissionsClaim);
    }

    #[test]
    fn insufficient_permissions_are_denied() {
        let scope = Scope::single(ScopeToken::from_static("read:actors"));
        let token = mint(&claims(Some(scope)), &test_key());

        let err = authority()
            .verify_token_with_clock(&token, &ScopeToken::from_static("delete:actors"), &clock())
            .unwrap_err();
        assert_eq!(err, AuthError::PermissionDenied);
    }

    #[test]
    fn expired_token_is_rejected_before_the_scope_check() {
        let scope = Scope::single(ScopeToken::from_static("read:actors"));
        let token = mint(&claims(Some(scope)), &test_key());

        let err = authority()
            .verify_token_with_clock(
                &token,
                &ScopeToken::from_static("read:actors"),
                &TestClock::new(UnixTime(2000)),
            )
            .unwrap_err();
        assert_eq!(err, AuthError::Expired);
    }

    #[test]
    fn swapping_the_key_set_takes_effect_immediately() {
        let authority = authority();
        let token = mint(&claims(None), &test_key());

        let err = authority
            .verify_token_with_clock(&token, &ScopeToken::from_static("read:actors"), &clock())
            .unwrap_err();
        assert_eq!(err, AuthError::NoPermissionsClaim);

        authority.set_jwks(Jwks::default());

        let err = authority
            .verify_token_with_clock(&token, &ScopeToken::from_static("read:actors"), &clock())
            .unwrap_err();
        assert_eq!(err, AuthError::UnknownSigningKey);
    }
}

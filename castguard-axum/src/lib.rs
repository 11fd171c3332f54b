//! Axum integration for bearer-token authorization
//!
//! A [`RequestGuard`] wraps an [`Authority`] and is called at the top
//! of each protected handler with the request headers and the scope
//! the route requires. On failure it yields a [`Denial`], which
//! renders as the JSON error body with the appropriate status and a
//! `www-authenticate` challenge.

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

use axum::response::{IntoResponse, Response};
use axum::Json;
use castguard::jwt::Verified;
use castguard::{AuthError, Authority, Jwt, ScopeToken};
use http::{header, HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;

/// A rejected request, carrying the classified failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Denial(pub AuthError);

impl Denial {
    /// The underlying failure
    #[must_use]
    pub fn error(&self) -> AuthError {
        self.0
    }

    /// The `www-authenticate` challenge advertised for this failure
    ///
    /// A request that carried no credentials at all gets the bare
    /// scheme; failed authentication reports `invalid_token`; an
    /// authorization failure reports `insufficient_scope`.
    #[must_use]
    pub fn challenge(&self) -> HeaderValue {
        let value = match self.0 {
            AuthError::MissingHeader => String::from("Bearer"),
            err if err.is_authorization_failure() => {
                format!("Bearer error=\"insufficient_scope\", error_description=\"{err}\"")
            }
            err => format!("Bearer error=\"invalid_token\", error_description=\"{err}\""),
        };

        // The messages are fixed ASCII strings, so this cannot fail.
        HeaderValue::from_str(&value).unwrap_or(HeaderValue::from_static("Bearer"))
    }
}

impl From<AuthError> for Denial {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Denial {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: u16,
    message: String,
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = ErrorBody {
            success: false,
            error: self.0.status(),
            message: self.0.to_string(),
        };

        (
            status,
            [(header::WWW_AUTHENTICATE, self.challenge())],
            Json(body),
        )
            .into_response()
    }
}

/// Authorizes requests at the top of protected handlers
///
/// Cloning is cheap; all clones share the authority's live key set.
#[derive(Clone, Debug)]
#[must_use]
pub struct RequestGuard {
    authority: Authority,
}

impl RequestGuard {
    /// Constructs a guard over `authority`
    pub fn new(authority: Authority) -> Self {
        Self { authority }
    }

    /// Runs the verification pipeline for a request, requiring
    /// `scope`
    ///
    /// # Errors
    ///
    /// Returns a [`Denial`] describing the first failure in the
    /// pipeline.
    pub fn authorize(
        &self,
        headers: &HeaderMap,
        scope: &ScopeToken,
    ) -> Result<Verified, Denial> {
        let value = match headers.get(header::AUTHORIZATION) {
            None => None,
            Some(v) => Some(v.to_str().map_err(|_| {
                tracing::debug!("authorization header was not valid UTF-8");
                Denial(AuthError::MalformedHeader)
            })?),
        };

        let token = Jwt::from_authorization_header(value).map_err(Denial)?;

        self.authority
            .verify_token(&token, scope)
            .map_err(|error| {
                tracing::debug!(%error, scope = %scope, "request denied");
                Denial(error)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castguard::clock::UnixTime;
    use castguard::jwa::{Algorithm, Hmac};
    use castguard::jwk::{Jwk, KeyId};
    use castguard::jwt::{Audience, Claims, ClaimsValidator, Headers, Issuer};
    use castguard::scope::Scope;
    use castguard::Jwks;
    use http_body_util::BodyExt as _;

    fn test_key() -> Jwk {
        Jwk::from(Hmac::new(b"test".as_slice()))
            .with_key_id(KeyId::new("test"))
            .with_algorithm(Algorithm::HS256)
    }

    fn guard() -> RequestGuard {
        let mut jwks = Jwks::default();
        jwks.add_key(test_key());

        RequestGuard::new(Authority::new(
            jwks,
            ClaimsValidator::new(
                Issuer::new("https://issuer.example.com/"),
                Audience::new("casting"),
            ),
        ))
    }

    fn bearer(permissions: Scope) -> HeaderValue {
        let claims = Claims::new(UnixTime(u64::MAX))
            .with_audience(Audience::new("casting"))
            .with_issuer(Issuer::new("https://issuer.example.com/"))
            .with_permissions(permissions);
        let headers = Headers::with_key_id(Algorithm::HS256, KeyId::new("test"));
        let token = Jwt::try_from_parts_with_signature(&headers, &claims, &test_key()).unwrap();

        HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
    }

    #[test]
    fn authorizes_a_request_in_scope() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            bearer(Scope::single(ScopeToken::from_static("read:actors"))),
        );

        let _ = guard()
            .authorize(&headers, &ScopeToken::from_static("read:actors"))
            .unwrap();
    }

    #[test]
    fn missing_header_is_denied() {
        let err = guard()
            .authorize(&HeaderMap::new(), &ScopeToken::from_static("read:actors"))
            .unwrap_err();
        assert_eq!(err, Denial(AuthError::MissingHeader));
    }

    #[test]
    fn non_utf8_header_is_malformed() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xfe\xff").unwrap(),
        );

        let err = guard()
            .authorize(&headers, &ScopeToken::from_static("read:actors"))
            .unwrap_err();
        assert_eq!(err, Denial(AuthError::MalformedHeader));
    }

    #[test]
    fn out_of_scope_request_is_denied() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            bearer(Scope::single(ScopeToken::from_static("read:actors"))),
        );

        let err = guard()
            .authorize(&headers, &ScopeToken::from_static("delete:actors"))
            .unwrap_err();
        assert_eq!(err, Denial(AuthError::PermissionDenied));
    }

    #[test]
    fn challenge_reflects_failure_class() {
        assert_eq!(Denial(AuthError::MissingHeader).challenge(), "Bearer");
        assert_eq!(
            Denial(AuthError::Expired).challenge(),
            "Bearer error=\"invalid_token\", error_description=\"Token expired.\""
        );
        assert_eq!(
            Denial(AuthError::PermissionDenied).challenge(),
            "Bearer error=\"insufficient_scope\", error_description=\"Permission not found.\""
        );
    }

    #[tokio::test]
    async fn denial_renders_the_error_body() {
        let response = Denial(AuthError::PermissionDenied).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "error": 403,
                "message": "Permission not found."
            })
        );
    }
}

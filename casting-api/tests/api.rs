//! End-to-end route tests over the assembled router
//!
//! Tokens are minted locally against an in-process key set, so the
//! whole pipeline from the `Authorization` header down to the store
//! runs exactly as it would in production.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use castguard::clock::UnixTime;
use castguard::jwa::{Algorithm, Hmac};
use castguard::jwk::{Jwk, KeyId};
use castguard::jwt::{Audience, Claims, Headers, Issuer};
use castguard::{Authority, ClaimsValidator, Jwks, Jwt, Scope};
use castguard_axum::RequestGuard;
use casting_api::store::Store;
use casting_api::{router, AppState};
use http_body_util::BodyExt as _;
use serde_json::{json, Value};
use tower::ServiceExt as _;

const ISSUER: &str = "https://issuer.example.com/";
const AUDIENCE: &str = "casting";

fn test_key() -> Jwk {
    Jwk::from(Hmac::new(b"test".as_slice()))
        .with_key_id(KeyId::new("test"))
        .with_algorithm(Algorithm::HS256)
}

fn app() -> Router {
    let mut jwks = Jwks::default();
    jwks.add_key(test_key());

    let authority = Authority::new(
        jwks,
        ClaimsValidator::new(Issuer::new(ISSUER), Audience::new(AUDIENCE)),
    );

    router(AppState {
        store: Arc::new(Store::seeded()),
        guard: RequestGuard::new(authority),
        page_limit: 10,
    })
}

fn mint(claims: &Claims) -> String {
    let headers = Headers::with_key_id(Algorithm::HS256, KeyId::new("test"));
    let token = Jwt::try_from_parts_with_signature(&headers, claims, &test_key()).unwrap();
    format!("Bearer {token}")
}

fn bearer(scopes: &str) -> String {
    let claims = Claims::new(UnixTime(u64::MAX))
        .with_audience(Audience::new(AUDIENCE))
        .with_issuer(Issuer::new(ISSUER))
        .with_permissions(scopes.parse::<Scope>().unwrap());
    mint(&claims)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap();
    (status, json)
}

fn get(path: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

fn with_body(method: &str, path: &str, auth: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::AUTHORIZATION, auth)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn listing_actors_requires_a_token() {
    let (status, body) = send(app(), get("/actors", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({
            "success": false,
            "error": 401,
            "message": "Authorization header is expected."
        })
    );
}

#[tokio::test]
async fn listing_actors_returns_the_seeded_record() {
    let (status, body) = send(app(), get("/actors", Some(&bearer("read:actors")))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["actors"][0]["name"], "Actor1");
    assert_eq!(body["actors"][0]["age"], 25);
    assert_eq!(body["actors"][0]["gender"], "Female");
}

#[tokio::test]
async fn wrong_scope_is_denied() {
    let (status, body) = send(app(), get("/actors", Some(&bearer("read:movies")))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Permission not found.");
}

#[tokio::test]
async fn token_without_permissions_claim_is_denied() {
    let claims = Claims::new(UnixTime(u64::MAX))
        .with_audience(Audience::new(AUDIENCE))
        .with_issuer(Issuer::new(ISSUER));

    let (status, body) = send(app(), get("/actors", Some(&mint(&claims)))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Permissions not included in JWT.");
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let claims = Claims::new(UnixTime(1000))
        .with_audience(Audience::new(AUDIENCE))
        .with_issuer(Issuer::new(ISSUER))
        .with_permissions("read:actors".parse::<Scope>().unwrap());

    let (status, body) = send(app(), get("/actors", Some(&mint(&claims)))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token expired.");
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let (status, body) = send(app(), get("/actors", Some("Bearer not.a.token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unable to parse authentication token.");
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() {
    let (status, body) = send(app(), get("/actors", Some("Basic dXNlcjpwYXNz"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authorization header must be a bearer token.");
}

#[tokio::test]
async fn creating_an_actor_assigns_the_next_id() {
    let app = app();
    let auth = bearer("create:actors read:actors");

    let (status, body) = send(
        app.clone(),
        with_body(
            "POST",
            "/actors",
            &auth,
            &json!({ "name": "Actor2", "age": 30, "gender": "Male" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "actor_id": 2 }));

    let (_, body) = send(app, get("/actors", Some(&auth))).await;
    assert_eq!(body["actors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn creating_an_actor_validates_each_field() {
    let auth = bearer("create:actors");

    let (status, body) = send(
        app(),
        with_body(
            "POST",
            "/actors",
            &auth,
            &json!({ "name": "Actor2", "gender": "Male" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Age not provided.");

    let (status, body) = send(
        app(),
        with_body("POST", "/actors", &auth, &json!({ "age": 30, "gender": "Male" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Name not provided.");

    let (status, body) = send(
        app(),
        with_body("POST", "/actors", &auth, &json!({ "name": "Actor2", "age": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Gender not provided.");
}

#[tokio::test]
async fn creating_an_actor_with_no_body_is_a_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/actors")
        .header(header::AUTHORIZATION, bearer("create:actors"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "request does not contain a valid JSON body.");
}

#[tokio::test]
async fn patching_an_actor_updates_only_the_given_fields() {
    let (status, body) = send(
        app(),
        with_body("PATCH", "/actors/1", &bearer("edit:actors"), &json!({ "age": 26 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated_actor_id"], 1);
    assert_eq!(body["actor"][0]["age"], 26);
    assert_eq!(body["actor"][0]["name"], "Actor1");
}

#[tokio::test]
async fn patching_a_missing_actor_is_not_found() {
    let (status, body) = send(
        app(),
        with_body("PATCH", "/actors/99", &bearer("edit:actors"), &json!({ "age": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Actor with id 99 not found in database.");
}

#[tokio::test]
async fn patching_with_an_empty_body_is_a_bad_request() {
    let (status, body) = send(
        app(),
        with_body("PATCH", "/actors/1", &bearer("edit:actors"), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No data provided");
}

#[tokio::test]
async fn deleting_a_movie_twice_reports_not_found() {
    let app = app();
    let auth = bearer("delete:movies");

    let request = Request::builder()
        .method("DELETE")
        .uri("/movies/1")
        .header(header::AUTHORIZATION, auth.as_str())
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "deleted_movie_id": 1 }));

    let request = Request::builder()
        .method("DELETE")
        .uri("/movies/1")
        .header(header::AUTHORIZATION, auth.as_str())
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Movie with id 1 not found in database.");
}

#[tokio::test]
async fn creating_a_movie_requires_a_release_date() {
    let (status, body) = send(
        app(),
        with_body(
            "POST",
            "/movies",
            &bearer("create:movies"),
            &json!({ "title": "Movie2" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Release_date not provided");
}

#[tokio::test]
async fn creating_a_movie_round_trips_the_release_date() {
    let app = app();
    let auth = bearer("create:movies read:movies");

    let (status, body) = send(
        app.clone(),
        with_body(
            "POST",
            "/movies",
            &auth,
            &json!({ "title": "Movie2", "release_date": "2027-01-01" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "movie_id": 2 }));

    let (_, body) = send(app, get("/movies", Some(&auth))).await;
    assert_eq!(body["movies"][1]["title"], "Movie2");
    assert_eq!(body["movies"][1]["release_date"], "2027-01-01");
}

#[tokio::test]
async fn an_out_of_range_page_is_not_found() {
    let (status, body) = send(
        app(),
        get("/movies?page=2", Some(&bearer("read:movies"))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "no movies found");
}

#[tokio::test]
async fn unknown_routes_fall_back_to_not_found() {
    let (status, body) = send(app(), get("/nope", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({
            "success": false,
            "error": 404,
            "message": "resource not found"
        })
    );
}

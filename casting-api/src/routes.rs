//! Router assembly and shared request state
//!
//! Every data route authorizes the request before touching the store.
//! Each route names the single scope it requires; the guard runs the
//! whole verification pipeline and denials render as the standard
//! error body.

use std::sync::Arc;

use axum::extract::Query;
use axum::http::{header, Method};
use axum::routing::{get, patch};
use axum::Router;
use castguard_axum::RequestGuard;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ApiError;
use crate::store::Store;

pub mod actors;
pub mod movies;

/// State shared by all handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// The record store
    pub store: Arc<Store>,
    /// The authorization guard
    pub guard: RequestGuard,
    /// Records per page on list endpoints
    pub page_limit: usize,
}

/// The `page` query parameter on list endpoints
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct PageQuery {
    /// The 1-based page to return
    pub page: Option<usize>,
}

impl PageQuery {
    /// The requested page, defaulting to the first
    pub fn page(query: Option<Query<Self>>) -> usize {
        query.and_then(|Query(q)| q.page).unwrap_or(1)
    }
}

/// Builds the API router over `state`
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/actors", get(actors::list).post(actors::create))
        .route("/actors/:id", patch(actors::update).delete(actors::remove))
        .route("/movies", get(movies::list).post(movies::create))
        .route("/movies/:id", patch(movies::update).delete(movies::remove))
        .fallback(fallback)
        .layer(cors)
        .with_state(state)
}

async fn fallback() -> ApiError {
    ApiError::not_found("resource not found")
}

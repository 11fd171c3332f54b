//! Movie routes

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use castguard::ScopeToken;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::models::{MoviePatch, NewMovie};
use crate::routes::{AppState, PageQuery};
use crate::store::paginate;

/// `GET /movies`
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Option<Query<PageQuery>>,
) -> Result<Json<Value>, ApiError> {
    state
        .guard
        .authorize(&headers, &ScopeToken::from_static("read:movies"))?;

    let movies = paginate(
        state.store.list_movies(),
        PageQuery::page(query),
        state.page_limit,
    );

    if movies.is_empty() {
        return Err(ApiError::not_found("no movies found"));
    }

    Ok(Json(json!({
        "success": true,
        "movies": movies,
    })))
}

/// `POST /movies`
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<NewMovie>>,
) -> Result<Json<Value>, ApiError> {
    state
        .guard
        .authorize(&headers, &ScopeToken::from_static("create:movies"))?;

    let Some(Json(body)) = body else {
        return Err(ApiError::bad_request("no details provided in body"));
    };

    let title = body
        .title
        .filter(|title| !title.is_empty())
        .ok_or_else(|| ApiError::unprocessable("title not provided."))?;
    let release_date = body
        .release_date
        .ok_or_else(|| ApiError::unprocessable("Release_date not provided"))?;

    let movie = state.store.insert_movie(title, release_date);
    tracing::info!(id = movie.id, "created movie");

    Ok(Json(json!({
        "success": true,
        "movie_id": movie.id,
    })))
}

/// `PATCH /movies/:id`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Option<Json<MoviePatch>>,
) -> Result<Json<Value>, ApiError> {
    state
        .guard
        .authorize(&headers, &ScopeToken::from_static("edit:movies"))?;

    let patch = match body {
        Some(Json(patch)) if !patch.is_empty() => patch,
        _ => return Err(ApiError::bad_request("Update details not found")),
    };

    let movie = state.store.update_movie(id, patch).ok_or_else(|| {
        ApiError::not_found(format!("Movie with id {id} not found in database."))
    })?;

    Ok(Json(json!({
        "success": true,
        "updated_movie_id": movie.id,
        "movie": [movie],
    })))
}

/// `DELETE /movies/:id`
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    state
        .guard
        .authorize(&headers, &ScopeToken::from_static("delete:movies"))?;

    if !state.store.delete_movie(id) {
        return Err(ApiError::not_found(format!(
            "Movie with id {id} not found in database."
        )));
    }

    tracing::info!(id, "deleted movie");

    Ok(Json(json!({
        "success": true,
        "deleted_movie_id": id,
    })))
}

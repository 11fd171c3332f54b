//! Actor routes

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use castguard::ScopeToken;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::models::{ActorPatch, NewActor};
use crate::routes::{AppState, PageQuery};
use crate::store::paginate;

/// `GET /actors`
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Option<Query<PageQuery>>,
) -> Result<Json<Value>, ApiError> {
    state
        .guard
        .authorize(&headers, &ScopeToken::from_static("read:actors"))?;

    let actors = paginate(
        state.store.list_actors(),
        PageQuery::page(query),
        state.page_limit,
    );

    if actors.is_empty() {
        return Err(ApiError::not_found("no actors found in database."));
    }

    Ok(Json(json!({
        "success": true,
        "actors": actors,
    })))
}

/// `POST /actors`
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<NewActor>>,
) -> Result<Json<Value>, ApiError> {
    state
        .guard
        .authorize(&headers, &ScopeToken::from_static("create:actors"))?;

    let Some(Json(body)) = body else {
        return Err(ApiError::bad_request(
            "request does not contain a valid JSON body.",
        ));
    };

    let name = body
        .name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::unprocessable("Name not provided."))?;
    let age = body
        .age
        .filter(|&age| age != 0)
        .ok_or_else(|| ApiError::unprocessable("Age not provided."))?;
    let gender = body
        .gender
        .filter(|gender| !gender.is_empty())
        .ok_or_else(|| ApiError::unprocessable("Gender not provided."))?;

    let actor = state.store.insert_actor(name, age, gender);
    tracing::info!(id = actor.id, "created actor");

    Ok(Json(json!({
        "success": true,
        "actor_id": actor.id,
    })))
}

/// `PATCH /actors/:id`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    body: Option<Json<ActorPatch>>,
) -> Result<Json<Value>, ApiError> {
    state
        .guard
        .authorize(&headers, &ScopeToken::from_static("edit:actors"))?;

    let patch = match body {
        Some(Json(patch)) if !patch.is_empty() => patch,
        _ => return Err(ApiError::bad_request("No data provided")),
    };

    let actor = state.store.update_actor(id, patch).ok_or_else(|| {
        ApiError::not_found(format!("Actor with id {id} not found in database."))
    })?;

    Ok(Json(json!({
        "success": true,
        "updated_actor_id": actor.id,
        "actor": [actor],
    })))
}

/// `DELETE /actors/:id`
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    state
        .guard
        .authorize(&headers, &ScopeToken::from_static("delete:actors"))?;

    if !state.store.delete_actor(id) {
        return Err(ApiError::not_found(format!(
            "Actor with id {id} not found in database."
        )));
    }

    tracing::info!(id, "deleted actor");

    Ok(Json(json!({
        "success": true,
        "deleted_actor_id": id,
    })))
}

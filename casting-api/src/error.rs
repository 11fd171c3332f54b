//! API error responses
//!
//! Every failure renders as the same JSON body shape the success
//! responses complement: `success`, the numeric `error` code, and a
//! human-readable `message`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use castguard_axum::Denial;
use serde::Serialize;
use thiserror::Error;

/// A failed API request
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request was denied by the authorization layer
    #[error("{0}")]
    Denied(#[from] Denial),
    /// The request was malformed
    #[error("{0}")]
    BadRequest(String),
    /// The requested resource does not exist
    #[error("{0}")]
    NotFound(String),
    /// The request was well-formed but incomplete
    #[error("{0}")]
    Unprocessable(String),
}

impl ApiError {
    /// A 400 with the given message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// A 404 with the given message
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// A 422 with the given message
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::Unprocessable(message.into())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // The authorization layer renders its own challenge.
            Self::Denied(denial) => return denial.into_response(),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message),
            Self::Unprocessable(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
        };

        let body = ErrorBody {
            success: false,
            error: status.as_u16(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

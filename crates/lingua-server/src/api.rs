//! Shared API plumbing: the error-to-status mapping and small helpers.

use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use thiserror::Error;

/// API error type mapping to HTTP status codes.
///
/// Every variant renders a JSON body of the form `{"message": "..."}` with a
/// human-readable description; handlers translate all foreseeable failures
/// into one of these at the boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "message": message
        }));

        (status, body).into_response()
    }
}

/// Maps a [`lingua_store::StoreError`] to the correct API error, logging
/// database failures.
///
/// An absent conversation and a foreign-owned one both map to `NotFound` so
/// the response does not leak whether the identifier exists.
pub(crate) fn store_err_to_api(e: lingua_store::StoreError) -> ApiError {
    use lingua_store::StoreError;
    match e {
        StoreError::UsernameTaken(_) => ApiError::Conflict("Username already exists".to_string()),
        StoreError::ConversationNotFound(_) | StoreError::NotOwner(_) => {
            ApiError::NotFound("Conversation not found".to_string())
        }
        StoreError::Database(ref err) => {
            tracing::error!(error = %err, "store operation failed");
            ApiError::Internal("database error".to_string())
        }
    }
}

/// Current UTC time as an ISO-8601 string with fixed microsecond precision,
/// so lexicographic order matches chronological order in SQL.
pub(crate) fn now_iso() -> String {
    chrono::Utc::now()
        .to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Health check handler.
///
/// Returns `200 OK` with server status and version. Used by load balancers,
/// monitoring, and CI to verify the server is running.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn api_error_renders_json_message_body() {
        let response = ApiError::Conflict("Username already exists".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Username already exists");
    }

    #[test]
    fn now_iso_is_sortable() {
        let a = now_iso();
        let b = now_iso();
        assert!(a <= b, "timestamps should be monotonic as strings");
    }
}

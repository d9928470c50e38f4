//! Signup and login handlers.

use crate::api::{now_iso, store_err_to_api, ApiError};
use crate::AppState;
use axum::{extract::Extension, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Request body for both signup and login.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Response body for successful signup and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub token: String,
}

/// Handler for `POST /api/auth/signup`.
///
/// Hashes the password, persists the new user, and issues a session token.
/// A duplicate username is detected by the store's uniqueness constraint and
/// surfaces as `409`.
pub async fn signup_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let user_id = Uuid::new_v4().to_string();

    let jwt_secret = state.jwt_secret.clone();
    let new_user_id = user_id.clone();
    tokio::task::spawn_blocking(move || {
        // Argon2 is deliberately expensive; it runs on the blocking pool
        // together with the insert.
        let password_hash = lingua_auth::hash_password(&payload.password)
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))?;

        let conn = state.pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for signup");
            ApiError::Internal("database error".to_string())
        })?;
        lingua_store::create_user(
            &conn,
            &new_user_id,
            &payload.username,
            &password_hash,
            &now_iso(),
        )
        .map_err(store_err_to_api)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("task join error: {}", e)))??;

    let token = lingua_auth::issue_token(&jwt_secret, &user_id)
        .map_err(|e| ApiError::Internal(format!("failed to issue token: {}", e)))?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse { user_id, token }),
    ))
}

/// Handler for `POST /api/auth/login`.
///
/// An unknown username and a wrong password are indistinguishable in both
/// the response and its timing: the password is verified against a dummy
/// hash when no user row exists.
pub async fn login_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }

    let jwt_secret = state.jwt_secret.clone();
    let user = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection for login");
            ApiError::Internal("database error".to_string())
        })?;
        let user = lingua_store::find_user_by_username(&conn, &payload.username)
            .map_err(store_err_to_api)?;

        let verified = lingua_auth::verify_password(
            &payload.password,
            user.as_ref().map(|u| u.password_hash.as_str()),
        );

        match user {
            Some(user) if verified => Ok(user),
            _ => Err(ApiError::Unauthorized(
                "Invalid username or password".to_string(),
            )),
        }
    })
    .await
    .map_err(|e| ApiError::Internal(format!("task join error: {}", e)))??;

    let token = lingua_auth::issue_token(&jwt_secret, &user.user_id)
        .map_err(|e| ApiError::Internal(format!("failed to issue token: {}", e)))?;

    Ok(Json(AuthResponse {
        user_id: user.user_id,
        token,
    }))
}

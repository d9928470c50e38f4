use crate::{api::ApiError, AppState};
use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::sync::Arc;

/// The authenticated user id, stored in request extensions by
/// [`auth_middleware`].
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: String,
}

/// Middleware to authenticate requests via `Authorization: Bearer <token>`.
///
/// Tokens are stateless signed JWTs, so verification needs no database
/// round trip. A missing header, a malformed header, an invalid signature,
/// and an expired token all yield `401` before any other processing; the
/// response body does not say which.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?
        .to_string();

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or_else(|| ApiError::Internal("application state missing".to_string()))?
        .clone();

    let user_id = lingua_auth::verify_token(&state.jwt_secret, &token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    req.extensions_mut().insert(AuthContext { user_id });

    Ok(next.run(req).await)
}

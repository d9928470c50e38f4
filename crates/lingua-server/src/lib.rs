//! Lingua server library logic.

pub mod api;
pub mod api_auth;
pub mod api_conversation;
pub mod api_sse;
pub mod api_transcribe;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use lingua_db::DbPool;
use lingua_gateway::AiGateway;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
///
/// Everything with external effects is constructed once at startup and
/// injected here: the database pool, the AI gateway client, and the push
/// channel. Handlers never reach for process-wide globals.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// HMAC secret for session token signing and verification.
    pub jwt_secret: String,
    /// External AI gateway (speech-to-text, chat completion, synthesis).
    pub gateway: Arc<dyn AiGateway>,
    /// Broadcast channel for completed assistant turns (SSE stream).
    pub message_tx: broadcast::Sender<MessageEvent>,
    /// Directory for the built web client (served when present).
    pub client_dir: String,
}

/// A completed assistant turn, pushed to every connected subscriber.
#[derive(Debug, Clone, Serialize)]
pub struct MessageEvent {
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
    pub messages: Vec<PushedMessage>,
}

/// One message within a [`MessageEvent`], audio base64-encoded.
#[derive(Debug, Clone, Serialize)]
pub struct PushedMessage {
    pub id: String,
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(rename = "createTime")]
    pub create_time: String,
}

/// Publishes a completed assistant turn on the push channel.
///
/// Delivery is fire-and-forget: a send error only means no subscriber is
/// currently connected, which is logged as a warning and never fails the
/// surrounding request. There is no delivery confirmation and no ordering
/// guarantee relative to the HTTP response.
pub fn publish_message_event(tx: &broadcast::Sender<MessageEvent>, event: MessageEvent) {
    let conversation_id = event.conversation_id.clone();
    if let Err(e) = tx.send(event) {
        tracing::warn!(
            conversation_id = %conversation_id,
            "message broadcast channel send failed (no receivers): {}",
            e
        );
    }
}

/// Maximum request body size (2 MiB) for JSON endpoints.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Maximum multipart body size (25 MiB) for audio transcription uploads.
const MAX_TRANSCRIBE_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/conversation",
            post(api_conversation::submit_turn_handler),
        )
        .route(
            "/api/conversation/all",
            post(api_conversation::list_conversations_handler),
        )
        .route(
            "/api/conversation/{conversationId}",
            get(api_conversation::get_conversation_handler),
        )
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    // Transcription accepts multipart audio fragments and needs a larger
    // body limit than the global JSON ceiling.
    let transcribe_routes = Router::new()
        .route("/api/transcribe", post(api_transcribe::transcribe_handler))
        .layer(DefaultBodyLimit::max(MAX_TRANSCRIBE_BODY_BYTES))
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    let router = Router::new()
        .route("/health", get(api::health_handler))
        .route("/api/auth/signup", post(api_auth::signup_handler))
        .route("/api/auth/login", post(api_auth::login_handler))
        .route(
            "/events/messages",
            get(api_sse::get_message_stream_handler),
        )
        .merge(protected_routes)
        .merge(transcribe_routes);

    // Serve client static files if the directory exists.
    let client_dir = state.client_dir.clone();
    let router = if std::path::Path::new(&client_dir).join("index.html").exists() {
        tracing::info!(path = %client_dir, "serving client static files");
        let index = format!("{}/index.html", client_dir);
        router.fallback_service(ServeDir::new(&client_dir).fallback(ServeFile::new(index)))
    } else {
        tracing::info!(path = %client_dir, "client directory not found, skipping static file serving");
        router
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}

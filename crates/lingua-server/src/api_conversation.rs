//! Conversation turn submission, retrieval, and listing.

use crate::api::{now_iso, store_err_to_api, ApiError};
use crate::middleware::AuthContext;
use crate::{publish_message_event, AppState, MessageEvent, PushedMessage};
use axum::{
    extract::{Extension, Path},
    response::Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use lingua_gateway::ChatTurn;
use lingua_types::Role;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// How many of the most recent messages are sent as generation context.
pub const CONTEXT_WINDOW_MESSAGES: usize = 10;

/// Fixed persona instruction prepended to every completion request.
const TUTOR_SYSTEM_PROMPT: &str = "You are an English language tutor. Help the user practice \
their English speaking skills. Provide corrections, suggestions, and encouragement. Keep \
responses concise and focused on improving their English.";

/// Request body for submitting a turn.
#[derive(Debug, Deserialize)]
pub struct SubmitTurnRequest {
    #[serde(rename = "conversationId", default)]
    pub conversation_id: String,
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
}

/// A client-supplied message. Persisted as-is; only presence is validated.
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "createTime", default)]
    pub create_time: String,
}

/// Acknowledgement for a submitted turn. The assistant reply itself reaches
/// the client over the push channel, not in this response.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitTurnResponse {
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub status: String,
}

/// One message in a fetched conversation, audio base64-encoded when stored.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
    pub id: String,
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(rename = "createTime")]
    pub create_time: String,
}

/// Response body for fetching one conversation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationResponse {
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
    pub messages: Vec<MessageBody>,
}

/// Request body for listing conversations.
#[derive(Debug, Deserialize)]
pub struct ListConversationsRequest {
    #[serde(rename = "userId", default)]
    pub user_id: String,
}

/// Response body for listing conversations.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListConversationsResponse {
    pub data: Vec<ConversationSummary>,
}

/// A conversation summary. `messages` is always empty here — callers fetch
/// detail separately.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationSummary {
    #[serde(rename = "conversationId")]
    pub conversation_id: String,
    pub timestamp: String,
    pub messages: Vec<MessageBody>,
}

/// Handler for `POST /api/conversation`.
///
/// Persists the supplied messages (creating the conversation bound to the
/// caller if unseen), generates the tutor's reply from the recent context
/// window, synthesizes speech for it, persists the assistant message, and
/// publishes it on the push channel.
///
/// Gateway failures after the user turn was stored return `500` without
/// rolling the user messages back.
pub async fn submit_turn_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<SubmitTurnRequest>,
) -> Result<Json<SubmitTurnResponse>, ApiError> {
    if payload.conversation_id.is_empty() || payload.messages.is_empty() {
        return Err(ApiError::BadRequest(
            "Conversation ID and messages are required".to_string(),
        ));
    }

    let conversation_id = payload.conversation_id;
    let new_messages: Vec<lingua_store::NewMessage> = payload
        .messages
        .into_iter()
        .map(|m| lingua_store::NewMessage {
            id: m.id,
            role: m.role,
            content: m.content,
            create_time: m.create_time,
        })
        .collect();

    // 1. Persist the user's turn; the store creates the conversation on
    //    first use and rejects appends to a foreign conversation.
    {
        let pool = state.pool.clone();
        let cid = conversation_id.clone();
        let uid = auth.user_id.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(|e| {
                tracing::error!(error = %e, "failed to get db connection for submit_turn");
                ApiError::Internal("database error".to_string())
            })?;
            lingua_store::append_turn(&conn, &cid, &uid, &now_iso(), &new_messages)
                .map_err(store_err_to_api)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("task join error: {}", e)))??;
    }

    // 2. Load the generation context window.
    let context = {
        let pool = state.pool.clone();
        let cid = conversation_id.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(|e| {
                tracing::error!(error = %e, "failed to get db connection for context window");
                ApiError::Internal("database error".to_string())
            })?;
            lingua_store::recent_context(&conn, &cid, CONTEXT_WINDOW_MESSAGES)
                .map_err(store_err_to_api)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("task join error: {}", e)))??
    };

    // 3. Tutor persona + context → single top completion.
    let mut turns = Vec::with_capacity(context.len() + 1);
    turns.push(ChatTurn::new(Role::System.as_str(), TUTOR_SYSTEM_PROMPT));
    turns.extend(
        context
            .into_iter()
            .map(|turn| ChatTurn::new(turn.role, turn.content)),
    );

    let completion = state.gateway.complete(&turns).await.map_err(|e| {
        tracing::error!(error = %e, conversation_id = %conversation_id, "chat completion failed");
        ApiError::Internal(format!("Error generating AI response: {}", e))
    })?;

    // 4. Synthesize speech for the full reply.
    let audio = state.gateway.synthesize(&completion).await.map_err(|e| {
        tracing::error!(error = %e, conversation_id = %conversation_id, "speech synthesis failed");
        ApiError::Internal(format!("Error generating AI response: {}", e))
    })?;

    // 5. Persist the assistant message.
    let message_id = Uuid::new_v4().to_string();
    let create_time = now_iso();
    {
        let pool = state.pool.clone();
        let cid = conversation_id.clone();
        let mid = message_id.clone();
        let content = completion.clone();
        let audio = audio.clone();
        let ts = create_time.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(|e| {
                tracing::error!(error = %e, "failed to get db connection for assistant insert");
                ApiError::Internal("database error".to_string())
            })?;
            lingua_store::insert_assistant_message(&conn, &cid, &mid, &content, &audio, &ts)
                .map_err(store_err_to_api)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("task join error: {}", e)))??;
    }

    // 6. Push the completed reply to every subscriber.
    publish_message_event(
        &state.message_tx,
        MessageEvent {
            conversation_id: conversation_id.clone(),
            messages: vec![PushedMessage {
                id: message_id.clone(),
                role: Role::Assistant.as_str().to_string(),
                content: completion,
                audio: Some(BASE64.encode(&audio)),
                create_time,
            }],
        },
    );

    Ok(Json(SubmitTurnResponse {
        conversation_id,
        message_id,
        status: "streaming".to_string(),
    }))
}

/// Handler for `GET /api/conversation/{conversationId}`.
///
/// Returns all messages ascending. A conversation that does not exist and
/// one owned by another user are both `404`.
pub async fn get_conversation_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let messages = {
        let pool = state.pool.clone();
        let cid = conversation_id.clone();
        let uid = auth.user_id.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(|e| {
                tracing::error!(error = %e, "failed to get db connection for get_conversation");
                ApiError::Internal("database error".to_string())
            })?;
            lingua_store::get_owned_conversation(&conn, &cid, &uid).map_err(store_err_to_api)?;
            lingua_store::list_messages(&conn, &cid).map_err(store_err_to_api)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("task join error: {}", e)))??
    };

    let messages = messages
        .into_iter()
        .map(|m| MessageBody {
            id: m.id,
            role: m.role,
            content: m.content,
            audio: m.audio.map(|bytes| BASE64.encode(bytes)),
            create_time: m.create_time,
        })
        .collect();

    Ok(Json(ConversationResponse {
        conversation_id,
        messages,
    }))
}

/// Handler for `POST /api/conversation/all`.
///
/// The caller-supplied user id must equal the authenticated identity;
/// returns summaries only, newest first.
pub async fn list_conversations_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<ListConversationsRequest>,
) -> Result<Json<ListConversationsResponse>, ApiError> {
    if payload.user_id != auth.user_id {
        return Err(ApiError::Unauthorized("Unauthorized".to_string()));
    }

    let conversations = {
        let pool = state.pool.clone();
        let uid = auth.user_id.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(|e| {
                tracing::error!(error = %e, "failed to get db connection for list_conversations");
                ApiError::Internal("database error".to_string())
            })?;
            lingua_store::list_conversations(&conn, &uid).map_err(store_err_to_api)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("task join error: {}", e)))??
    };

    Ok(Json(ListConversationsResponse {
        data: conversations
            .into_iter()
            .map(|c| ConversationSummary {
                conversation_id: c.conversation_id,
                timestamp: c.created_at,
                messages: Vec::new(),
            })
            .collect(),
    }))
}

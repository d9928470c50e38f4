//! Audio transcription handler.

use crate::api::ApiError;
use crate::middleware::AuthContext;
use crate::AppState;
use axum::{
    extract::{Extension, Multipart},
    response::Json,
};
use lingua_gateway::transcode_to_wav;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Multipart field-name prefix identifying audio fragments.
const AUDIO_PART_PREFIX: &str = "chunk_";

/// Response body for a successful transcription.
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub text: String,
}

/// Handler for `POST /api/transcribe`.
///
/// Concatenates every `chunk_*` multipart part in arrival order, transcodes
/// the result to WAV, and submits it for English transcription. The
/// temporary transcoding artifact is cleaned up on every exit path inside
/// [`transcode_to_wav`].
pub async fn transcribe_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(_auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut combined = Vec::new();
    let mut fragments = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if !name.starts_with(AUDIO_PART_PREFIX) {
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read part {}: {}", name, e)))?;
        combined.extend_from_slice(&data);
        fragments += 1;
    }

    if fragments == 0 {
        return Err(ApiError::BadRequest("No audio data provided".to_string()));
    }

    let wav = transcode_to_wav(&combined).await.map_err(|e| {
        tracing::error!(error = %e, fragments, "audio transcoding failed");
        ApiError::Internal(format!("Error transcribing audio: {}", e))
    })?;

    let text = state.gateway.transcribe(wav).await.map_err(|e| {
        tracing::error!(error = %e, "transcription gateway call failed");
        ApiError::Internal(format!("Error transcribing audio: {}", e))
    })?;

    Ok(Json(TranscribeResponse { text }))
}

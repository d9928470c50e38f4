use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::{AiGateway, ChatTurn};
use async_trait::async_trait;
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token budget for each tutor completion.
pub const COMPLETION_MAX_TOKENS: u32 = 700;

/// Sampling temperature for tutor completions.
pub const COMPLETION_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatTurn,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Client for an OpenAI-compatible provider.
#[derive(Debug)]
pub struct OpenAiGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl OpenAiGateway {
    /// Builds a client with the configured per-request timeout.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Reads a failed response body into an [`GatewayError::Api`].
    async fn api_error(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        GatewayError::Api { status, message }
    }
}

#[async_trait]
impl AiGateway for OpenAiGateway {
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String, GatewayError> {
        let file_part = multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(GatewayError::Http)?;
        let form = multipart::Form::new()
            .part("file", file_part)
            .text("model", self.config.stt_model.clone())
            .text("language", "en");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let transcription: TranscriptionResponse = response.json().await?;
        Ok(transcription.text)
    }

    async fn complete(&self, turns: &[ChatTurn]) -> Result<String, GatewayError> {
        let request = CompletionRequest {
            model: &self.config.chat_model,
            messages: turns,
            max_tokens: COMPLETION_MAX_TOKENS,
            temperature: COMPLETION_TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(GatewayError::EmptyCompletion)
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, GatewayError> {
        let request = SpeechRequest {
            model: &self.config.tts_model,
            voice: &self.config.voice,
            input: text,
        };

        let response = self
            .client
            .post(format!("{}/audio/speech", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        Ok(response.bytes().await?.to_vec())
    }
}

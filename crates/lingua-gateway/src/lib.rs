//! External AI gateway clients for the Lingua backend.
//!
//! Everything conversational in Lingua is delegated to hosted services
//! reached over HTTPS: speech-to-text, chat completion, and speech
//! synthesis. This crate marshals payloads to and from an OpenAI-compatible
//! API and hides the provider behind the [`AiGateway`] trait so the server
//! receives an injected client and tests can substitute a fake.
//!
//! Audio arriving from browsers is an arbitrary container (usually WebM);
//! [`transcode_to_wav`] normalizes it with `ffmpeg` before transcription.

pub mod config;
pub mod error;
pub mod openai;
pub mod transcode;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use openai::OpenAiGateway;
pub use transcode::transcode_to_wav;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One turn of generation context.
///
/// The role is a plain string: stored messages flow through to the provider
/// untouched, and the submission contract does not validate roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// The seam between request handlers and hosted AI services.
///
/// Implementations must be cheap to share behind an `Arc`; every method is a
/// single upstream round trip with the client's request timeout applied.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Transcribes a WAV recording to English text.
    async fn transcribe(&self, wav: Vec<u8>) -> Result<String, GatewayError>;

    /// Generates the single top completion for the given context.
    async fn complete(&self, turns: &[ChatTurn]) -> Result<String, GatewayError>;

    /// Synthesizes speech audio for the given text.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, GatewayError>;
}

use serde::Deserialize;
use std::fmt;

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4".to_string()
}

fn default_stt_model() -> String {
    "whisper-1".to_string()
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Connection settings for the hosted AI provider.
///
/// Any OpenAI-compatible endpoint works; `base_url` points at the `/v1`
/// root. The API key is the only secret and is redacted from `Debug` output.
#[derive(Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Chat-completion model identifier.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Speech-to-text model identifier.
    #[serde(default = "default_stt_model")]
    pub stt_model: String,

    /// Text-to-speech model identifier.
    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// Voice identity for synthesized replies.
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Per-request timeout in seconds. A slow upstream call fails after this
    /// rather than holding its connection open indefinitely.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            chat_model: default_chat_model(),
            stt_model: default_stt_model(),
            tts_model: default_tts_model(),
            voice: default_voice(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("chat_model", &self.chat_model)
            .field("stt_model", &self.stt_model)
            .field("tts_model", &self.tts_model)
            .field("voice", &self.voice)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: GatewayConfig = toml::from_str("api_key = \"sk-test\"").unwrap();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.chat_model, "gpt-4");
        assert_eq!(config.stt_model, "whisper-1");
        assert_eq!(config.tts_model, "tts-1");
        assert_eq!(config.voice, "alloy");
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = GatewayConfig {
            api_key: "sk-very-secret".to_string(),
            ..GatewayConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}

//! AI client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables checked for the API key, in order.
const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// REST endpoint root, without a trailing slash
    pub base_url: String,
    /// Never written back out with the rest of the config
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub chat_model: String,
    pub text_model: String,
    pub image_model: String,
    pub video_model: String,
    pub speech_model: String,
    pub analysis_model: String,
    /// Voice used when none is requested
    pub default_voice: String,
    /// Delay between long-running operation polls
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
}

impl AiConfig {
    /// Defaults with the API key taken from the environment.
    pub fn from_env() -> Self {
        let api_key = API_KEY_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty());

        Self {
            api_key,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            chat_model: "gemini-2.5-flash".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "imagen-4.0-generate-001".to_string(),
            video_model: "veo-3.0-fast-generate-001".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            analysis_model: "gemini-2.5-flash".to_string(),
            default_voice: "Kore".to_string(),
            poll_interval_ms: 10_000,
            max_poll_attempts: 60,
        }
    }
}

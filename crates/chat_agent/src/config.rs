//! Client configuration and credential loading.

use std::env;

use crate::error::{AgentError, Result};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Default chat-completions endpoint.
pub const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp:free";

/// Default system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that provides concise answers.";

/// Default `HTTP-Referer` header value sent with each request.
pub const DEFAULT_REFERER: &str = "http://localhost";

/// Default `X-Title` header value sent with each request.
pub const DEFAULT_TITLE: &str = "Basic Gemini Agent";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Immutable configuration for a [`ChatCompletionClient`](crate::ChatCompletionClient).
///
/// Created once at startup and owned by the client for its lifetime.
#[derive(Clone)]
pub struct ClientConfig {
    pub model: String,
    pub system_prompt: String,
    pub api_key: String,
    pub base_url: String,
    pub referer: String,
    pub title: String,
}

impl ClientConfig {
    /// Create a config with the default endpoint and request headers.
    pub fn new(
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.into(),
            api_key: api_key.into(),
            base_url: OPENROUTER_API_URL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
        }
    }

    /// Set a custom endpoint URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the `HTTP-Referer` header value.
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    /// Set the `X-Title` header value.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish()
    }
}

/// Mask an API key for logging: first 8 and last 4 characters visible.
///
/// Keys too short to mask meaningfully are replaced with asterisks.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "*".repeat(chars.len())
    }
}

/// Read the API key from `OPENROUTER_API_KEY`.
///
/// Emits `api_key_loaded` (with the masked key) or `api_key_missing`.
/// A missing or empty key is reported as [`AgentError::MissingApiKey`]
/// so the host decides whether that is fatal.
pub fn api_key_from_env(sink: &dyn TelemetrySink) -> Result<String> {
    match env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => {
            sink.record(&TelemetryEvent::ApiKeyLoaded {
                masked_key: mask_api_key(&key),
            });
            Ok(key)
        }
        _ => {
            sink.record(&TelemetryEvent::ApiKeyMissing);
            Err(AgentError::MissingApiKey)
        }
    }
}

//! chat_agent: single-turn chat-completion client with structured telemetry
//!
//! This library wraps one blocking round trip to an OpenRouter-style
//! chat-completions endpoint:
//! - Build the request from a model identifier, a fixed system prompt and
//!   a user prompt
//! - POST it with bearer auth and attribution headers
//! - Extract the reply text and token usage from the response
//! - Emit a structured telemetry event at every stage
//!
//! No retries, no streaming, no conversation state.
//!
//! # Example
//!
//! ```no_run
//! use chat_agent::{ChatCompletionClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> chat_agent::Result<()> {
//!     let config = ClientConfig::new(
//!         "google/gemini-2.0-flash-exp:free",
//!         "You are a helpful assistant that provides concise answers.",
//!         std::env::var("OPENROUTER_API_KEY").unwrap_or_default(),
//!     );
//!     let client = ChatCompletionClient::with_tracing(config)?;
//!
//!     let completion = client.complete("What can you tell me about yourself?").await?;
//!     println!("{}", completion.text);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod error;

// Configuration module
pub mod config;

// Observability
pub mod telemetry;

// Core functionality
pub mod model;

// Re-export commonly used types and functions
pub use error::{AgentError, Result};

// Config re-exports
pub use config::{
    api_key_from_env, mask_api_key, ClientConfig, API_KEY_ENV, DEFAULT_MODEL, DEFAULT_REFERER,
    DEFAULT_SYSTEM_PROMPT, DEFAULT_TITLE, OPENROUTER_API_URL,
};

// Telemetry re-exports
pub use telemetry::{CaptureSink, NullSink, TelemetryEvent, TelemetrySink, TracingSink};

// Model re-exports
pub use model::{
    ChatCompletionClient, ChatMessage, Completion, CompletionRequest, CompletionResponse, Role,
    TokenUsage,
};

/// Error types for chat-completion calls
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("OPENROUTER_API_KEY is not set or empty")]
    MissingApiKey,

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned HTTP {status}")]
    Http { status: u16, body: String },

    #[error("Malformed completion response: {reason}")]
    MalformedResponse { reason: String, body: String },
}

impl AgentError {
    /// Raw response body captured alongside the error, if one was received.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Http { body, .. } | Self::MalformedResponse { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

//! Wire types for the chat-completions JSON schema.

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Message role on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request body for one completion call.
///
/// Always carries exactly two messages: the fixed system prompt followed
/// by the user prompt.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, system_prompt: &str, prompt: &str) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(prompt)],
        }
    }
}

/// Token counters reported by the provider.
///
/// Counters absent from the payload default to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Response body of a completion call.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: String,
}

/// Parse a response body and pull out the reply text and usage counters.
///
/// The text is the trimmed content of the first choice. Fails when the
/// body is not valid JSON for the schema or the `choices` array is empty;
/// the raw body travels with the error.
pub fn extract_payload(body: &str) -> Result<(String, TokenUsage)> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|e| AgentError::MalformedResponse {
            reason: e.to_string(),
            body: body.to_string(),
        })?;

    let choice = response
        .choices
        .first()
        .ok_or_else(|| AgentError::MalformedResponse {
            reason: "response contained no choices".to_string(),
            body: body.to_string(),
        })?;

    Ok((choice.message.content.trim().to_string(), response.usage))
}

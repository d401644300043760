//! Chat-completion client module
//!
//! This module provides:
//! - `client`: request execution and telemetry emission
//! - `wire`: serde types for the chat-completions schema

mod client;
mod wire;

pub use client::{ChatCompletionClient, Completion};
pub use wire::{
    extract_payload, ChatMessage, CompletionRequest, CompletionResponse, Role, TokenUsage,
};

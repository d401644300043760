//! Telemetry events emitted around each completion call.
//!
//! The client records structured events through the [`TelemetrySink`] trait
//! and never talks to an observability backend directly. [`TracingSink`]
//! forwards everything to the `tracing` ecosystem, so any installed
//! subscriber (fmt, OpenTelemetry, ...) picks the events up without extra
//! configuration.

use std::sync::Mutex;

use tracing::{error, info};

/// A structured event recorded at a fixed point of the request lifecycle.
///
/// Field names match what ends up on the wire of the observability backend.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    ApiKeyLoaded {
        masked_key: String,
    },
    ApiKeyMissing,
    AgentInitialized {
        model: String,
        system_prompt_length: usize,
    },
    RequestStart {
        model: String,
        prompt_length: usize,
        system_prompt_length: usize,
        prompt: String,
        system_prompt: String,
    },
    Response {
        model: String,
        prompt_length: usize,
        response_length: usize,
        total_tokens: u64,
        prompt_tokens: u64,
        completion_tokens: u64,
        response_time_ms: u64,
        success: bool,
        response_content: String,
    },
    Error {
        error: String,
        model: String,
        prompt_length: usize,
        response_text: String,
        traceback: String,
    },
}

impl TelemetryEvent {
    /// Stable event name, as emitted to the backend.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ApiKeyLoaded { .. } => "api_key_loaded",
            Self::ApiKeyMissing => "api_key_missing",
            Self::AgentInitialized { .. } => "agent_initialized",
            Self::RequestStart { .. } => "openrouter_request_start",
            Self::Response { .. } => "openrouter_response",
            Self::Error { .. } => "openrouter_error",
        }
    }
}

/// Capability to record telemetry events.
///
/// Implementations must be cheap and infallible; the request path never
/// waits on or reacts to the sink.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: &TelemetryEvent);
}

/// Default sink: forwards every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&self, event: &TelemetryEvent) {
        match event {
            TelemetryEvent::ApiKeyLoaded { masked_key } => {
                info!(%masked_key, "api_key_loaded");
            }
            TelemetryEvent::ApiKeyMissing => {
                error!("api_key_missing");
            }
            TelemetryEvent::AgentInitialized {
                model,
                system_prompt_length,
            } => {
                info!(%model, system_prompt_length, "agent_initialized");
            }
            TelemetryEvent::RequestStart {
                model,
                prompt_length,
                system_prompt_length,
                prompt,
                system_prompt,
            } => {
                info!(
                    %model,
                    prompt_length,
                    system_prompt_length,
                    %prompt,
                    %system_prompt,
                    "openrouter_request_start"
                );
            }
            TelemetryEvent::Response {
                model,
                prompt_length,
                response_length,
                total_tokens,
                prompt_tokens,
                completion_tokens,
                response_time_ms,
                success,
                response_content,
            } => {
                info!(
                    %model,
                    prompt_length,
                    response_length,
                    total_tokens,
                    prompt_tokens,
                    completion_tokens,
                    response_time_ms,
                    success,
                    %response_content,
                    "openrouter_response"
                );
            }
            TelemetryEvent::Error {
                error,
                model,
                prompt_length,
                response_text,
                traceback,
            } => {
                error!(
                    %error,
                    %model,
                    prompt_length,
                    %response_text,
                    %traceback,
                    "openrouter_error"
                );
            }
        }
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&self, _event: &TelemetryEvent) {}
}

/// Sink that keeps events in memory, for inspection by tests or hosts.
#[derive(Debug, Default)]
pub struct CaptureSink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far, in order.
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().expect("telemetry capture poisoned").clone()
    }

    /// Names of all events recorded so far, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(TelemetryEvent::name).collect()
    }
}

impl TelemetrySink for CaptureSink {
    fn record(&self, event: &TelemetryEvent) {
        self.events
            .lock()
            .expect("telemetry capture poisoned")
            .push(event.clone());
    }
}

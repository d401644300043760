//! Chat-completion client: one request, one reply, telemetry around both.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ClientConfig;
use crate::error::{AgentError, Result};
use crate::model::wire::{extract_payload, CompletionRequest, TokenUsage};
use crate::telemetry::{TelemetryEvent, TelemetrySink, TracingSink};

/// A successful completion.
#[derive(Debug, Clone)]
pub struct Completion {
    /// Trimmed content of the first choice.
    pub text: String,
    /// Token counters, zeroed when the provider omitted them.
    pub usage: TokenUsage,
    /// Wall-clock time from just before the request to just after parsing.
    pub latency: Duration,
}

/// Client for a single-turn chat-completion API.
///
/// Holds only immutable configuration, so one instance can be shared
/// across concurrent callers; each [`complete`](Self::complete) call is an
/// independent round trip with no cross-call state.
pub struct ChatCompletionClient {
    config: ClientConfig,
    http: reqwest::Client,
    sink: Arc<dyn TelemetrySink>,
}

impl std::fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionClient {
    /// Create a client, failing fast on an empty API key.
    ///
    /// Emits `agent_initialized` once construction succeeds.
    pub fn new(config: ClientConfig, sink: Arc<dyn TelemetrySink>) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AgentError::MissingApiKey);
        }

        let http = reqwest::Client::builder().build()?;

        sink.record(&TelemetryEvent::AgentInitialized {
            model: config.model.clone(),
            system_prompt_length: config.system_prompt.len(),
        });

        Ok(Self { config, http, sink })
    }

    /// Create a client that reports telemetry through `tracing`.
    pub fn with_tracing(config: ClientConfig) -> Result<Self> {
        Self::new(config, Arc::new(TracingSink))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send one user prompt and return the assistant's reply.
    ///
    /// Performs a single POST with the configured model, system prompt and
    /// headers. No retries, no explicit timeout beyond the transport
    /// default, no cancellation surface.
    ///
    /// Leniency, kept from the observed server behavior this client was
    /// built against: when the call fails but a response body was received
    /// that still parses to a non-empty `choices` array, the reply is
    /// extracted and returned as a success after the `openrouter_error`
    /// event is emitted. Hosts that need strict failures should watch for
    /// that event.
    pub async fn complete(&self, prompt: &str) -> Result<Completion> {
        let request = CompletionRequest::new(&self.config.model, &self.config.system_prompt, prompt);

        self.sink.record(&TelemetryEvent::RequestStart {
            model: self.config.model.clone(),
            prompt_length: prompt.len(),
            system_prompt_length: self.config.system_prompt.len(),
            prompt: prompt.to_string(),
            system_prompt: self.config.system_prompt.clone(),
        });

        let started = Instant::now();

        let outcome = match self.execute(&request).await {
            Ok(body) => extract_payload(&body),
            Err(err) => Err(err),
        };

        match outcome {
            Ok((text, usage)) => {
                let latency = started.elapsed();
                self.sink.record(&TelemetryEvent::Response {
                    model: self.config.model.clone(),
                    prompt_length: prompt.len(),
                    response_length: text.len(),
                    total_tokens: usage.total_tokens,
                    prompt_tokens: usage.prompt_tokens,
                    completion_tokens: usage.completion_tokens,
                    response_time_ms: latency.as_millis() as u64,
                    success: true,
                    response_content: text.clone(),
                });
                Ok(Completion {
                    text,
                    usage,
                    latency,
                })
            }
            Err(err) => self.salvage(prompt, started, err),
        }
    }

    /// POST the request and return the body, failing on transport errors
    /// and non-2xx statuses. The body is read before the status check so
    /// error responses keep their payload.
    async fn execute(&self, request: &CompletionRequest) -> Result<String> {
        let response = self
            .http
            .post(&self.config.base_url)
            .bearer_auth(&self.config.api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AgentError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    /// Record the error event, then try to recover a reply from whatever
    /// body came back with the failure.
    fn salvage(&self, prompt: &str, started: Instant, err: AgentError) -> Result<Completion> {
        self.sink.record(&TelemetryEvent::Error {
            error: err.to_string(),
            model: self.config.model.clone(),
            prompt_length: prompt.len(),
            response_text: err
                .response_body()
                .filter(|body| !body.is_empty())
                .unwrap_or("No response")
                .to_string(),
            traceback: describe_chain(&err),
        });

        if let Some(body) = err.response_body() {
            if let Ok((text, usage)) = extract_payload(body) {
                return Ok(Completion {
                    text,
                    usage,
                    latency: started.elapsed(),
                });
            }
        }

        Err(err)
    }
}

/// Render an error and its source chain, one cause per line.
fn describe_chain(err: &AgentError) -> String {
    use std::error::Error;

    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str("\ncaused by: ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::CaptureSink;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT: &str = "/api/v1/chat/completions";

    fn test_client(base_url: String) -> (ChatCompletionClient, Arc<CaptureSink>) {
        let sink = Arc::new(CaptureSink::new());
        let config = ClientConfig::new("m1", "S", "test-key").with_base_url(base_url);
        let client = ChatCompletionClient::new(config, sink.clone()).expect("client");
        (client, sink)
    }

    async fn mock_endpoint(server: &MockServer, template: ResponseTemplate, expect: u64) {
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(template)
            .expect(expect)
            .mount(server)
            .await;
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let config = ClientConfig::new("m1", "S", "  ");
        let err = ChatCompletionClient::new(config, Arc::new(CaptureSink::new())).unwrap_err();
        assert!(matches!(err, AgentError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_returns_trimmed_content_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_partial_json(json!({
                "model": "m1",
                "messages": [
                    {"role": "system", "content": "S"},
                    {"role": "user", "content": "Hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": " Hi there "}}],
                "usage": {"total_tokens": 5}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, sink) = test_client(format!("{}{}", server.uri(), ENDPOINT));
        let completion = client.complete("Hello").await.expect("success");

        assert_eq!(completion.text, "Hi there");
        assert_eq!(completion.usage.total_tokens, 5);
        assert_eq!(completion.usage.prompt_tokens, 0);
        assert_eq!(completion.usage.completion_tokens, 0);

        assert_eq!(
            sink.names(),
            vec![
                "agent_initialized",
                "openrouter_request_start",
                "openrouter_response"
            ]
        );
        match &sink.events()[2] {
            TelemetryEvent::Response {
                success,
                response_content,
                total_tokens,
                ..
            } => {
                assert!(*success);
                assert_eq!(response_content, "Hi there");
                assert_eq!(*total_tokens, 5);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_defaults_usage_when_absent() {
        let server = MockServer::start().await;
        mock_endpoint(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })),
            1,
        )
        .await;

        let (client, _) = test_client(format!("{}{}", server.uri(), ENDPOINT));
        let completion = client.complete("Hello").await.expect("success");

        assert_eq!(completion.usage, TokenUsage::default());
    }

    #[tokio::test]
    async fn test_sends_auth_and_attribution_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(header("Authorization", "Bearer test-key"))
            .and(header("HTTP-Referer", "http://localhost"))
            .and(header("X-Title", "Basic Gemini Agent"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (client, _) = test_client(format!("{}{}", server.uri(), ENDPOINT));
        client.complete("Hello").await.expect("success");
    }

    #[tokio::test]
    async fn test_salvages_reply_from_error_response() {
        let server = MockServer::start().await;
        mock_endpoint(
            &server,
            ResponseTemplate::new(500).set_body_json(json!({
                "choices": [{"message": {"content": " still here "}}]
            })),
            1,
        )
        .await;

        let (client, sink) = test_client(format!("{}{}", server.uri(), ENDPOINT));
        let completion = client.complete("Hello").await.expect("salvaged");

        assert_eq!(completion.text, "still here");
        assert_eq!(
            sink.names(),
            vec![
                "agent_initialized",
                "openrouter_request_start",
                "openrouter_error"
            ]
        );
        match &sink.events()[2] {
            TelemetryEvent::Error {
                error,
                response_text,
                ..
            } => {
                assert!(error.contains("500"));
                assert!(response_text.contains("still here"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_status_without_usable_body_fails() {
        let server = MockServer::start().await;
        mock_endpoint(
            &server,
            ResponseTemplate::new(500).set_body_string("Internal Server Error"),
            1,
        )
        .await;

        let (client, sink) = test_client(format!("{}{}", server.uri(), ENDPOINT));
        let err = client.complete("Hello").await.unwrap_err();

        assert!(matches!(err, AgentError::Http { status: 500, .. }));
        assert_eq!(err.response_body(), Some("Internal Server Error"));
        assert!(sink.names().contains(&"openrouter_error"));
    }

    #[tokio::test]
    async fn test_empty_choices_fails() {
        let server = MockServer::start().await;
        mock_endpoint(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({"choices": []})),
            1,
        )
        .await;

        let (client, sink) = test_client(format!("{}{}", server.uri(), ENDPOINT));
        let err = client.complete("Hello").await.unwrap_err();

        assert!(matches!(err, AgentError::MalformedResponse { .. }));
        assert_eq!(
            sink.names(),
            vec![
                "agent_initialized",
                "openrouter_request_start",
                "openrouter_error"
            ]
        );
    }

    #[tokio::test]
    async fn test_connection_refused_fails() {
        // Port 1 has no listener; the connect fails before any response.
        let (client, sink) = test_client("http://127.0.0.1:1/".to_string());
        let err = client.complete("Hello").await.unwrap_err();

        assert!(matches!(err, AgentError::Transport(_)));
        assert!(err.response_body().is_none());

        match sink.events().last() {
            Some(TelemetryEvent::Error { response_text, .. }) => {
                assert_eq!(response_text, "No response");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_repeated_calls_are_independent() {
        let server = MockServer::start().await;
        mock_endpoint(
            &server,
            ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "same"}}],
                "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
            })),
            2,
        )
        .await;

        let (client, sink) = test_client(format!("{}{}", server.uri(), ENDPOINT));
        let first = client.complete("Hello").await.expect("first");
        let second = client.complete("Hello").await.expect("second");

        assert_eq!(first.text, second.text);
        assert_eq!(first.usage, second.usage);
        // One request_start and one response per call, no shared state.
        assert_eq!(
            sink.names(),
            vec![
                "agent_initialized",
                "openrouter_request_start",
                "openrouter_response",
                "openrouter_request_start",
                "openrouter_response"
            ]
        );
    }
}

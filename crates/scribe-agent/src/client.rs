//! Anthropic API client
//!
//! One `generate` call is one role invocation: the client keeps sending the
//! conversation back to the API, running requested tools in between, until
//! the model answers without asking for a tool.

use crate::auth;
use crate::circuit_breaker::CircuitBreaker;
use crate::generator::{ChatRole, GenerationRequest, Generator};
use crate::tools::{truncate, ToolOutput, Toolbox};
use crate::types::{
    AnthropicMessage, AnthropicRequest, AnthropicResponse, ContentBlock, MessageContent, Usage,
};
use async_trait::async_trait;
use scribe_core::{ModelSettings, Result, ScribeError};
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const REQUEST_TIMEOUT_SECS: u64 = 300;

// Rate limit retry configuration
const MAX_RETRIES: u32 = 5;
const INITIAL_BACKOFF_SECS: u64 = 30;
const MAX_BACKOFF_SECS: u64 = 300; // 5 minutes max

/// Longest THOUGHT message emitted before a tool call
const THOUGHT_LIMIT: usize = 200;

/// Generator backed by the Anthropic Messages API
#[derive(Debug)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_url: String,
    api_key_env: String,
    max_retries: u32,
    initial_backoff: Duration,
    circuit_breaker: CircuitBreaker,
}

impl AnthropicClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: ANTHROPIC_API_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_secs(INITIAL_BACKOFF_SECS),
            circuit_breaker: CircuitBreaker::default(),
        }
    }

    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self::new().with_api_key_env(&settings.api_key_env)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Environment variable holding the API key
    pub fn with_api_key_env(mut self, name: impl Into<String>) -> Self {
        self.api_key_env = name.into();
        self
    }

    /// Retries for 429/5xx responses and the first backoff delay
    pub fn with_retry_policy(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: CircuitBreaker) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// Send one request, retrying rate limits and server errors
    async fn send(&self, request: &AnthropicRequest, api_key: &str) -> Result<AnthropicResponse> {
        self.circuit_breaker.check()?;

        let mut retries = 0;
        let mut backoff = self.initial_backoff;
        let max_backoff = Duration::from_secs(MAX_BACKOFF_SECS);

        loop {
            tracing::debug!("Sending request to Anthropic API (attempt {})", retries + 1);

            let response = match self
                .http
                .post(&self.api_url)
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .json(request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    return Err(self.fail(ScribeError::Transient(format!(
                        "Failed to send request: {}",
                        e
                    ))));
                }
            };

            let status = response.status();

            // Handle rate limit (429) with retry
            if status.as_u16() == 429 {
                retries += 1;

                if retries > self.max_retries {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown".to_string());
                    return Err(self.fail(ScribeError::ApiLimit(format!(
                        "Rate limit exceeded after {} retries. Last error: {}",
                        self.max_retries, error_text
                    ))));
                }

                // Parse retry-after header if present, otherwise use exponential backoff
                let wait = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(backoff);

                tracing::warn!(
                    "Rate limited (429). Waiting {:?} before retry {}/{}",
                    wait,
                    retries,
                    self.max_retries
                );

                tokio::time::sleep(wait).await;
                backoff = (backoff * 2).min(max_backoff);
                continue;
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown".to_string());

                // Retry on 5xx errors
                if status.is_server_error() {
                    if retries < self.max_retries {
                        retries += 1;
                        tracing::warn!(
                            "Server error ({}). Waiting {:?} before retry {}/{}",
                            status,
                            backoff,
                            retries,
                            self.max_retries
                        );
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(max_backoff);
                        continue;
                    }

                    return Err(self.fail(ScribeError::Transient(format!(
                        "Anthropic API error {} after {} retries: {}",
                        status, self.max_retries, error_text
                    ))));
                }

                // Non-retryable client error
                return Err(self.fail(ScribeError::Api(format!(
                    "Anthropic API error {}: {}",
                    status, error_text
                ))));
            }

            let parsed: AnthropicResponse = response
                .json()
                .await
                .map_err(|e| ScribeError::Api(format!("Failed to parse response: {}", e)))?;

            self.circuit_breaker.record_success();
            return Ok(parsed);
        }
    }

    /// Feed a failed request to the circuit breaker and hand the error back
    fn fail(&self, error: ScribeError) -> ScribeError {
        if self.circuit_breaker.record_failure(&error) {
            tracing::error!(
                "Generation service unavailable ({} consecutive failure(s)): {}",
                self.circuit_breaker.failure_count(),
                error
            );
        }
        error
    }
}

/// Run a tool call without stalling other tasks on a multi-thread runtime
///
/// Tools do blocking file and lock work. `block_in_place` panics on a
/// current-thread runtime, so there the call runs inline.
fn call_tool(tools: &dyn Toolbox, name: &str, input: &serde_json::Value) -> ToolOutput {
    let multi_thread = Handle::try_current()
        .map(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread)
        .unwrap_or(false);

    if multi_thread {
        tokio::task::block_in_place(|| tools.call(name, input))
    } else {
        tools.call(name, input)
    }
}

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for AnthropicClient {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String> {
        let GenerationRequest {
            role,
            directive,
            input,
            history,
            tools,
            progress,
        } = request;

        tracing::info!("Invoking {} role with model {}", role.role, role.model);

        let api_key = auth::get_auth_token(&self.api_key_env)?;

        let mut messages: Vec<AnthropicMessage> = history
            .into_iter()
            .map(|turn| AnthropicMessage {
                role: match turn.role {
                    ChatRole::User => "user".to_string(),
                    ChatRole::Assistant => "assistant".to_string(),
                },
                content: MessageContent::Text(turn.content),
            })
            .collect();
        messages.push(AnthropicMessage::user_text(input));

        let mut usage = Usage::default();
        let mut request = AnthropicRequest {
            model: role.model.api_name().to_string(),
            max_tokens: role.max_tokens,
            system: (!directive.is_empty()).then(|| directive.to_string()),
            messages,
            tools: tools.definitions(),
        };

        for round in 0..=role.max_tool_rounds {
            let response = self.send(&request, &api_key).await?;
            if let Some(ref round_usage) = response.usage {
                usage.add(round_usage);
            }

            if !response.wants_tools() {
                let output = response.text();
                tracing::info!(
                    "{} role complete ({} chars, {} input tokens, {} output tokens)",
                    role.role,
                    output.len(),
                    usage.input_tokens,
                    usage.output_tokens
                );
                return Ok(output);
            }

            if round == role.max_tool_rounds {
                break;
            }

            if let Some(thought) = response.text().lines().find(|l| !l.trim().is_empty()) {
                progress.thought(truncate(thought.trim(), THOUGHT_LIMIT));
            }

            let results: Vec<ContentBlock> = response
                .tool_uses()
                .into_iter()
                .map(|(id, name, input)| {
                    let output = call_tool(tools, name, input);
                    ContentBlock::ToolResult {
                        tool_use_id: id.to_string(),
                        content: output.content,
                        is_error: output.is_error,
                    }
                })
                .collect();

            let assistant_blocks: Vec<ContentBlock> = response
                .content
                .into_iter()
                .filter(|block| *block != ContentBlock::Unsupported)
                .collect();

            request.messages.push(AnthropicMessage {
                role: "assistant".to_string(),
                content: MessageContent::Blocks(assistant_blocks),
            });
            request.messages.push(AnthropicMessage {
                role: "user".to_string(),
                content: MessageContent::Blocks(results),
            });
        }

        Err(ScribeError::Api(format!(
            "{} role exceeded {} tool round(s) without a final answer",
            role.role, role.max_tool_rounds
        )))
    }
}

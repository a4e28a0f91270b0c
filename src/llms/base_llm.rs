//! Base completion trait and shared provider state.
//!
//! The pipeline treats the language model as an opaque function
//! `complete(messages, params) -> text`. Concrete providers implement
//! [`BaseLLM`]; tests substitute [`ScriptedLLM`].

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::utilities::errors::LlmError;

/// Default request timeout when a provider is built without configuration.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Role of a message in a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LLMMessage {
    pub role: Role,
    pub content: String,
}

impl LLMMessage {
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

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling parameters for a single completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionParams {
    /// Overrides the provider's configured model for this call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionParams {
    pub fn new(temperature: Option<f64>, max_tokens: Option<u32>) -> Self {
        Self {
            model: None,
            temperature,
            max_tokens,
        }
    }

    /// Builder-style model override.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

// ---------------------------------------------------------------------------
// BaseLLM trait
// ---------------------------------------------------------------------------

/// A text-completion backend.
///
/// Implementations may be slow and non-deterministic, and their text may be
/// malformed. They must surface transport and API failures as [`LlmError`]
/// and must not retry beyond their own transport policy.
#[async_trait]
pub trait BaseLLM: Send + Sync + fmt::Debug {
    /// The default model identifier.
    fn model(&self) -> &str;

    /// Provider name used in logs and errors.
    fn provider(&self) -> &str {
        "openai"
    }

    /// Run one completion and return the generated text.
    async fn complete(
        &self,
        messages: &[LLMMessage],
        params: &CompletionParams,
    ) -> Result<String, LlmError>;
}

// ---------------------------------------------------------------------------
// BaseLLMState - shared state for HTTP providers
// ---------------------------------------------------------------------------

/// Shared configuration for HTTP completion providers.
///
/// Concrete providers embed this and delegate to its helpers.
#[derive(Debug, Clone)]
pub struct BaseLLMState {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub provider: String,
    pub timeout: Duration,
    /// Extra attempts after a 429 or 5xx response.
    pub max_retries: u32,
    pub client: reqwest::Client,
}

impl BaseLLMState {
    /// Create state for `model` with the given provider name.
    pub fn new(model: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            base_url: None,
            provider: provider.into(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: 0,
            client: reqwest::Client::new(),
        }
    }

    /// Rebuild the HTTP client with the given timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::transport(&self.provider, e))?;
        self.timeout = timeout;
        Ok(self)
    }

    /// The model to use for a call, honoring a per-call override.
    pub fn resolve_model<'a>(&'a self, params: &'a CompletionParams) -> &'a str {
        params.model.as_deref().unwrap_or(&self.model)
    }

    /// The API key, or [`LlmError::Unauthenticated`].
    pub fn require_api_key(&self) -> Result<&str, LlmError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| LlmError::Unauthenticated {
                provider: self.provider.clone(),
            })
    }

    /// Send a prepared request, retrying 429/5xx responses with exponential
    /// backoff up to `max_retries` times, and return the parsed JSON body.
    pub async fn send_json(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<serde_json::Value, LlmError> {
        let provider = self.provider.as_str();
        let mut last_error: Option<LlmError> = None;
        let mut retry_delay = Duration::from_secs(1);

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                log::warn!(
                    "{} API retry attempt {} after {:?}",
                    provider,
                    attempt,
                    retry_delay
                );
                tokio::time::sleep(retry_delay).await;
                retry_delay *= 2;
            }

            let response = build()
                .send()
                .await
                .map_err(|e| LlmError::transport(provider, e))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| LlmError::transport(provider, e))?;

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_error = Some(LlmError::Status {
                    provider: provider.to_string(),
                    status: status.as_u16(),
                    body: preview(&body),
                });
                continue;
            }

            if !status.is_success() {
                return Err(LlmError::Status {
                    provider: provider.to_string(),
                    status: status.as_u16(),
                    body: preview(&body),
                });
            }

            return serde_json::from_str(&body).map_err(|e| {
                LlmError::malformed(provider, format!("{} - Body: {}", e, preview(&body)))
            });
        }

        Err(last_error.unwrap_or_else(|| {
            LlmError::transport(provider, "request failed after all retries")
        }))
    }
}

/// First 500 characters of a response body, for error messages.
fn preview(body: &str) -> String {
    crate::utilities::string_utils::truncate_chars(body, 500)
}

// ---------------------------------------------------------------------------
// ScriptedLLM - deterministic backend for tests and offline runs
// ---------------------------------------------------------------------------

/// A backend that replays queued responses in order and records every
/// request it receives.
///
/// When the queue runs dry it answers with an [`LlmError::Transport`].
#[derive(Debug, Default)]
pub struct ScriptedLLM {
    responses: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<(Vec<LLMMessage>, CompletionParams)>>,
}

impl ScriptedLLM {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response.
    pub fn push(&self, response: impl Into<String>) {
        self.responses.lock().push_back(Ok(response.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, message: impl Into<String>) {
        self.responses.lock().push_back(Err(message.into()));
    }

    /// Every request seen so far, in call order.
    pub fn requests(&self) -> Vec<(Vec<LLMMessage>, CompletionParams)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl BaseLLM for ScriptedLLM {
    fn model(&self) -> &str {
        "scripted"
    }

    fn provider(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        messages: &[LLMMessage],
        params: &CompletionParams,
    ) -> Result<String, LlmError> {
        self.requests
            .lock()
            .push((messages.to_vec(), params.clone()));
        match self.responses.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(LlmError::transport("scripted", message)),
            None => Err(LlmError::transport("scripted", "no scripted response left")),
        }
    }
}

//! OpenAI Chat Completions provider.
//!
//! Speaks the `/chat/completions` wire format, so it also serves any
//! OpenAI-compatible endpoint (Groq, local gateways) via `base_url`.

use async_trait::async_trait;
use serde_json::Value;

use crate::llms::base_llm::{BaseLLM, BaseLLMState, CompletionParams, LLMMessage};
use crate::utilities::errors::LlmError;

/// Default API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible completion backend.
///
/// # Example
///
/// ```ignore
/// let provider = OpenAICompletion::new("gpt-4o-mini", Some(key), None);
/// let text = provider.complete(&messages, &CompletionParams::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct OpenAICompletion {
    pub state: BaseLLMState,
    /// Organization ID for multi-tenant access.
    pub organization: Option<String>,
}

impl OpenAICompletion {
    /// Create a new provider.
    ///
    /// # Arguments
    ///
    /// * `model` - Model name (e.g., "gpt-4o-mini", "openai/gpt-oss-120b" on Groq).
    /// * `api_key` - API key.
    /// * `base_url` - Optional custom base URL.
    pub fn new(model: impl Into<String>, api_key: Option<String>, base_url: Option<String>) -> Self {
        let mut state = BaseLLMState::new(model, "openai");
        state.api_key = api_key;
        state.base_url = base_url;

        Self {
            state,
            organization: std::env::var("OPENAI_ORGANIZATION").ok(),
        }
    }

    /// Get the API base URL.
    pub fn api_base_url(&self) -> String {
        self.state
            .base_url
            .clone()
            .unwrap_or_else(|| OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    /// Build the request body for the Chat Completions API.
    pub fn build_request_body(&self, messages: &[LLMMessage], params: &CompletionParams) -> Value {
        let mut body = serde_json::json!({
            "model": self.state.resolve_model(params),
            "messages": messages,
        });

        if let Some(temp) = params.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        if let Some(max_tokens) = params.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    /// Extract the assistant text from a Chat Completions response.
    fn parse_completions_response(&self, response: &Value) -> Result<String, LlmError> {
        let provider = self.provider();
        let message = response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|choice| choice.get("message"))
            .ok_or_else(|| LlmError::malformed(provider, "no choices[0].message in response"))?;

        // Log token usage if present
        if let Some(usage) = response.get("usage") {
            log::debug!(
                "OpenAI token usage: prompt={}, completion={}, total={}",
                usage.get("prompt_tokens").and_then(|v| v.as_i64()).unwrap_or(0),
                usage.get("completion_tokens").and_then(|v| v.as_i64()).unwrap_or(0),
                usage.get("total_tokens").and_then(|v| v.as_i64()).unwrap_or(0),
            );
        }

        Ok(message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or("")
            .to_string())
    }
}

#[async_trait]
impl BaseLLM for OpenAICompletion {
    fn model(&self) -> &str {
        &self.state.model
    }

    fn provider(&self) -> &str {
        &self.state.provider
    }

    async fn complete(
        &self,
        messages: &[LLMMessage],
        params: &CompletionParams,
    ) -> Result<String, LlmError> {
        log::debug!(
            "OpenAICompletion.complete: model={}, messages={}",
            self.state.resolve_model(params),
            messages.len(),
        );

        let api_key = self.state.require_api_key()?;
        let body = self.build_request_body(messages, params);
        let endpoint = format!("{}/chat/completions", self.api_base_url());

        let response = self
            .state
            .send_json(|| {
                let mut request = self
                    .state
                    .client
                    .post(&endpoint)
                    .header("Content-Type", "application/json")
                    .bearer_auth(api_key);
                if let Some(ref org) = self.organization {
                    request = request.header("OpenAI-Organization", org);
                }
                request.json(&body)
            })
            .await?;

        self.parse_completions_response(&response)
    }
}

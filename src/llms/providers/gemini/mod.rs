//! Google Gemini `generateContent` provider.
//!
//! System messages are lifted into `systemInstruction`; assistant turns are
//! sent with the Gemini role `model`.

use async_trait::async_trait;
use serde_json::Value;

use crate::llms::base_llm::{BaseLLM, BaseLLMState, CompletionParams, LLMMessage, Role};
use crate::utilities::errors::LlmError;

/// Default API base URL.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini completion backend.
#[derive(Debug, Clone)]
pub struct GeminiCompletion {
    pub state: BaseLLMState,
}

impl GeminiCompletion {
    /// Create a new Gemini provider.
    ///
    /// # Arguments
    ///
    /// * `model` - Gemini model name (e.g., "gemini-1.5-flash").
    /// * `api_key` - API key.
    /// * `base_url` - Optional custom base URL.
    pub fn new(model: impl Into<String>, api_key: Option<String>, base_url: Option<String>) -> Self {
        let mut state = BaseLLMState::new(model, "gemini");
        state.api_key = api_key;
        state.base_url = base_url;
        Self { state }
    }

    /// Get the API endpoint URL for a model.
    fn api_endpoint(&self, model: &str) -> String {
        let base = self
            .state
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_BASE_URL)
            .trim_end_matches('/');
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:generateContent", base, model)
    }

    /// Build generation config for the Gemini API.
    pub fn generation_config(params: &CompletionParams) -> Value {
        let mut config = serde_json::Map::new();
        if let Some(temp) = params.temperature {
            config.insert("temperature".to_string(), serde_json::json!(temp));
        }
        if let Some(max_tokens) = params.max_tokens {
            config.insert("maxOutputTokens".to_string(), serde_json::json!(max_tokens));
        }
        Value::Object(config)
    }

    /// Split messages into a system instruction and Gemini `contents`.
    fn format_messages(messages: &[LLMMessage]) -> (Option<String>, Vec<Value>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut contents: Vec<Value> = Vec::new();

        for msg in messages {
            let gemini_role = match msg.role {
                Role::System => {
                    system_parts.push(&msg.content);
                    continue;
                }
                Role::Assistant => "model",
                Role::User => "user",
            };
            contents.push(serde_json::json!({
                "role": gemini_role,
                "parts": [{ "text": msg.content }],
            }));
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        (system, contents)
    }

    /// Build the complete request body.
    pub fn build_request_body(messages: &[LLMMessage], params: &CompletionParams) -> Value {
        let (system, contents) = Self::format_messages(messages);

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": Self::generation_config(params),
        });

        if let Some(system_text) = system {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": system_text }]
            });
        }

        body
    }

    /// Join the text parts of the first candidate.
    fn parse_response(&self, response: &Value) -> Result<String, LlmError> {
        let provider = self.provider();

        if let Some(error) = response.get("error") {
            let msg = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown Gemini API error");
            return Err(LlmError::malformed(provider, msg));
        }

        let parts = response
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|candidate| candidate.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| LlmError::malformed(provider, "no candidates[0].content.parts"))?;

        if let Some(usage) = response.get("usageMetadata") {
            log::debug!(
                "Gemini usage: prompt={}, completion={}",
                usage.get("promptTokenCount").and_then(|v| v.as_i64()).unwrap_or(0),
                usage.get("candidatesTokenCount").and_then(|v| v.as_i64()).unwrap_or(0),
            );
        }

        Ok(parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join(""))
    }
}

#[async_trait]
impl BaseLLM for GeminiCompletion {
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
        let model = self.state.resolve_model(params);
        log::debug!(
            "GeminiCompletion.complete: model={}, messages={}",
            model,
            messages.len(),
        );

        let api_key = self.state.require_api_key()?;
        let body = Self::build_request_body(messages, params);
        let endpoint = self.api_endpoint(model);

        let response = self
            .state
            .send_json(|| {
                self.state
                    .client
                    .post(&endpoint)
                    .header("content-type", "application/json")
                    .query(&[("key", api_key)])
                    .json(&body)
            })
            .await?;

        self.parse_response(&response)
    }
}

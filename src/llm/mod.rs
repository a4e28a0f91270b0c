//! Provider routing.
//!
//! Turns an [`LlmConfig`] into a ready-to-use completion backend. Routing is
//! by explicit provider; [`Provider::infer`] supplies it from the model name
//! when the configuration leaves it out.

use std::sync::Arc;

use crate::llms::base_llm::BaseLLM;
use crate::llms::providers::gemini::GeminiCompletion;
use crate::llms::providers::openai::OpenAICompletion;
use crate::utilities::config::{LlmConfig, Provider};
use crate::utilities::errors::LlmError;

/// Build the completion backend described by `config`.
pub fn create_llm(config: &LlmConfig) -> Result<Arc<dyn BaseLLM>, LlmError> {
    let llm: Arc<dyn BaseLLM> = match config.provider {
        Provider::OpenAI => {
            let mut provider = OpenAICompletion::new(
                config.model.clone(),
                Some(config.api_key.clone()),
                config.base_url.clone(),
            );
            provider.state = provider.state.with_timeout(config.timeout)?;
            provider.state.max_retries = config.max_retries;
            Arc::new(provider)
        }
        Provider::Gemini => {
            let mut provider = GeminiCompletion::new(
                config.model.clone(),
                Some(config.api_key.clone()),
                config.base_url.clone(),
            );
            provider.state = provider.state.with_timeout(config.timeout)?;
            provider.state.max_retries = config.max_retries;
            Arc::new(provider)
        }
    };

    tracing::debug!(
        provider = llm.provider(),
        model = llm.model(),
        "completion backend ready"
    );
    Ok(llm)
}

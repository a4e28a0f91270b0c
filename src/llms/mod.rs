//! Completion backends.
//!
//! - [`base_llm`] - The [`BaseLLM`] trait, message types, and shared HTTP state
//! - [`providers`] - OpenAI-compatible and Gemini implementations

pub mod base_llm;
pub mod providers;

pub use base_llm::{BaseLLM, BaseLLMState, CompletionParams, LLMMessage, Role, ScriptedLLM};

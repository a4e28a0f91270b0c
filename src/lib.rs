//! # cloneme
//!
//! Persona-grounded dialogue simulation and compatibility scoring.
//!
//! Two identities each get a clone grounded in a short list of approved
//! facts. The clones talk for a fixed number of rounds, the transcript is
//! reduced to deterministic features, and a model-written summary is
//! recovered and normalized into a report that always has every field.
//!
//! ```text
//! MemoryBank → persona prompts → DialogueEngine → FeatureExtractor
//!                                              ↘ Summarizer → Report
//! ```
//!
//! [`Matchmaker`] is the entry point.

pub mod chat;
pub mod cli;
pub mod evaluation;
pub mod llm;
pub mod llms;
pub mod memory;
pub mod orchestrator;
pub mod persona;
pub mod utilities;

pub use chat::{DialogueEngine, Speaker, Transcript, Turn};
pub use evaluation::{FeatureExtractor, FeatureVector, Lexicon, Report};
pub use llm::create_llm;
pub use llms::base_llm::{BaseLLM, CompletionParams, LLMMessage};
pub use memory::{MemoryBank, MemoryRecord};
pub use orchestrator::{Matchmaker, DEFAULT_TURNS};
pub use utilities::config::Config;
pub use utilities::errors::{ConfigError, LlmError, MatchError, StoreError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Completion provider implementations.
//!
//! Each provider implements [`BaseLLM`](crate::llms::base_llm::BaseLLM) and
//! handles authentication, request formatting, and response parsing for its
//! wire format.
//!
//! | Provider | Module | Endpoint |
//! |----------|--------|----------|
//! | OpenAI (and compatible, e.g. Groq) | [`openai`] | `POST {base}/chat/completions` |
//! | Gemini | [`gemini`] | `POST {base}/models/{model}:generateContent` |

pub mod gemini;
pub mod openai;

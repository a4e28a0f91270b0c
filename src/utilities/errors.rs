//! Error types for the matchmaking pipeline.
//!
//! Two policies live side by side: dialogue generation fails hard
//! ([`MatchError::Completion`]), while summarization fails soft and never
//! surfaces an error at all (see [`crate::evaluation::summarizer`]).

use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No credential was found for the selected provider.
    #[error("Missing credential: set {var}")]
    MissingCredential { var: String },

    /// A configuration value could not be interpreted.
    #[error("Invalid configuration value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Errors from a completion backend.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The request never produced an HTTP response (connect, timeout, TLS).
    #[error("{provider} transport error: {message}")]
    Transport { provider: String, message: String },

    /// The API answered with a non-success status.
    #[error("{provider} API error ({status}): {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    /// The API answered 2xx but the body was not the expected shape.
    #[error("{provider} returned a malformed response: {message}")]
    MalformedResponse { provider: String, message: String },

    /// No credential available at call time.
    #[error("{provider} API key not set")]
    Unauthenticated { provider: String },
}

impl LlmError {
    pub fn transport(provider: &str, err: impl std::fmt::Display) -> Self {
        Self::Transport {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }

    pub fn malformed(provider: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

/// Errors from the memory store and its persistence backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Memory store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Memory store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Lexicon parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Memory store database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A lexicon table that parsed but cannot be used.
    #[error("Invalid lexicon: {0}")]
    Lexicon(String),

    /// The intake source could not produce answers.
    #[error("Intake failed for {identity}: {message}")]
    Intake { identity: String, message: String },
}

/// Errors that abort a whole `score(...)` run.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A dialogue turn (or the quick-score prompt) failed; a partial
    /// transcript is not scoreable.
    #[error("Completion failed: {0}")]
    Completion(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// A blocking worker (memory intake) panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for MatchError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

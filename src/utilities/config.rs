//! Environment-driven configuration.
//!
//! All values come from process environment variables (optionally seeded
//! from a `.env` file). Resolution goes through a lookup closure so tests
//! can supply a plain map instead of mutating the process environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::llms::base_llm::CompletionParams;
use crate::utilities::errors::ConfigError;
use crate::utilities::paths::default_store_path;

/// Default model when `CLONEME_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Base URL used when the credential came from `GROQ_API_KEY`.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Which wire format the completion backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI Chat Completions (and compatible endpoints such as Groq).
    OpenAI,
    /// Google Gemini `generateContent`.
    Gemini,
}

impl Provider {
    /// Infer the provider from a model identifier.
    pub fn infer(model: &str) -> Self {
        let lower = model.to_lowercase();
        if lower.starts_with("gemini") || lower.starts_with("models/gemini") {
            Self::Gemini
        } else {
            Self::OpenAI
        }
    }

    fn credential_vars(self) -> &'static [&'static str] {
        match self {
            Self::OpenAI => &["CLONEME_API_KEY", "OPENAI_API_KEY", "GROQ_API_KEY"],
            Self::Gemini => &["CLONEME_API_KEY", "GOOGLE_API_KEY", "GEMINI_API_KEY"],
        }
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "groq" => Ok(Self::OpenAI),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(ConfigError::Invalid {
                key: "CLONEME_PROVIDER".to_string(),
                message: format!("unknown provider '{}'", other),
            }),
        }
    }
}

/// Connection settings for the completion backend.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub timeout: Duration,
    /// Transport-level retries on 429/5xx. The pipeline itself never retries.
    pub max_retries: u32,
}

/// Sampling parameters for the two kinds of completion the pipeline makes.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub dialogue: CompletionParams,
    pub summary: CompletionParams,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            dialogue: CompletionParams::new(Some(0.9), Some(160)),
            summary: CompletionParams::new(Some(0.2), Some(500)),
        }
    }
}

/// Memory persistence backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Json,
    Sqlite,
}

impl StoreBackend {
    fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Sqlite => "db",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: PathBuf,
}

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub generation: GenerationSettings,
    pub store: StoreConfig,
    /// Optional YAML lexicon overriding the built-in topic table.
    pub lexicon_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let model = get("CLONEME_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let provider = match get("CLONEME_PROVIDER") {
            Some(p) => p.parse()?,
            None => Provider::infer(&model),
        };

        let vars = provider.credential_vars();
        let (credential_var, api_key) = vars
            .iter()
            .find_map(|var| get(*var).map(|value| (*var, value)))
            .ok_or_else(|| ConfigError::MissingCredential {
                var: vars.join(" or "),
            })?;

        let base_url = get("CLONEME_BASE_URL").or_else(|| {
            (credential_var == "GROQ_API_KEY").then(|| GROQ_BASE_URL.to_string())
        });

        let timeout_secs: u64 = parse_or(&get, "CLONEME_TIMEOUT_SECS", 60)?;
        let max_retries: u32 = parse_or(&get, "CLONEME_MAX_RETRIES", 0)?;

        let defaults = GenerationSettings::default();
        let generation = GenerationSettings {
            dialogue: CompletionParams::new(
                Some(parse_or(
                    &get,
                    "CLONEME_DIALOGUE_TEMPERATURE",
                    defaults.dialogue.temperature.unwrap_or(0.9),
                )?),
                Some(parse_or(
                    &get,
                    "CLONEME_DIALOGUE_MAX_TOKENS",
                    defaults.dialogue.max_tokens.unwrap_or(160),
                )?),
            ),
            summary: CompletionParams::new(
                Some(parse_or(
                    &get,
                    "CLONEME_SUMMARY_TEMPERATURE",
                    defaults.summary.temperature.unwrap_or(0.2),
                )?),
                Some(parse_or(
                    &get,
                    "CLONEME_SUMMARY_MAX_TOKENS",
                    defaults.summary.max_tokens.unwrap_or(500),
                )?),
            ),
        };

        let backend = match get("CLONEME_STORE").as_deref().map(str::to_lowercase) {
            None => StoreBackend::Json,
            Some(ref s) if s == "json" => StoreBackend::Json,
            Some(ref s) if s == "sqlite" => StoreBackend::Sqlite,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "CLONEME_STORE".to_string(),
                    message: format!("expected 'json' or 'sqlite', got '{}'", other),
                })
            }
        };
        let store_path = get("CLONEME_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_store_path(backend.extension()));

        Ok(Self {
            llm: LlmConfig {
                provider,
                model,
                api_key,
                base_url,
                timeout: Duration::from_secs(timeout_secs),
                max_retries,
            },
            generation,
            store: StoreConfig {
                backend,
                path: store_path,
            },
            lexicon_path: get("CLONEME_LEXICON").map(PathBuf::from),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_credential_is_config_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
        assert!(err.to_string().contains("CLONEME_API_KEY"));
    }

    #[test]
    fn test_defaults_with_openai_key() {
        let config = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.llm.provider, Provider::OpenAI);
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.api_key, "sk-test");
        assert!(config.llm.base_url.is_none());
        assert_eq!(config.llm.max_retries, 0);
        assert_eq!(config.store.backend, StoreBackend::Json);
        assert_eq!(config.generation, GenerationSettings::default());
    }

    #[test]
    fn test_groq_key_selects_groq_base_url() {
        let config = Config::from_lookup(lookup(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("CLONEME_MODEL", "openai/gpt-oss-120b"),
        ]))
        .unwrap();
        assert_eq!(config.llm.provider, Provider::OpenAI);
        assert_eq!(config.llm.base_url.as_deref(), Some(GROQ_BASE_URL));
    }

    #[test]
    fn test_gemini_inferred_from_model() {
        let config = Config::from_lookup(lookup(&[
            ("CLONEME_MODEL", "gemini-1.5-flash"),
            ("GOOGLE_API_KEY", "g-test"),
        ]))
        .unwrap();
        assert_eq!(config.llm.provider, Provider::Gemini);

        // An OpenAI key alone does not satisfy a Gemini model.
        let err = Config::from_lookup(lookup(&[
            ("CLONEME_MODEL", "gemini-1.5-flash"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
    }

    #[test]
    fn test_invalid_numeric_value() {
        let err = Config::from_lookup(lookup(&[
            ("CLONEME_API_KEY", "k"),
            ("CLONEME_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        match err {
            ConfigError::Invalid { key, .. } => assert_eq!(key, "CLONEME_TIMEOUT_SECS"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sqlite_store_and_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("CLONEME_API_KEY", "k"),
            ("CLONEME_STORE", "sqlite"),
            ("CLONEME_STORE_PATH", "/tmp/x.db"),
            ("CLONEME_SUMMARY_MAX_TOKENS", "256"),
            ("CLONEME_LEXICON", "lexicon.yaml"),
        ]))
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.generation.summary.max_tokens, Some(256));
        assert_eq!(config.lexicon_path, Some(PathBuf::from("lexicon.yaml")));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("CLONEME_API_KEY", "k"),
            ("CLONEME_PROVIDER", "carrier-pigeon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}

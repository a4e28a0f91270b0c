//! cloneme command-line binary.
//!
//! Scores two identities by letting their persona clones talk, then prints
//! the compatibility report as JSON on stdout.
//!
//! # Environment Variables
//!
//! - `CLONEME_API_KEY` (or `OPENAI_API_KEY` / `GROQ_API_KEY` / `GEMINI_API_KEY`): credential, required
//! - `CLONEME_MODEL`: model id (default: gpt-4o-mini)
//! - `CLONEME_STORE`: "json" (default) or "sqlite"
//! - `RUST_LOG`: tracing filter (default: "info,cloneme=debug")
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin cloneme -- alice bo --turns 6 --history
//! ```

use clap::Parser;

use cloneme::cli::{build_matchmaker, execute, Args};
use cloneme::utilities::config::Config;
use cloneme::utilities::errors::{ConfigError, MatchError};

/// Missing or invalid configuration.
const EXIT_CONFIG: i32 = 2;
/// Intake or dialogue failure.
const EXIT_FAILURE: i32 = 1;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cloneme=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let exit_code = match Config::from_env() {
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Configuration error: {}", e);
            EXIT_CONFIG
        }
        Ok(config) => match run(&config, &args).await {
            Ok(()) => 0,
            Err(e) => {
                tracing::error!("{:#}", e);
                eprintln!("Error: {:#}", e);
                if is_config_error(&e) {
                    EXIT_CONFIG
                } else {
                    EXIT_FAILURE
                }
            }
        },
    };

    std::process::exit(exit_code);
}

async fn run(config: &Config, args: &Args) -> anyhow::Result<()> {
    let matchmaker = build_matchmaker(config, args)?;
    let output = execute(&matchmaker, args).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn is_config_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.downcast_ref::<ConfigError>().is_some()
            || matches!(cause.downcast_ref::<MatchError>(), Some(MatchError::Config(_)))
    })
}

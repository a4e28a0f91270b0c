//! Command-line surface.
//!
//! `cloneme <IDENTITY_A> <IDENTITY_B> [--turns N] [--history] ...` prints the
//! report as pretty JSON on stdout. Everything interactive (intake prompts,
//! `--show-dialogue`) goes to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::{json, Value};

use crate::chat::transcript::Transcript;
use crate::evaluation::lexicon::Lexicon;
use crate::evaluation::report::TRANSCRIPT_KEY;
use crate::llm::create_llm;
use crate::memory::intake::{AnswerFileIntake, IntakeSource, StdinIntake};
use crate::memory::storage::{JsonFilePersistence, MemoryPersistence, SqlitePersistence};
use crate::memory::MemoryBank;
use crate::orchestrator::{Matchmaker, DEFAULT_TURNS};
use crate::utilities::config::{Config, StoreBackend};
use crate::utilities::errors::MatchError;

/// Scoring strategy.
#[derive(Clone, Debug, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    /// Simulated dialogue, features and a JSON summary.
    Report,
    /// One prompt over both fact lists, number only.
    Quick,
}

#[derive(Parser, Debug)]
#[command(name = "cloneme", author, version, about, long_about = None)]
pub struct Args {
    /// First participant (speaks first).
    pub identity_a: String,

    /// Second participant.
    pub identity_b: String,

    /// Dialogue rounds; each round is one turn per persona.
    #[arg(long, short = 't', default_value_t = DEFAULT_TURNS)]
    pub turns: usize,

    /// Include the transcript in the report.
    #[arg(long)]
    pub history: bool,

    #[arg(long, value_enum, default_value = "report")]
    pub strategy: Strategy,

    /// JSON file of intake answers, `{"identity": ["answer", ...]}`,
    /// used instead of prompting on the terminal.
    #[arg(long)]
    pub answers: Option<PathBuf>,

    /// Print the dialogue to stderr.
    #[arg(long)]
    pub show_dialogue: bool,

    /// Re-run intake for both identities before scoring.
    #[arg(long)]
    pub regenerate: bool,
}

/// Assemble the pipeline from configuration and flags.
pub fn build_matchmaker(config: &Config, args: &Args) -> anyhow::Result<Matchmaker> {
    let llm = create_llm(&config.llm).context("creating completion backend")?;

    let persistence: Box<dyn MemoryPersistence> = match config.store.backend {
        StoreBackend::Json => Box::new(JsonFilePersistence::new(&config.store.path)),
        StoreBackend::Sqlite => Box::new(
            SqlitePersistence::new(&config.store.path)
                .with_context(|| format!("opening {}", config.store.path.display()))?,
        ),
    };
    let intake: Box<dyn IntakeSource> = match &args.answers {
        Some(path) => Box::new(AnswerFileIntake::new(path)),
        None => Box::new(StdinIntake::stdio()),
    };
    let memory = Arc::new(MemoryBank::new(persistence, intake));

    let mut matchmaker = Matchmaker::new(llm, memory).with_generation(config.generation.clone());
    if let Some(path) = &config.lexicon_path {
        let lexicon = Lexicon::from_path(path)
            .with_context(|| format!("loading lexicon {}", path.display()))?;
        matchmaker = matchmaker.with_lexicon(lexicon);
    }

    tracing::debug!(
        store = ?config.store.backend,
        path = %config.store.path.display(),
        "pipeline assembled"
    );
    Ok(matchmaker)
}

/// Run the selected strategy and return the JSON to print.
pub async fn execute(matchmaker: &Matchmaker, args: &Args) -> Result<Value, MatchError> {
    if args.regenerate {
        matchmaker.regenerate(&args.identity_a).await?;
        matchmaker.regenerate(&args.identity_b).await?;
    }

    match args.strategy {
        Strategy::Quick => {
            let score = matchmaker
                .quick_score(&args.identity_a, &args.identity_b)
                .await?;
            Ok(json!({ "compatibility_score": score, "strategy": "quick" }))
        }
        Strategy::Report => {
            let mut report = matchmaker
                .score(
                    &args.identity_a,
                    &args.identity_b,
                    args.turns,
                    args.history || args.show_dialogue,
                )
                .await?;

            if args.show_dialogue {
                let transcript = if args.history {
                    report.get(TRANSCRIPT_KEY).cloned()
                } else {
                    report.remove(TRANSCRIPT_KEY)
                };
                if let Some(transcript) = transcript
                    .and_then(|v| serde_json::from_value::<Transcript>(v).ok())
                {
                    eprintln!("{}\n", transcript.render());
                }
            }
            Ok(report.into_value())
        }
    }
}

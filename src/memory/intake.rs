//! Intake: collecting answers and distilling them into approved facts.

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::utilities::errors::StoreError;
use crate::utilities::string_utils::{split_clauses, truncate_chars};

/// Shortest fact kept, in characters.
pub const MIN_FACT_CHARS: usize = 4;
/// Longest fact kept, in characters.
pub const MAX_FACT_CHARS: usize = 140;
/// Maximum facts per memory record.
pub const MAX_FACTS: usize = 12;

/// The fixed elicitation prompts every intake asks.
pub const ELICITATION_PROMPTS: [&str; 5] = [
    "Describe your perfect weekend.",
    "What do you value most in a partner?",
    "What reliably makes you laugh?",
    "What are you into lately (music, books, food, hobbies)?",
    "Any boundaries or dealbreakers your clone should respect?",
];

/// Facts distilled from one intake.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Distillation {
    pub facts: Vec<String>,
    /// No clause survived filtering; the only fact is a truncated raw answer.
    pub used_fallback: bool,
}

/// Distill raw answers into at most [`MAX_FACTS`] short facts.
///
/// Each answer is split into clauses; clauses outside the
/// [`MIN_FACT_CHARS`]..=[`MAX_FACT_CHARS`] window are dropped. If nothing
/// survives, the first non-blank answer, truncated, becomes the only fact.
pub fn distill(answers: &[String]) -> Distillation {
    let facts: Vec<String> = answers
        .iter()
        .flat_map(|answer| split_clauses(answer))
        .filter(|clause| {
            let len = clause.chars().count();
            (MIN_FACT_CHARS..=MAX_FACT_CHARS).contains(&len)
        })
        .take(MAX_FACTS)
        .collect();

    if !facts.is_empty() {
        return Distillation {
            facts,
            used_fallback: false,
        };
    }

    match answers.iter().map(|a| a.trim()).find(|a| !a.is_empty()) {
        Some(first) => Distillation {
            facts: vec![truncate_chars(first, MAX_FACT_CHARS)],
            used_fallback: true,
        },
        None => Distillation::default(),
    }
}

/// Shorthand for `distill(answers).facts`.
pub fn decompose_answers(answers: &[String]) -> Vec<String> {
    distill(answers).facts
}

/// A source of free-text answers to the elicitation prompts.
pub trait IntakeSource: Send + Sync {
    /// Answer `prompts` on behalf of `identity`, one answer per prompt
    /// (blank answers are allowed).
    fn answers(&self, identity: &str, prompts: &[&str]) -> Result<Vec<String>, StoreError>;
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// Asks the prompts interactively, one line per answer.
pub struct ConsoleIntake<R, W> {
    reader: Mutex<R>,
    writer: Mutex<W>,
}

impl<R, W> ConsoleIntake<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        }
    }
}

/// Console intake bound to stdin, prompting on stderr.
pub type StdinIntake = ConsoleIntake<std::io::BufReader<std::io::Stdin>, std::io::Stderr>;

impl StdinIntake {
    pub fn stdio() -> Self {
        ConsoleIntake::new(std::io::BufReader::new(std::io::stdin()), std::io::stderr())
    }
}

impl<R, W> IntakeSource for ConsoleIntake<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn answers(&self, identity: &str, prompts: &[&str]) -> Result<Vec<String>, StoreError> {
        let mut reader = self.reader.lock();
        let mut writer = self.writer.lock();

        writeln!(writer, "No memory found for '{}'. A few quick questions:", identity)?;
        let mut answers = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            write!(writer, "{} ", prompt)?;
            writer.flush()?;
            let mut line = String::new();
            if reader.read_line(&mut line)? == 0 {
                // EOF: remaining prompts are skipped.
                break;
            }
            answers.push(line.trim().to_string());
        }
        Ok(answers)
    }
}

// ---------------------------------------------------------------------------
// Scripted / file-backed
// ---------------------------------------------------------------------------

/// Serves canned answers per identity.
#[derive(Debug, Clone, Default)]
pub struct ScriptedIntake {
    answers: HashMap<String, Vec<String>>,
}

impl ScriptedIntake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answers<I, S>(mut self, identity: impl Into<String>, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.answers
            .insert(identity.into(), answers.into_iter().map(Into::into).collect());
        self
    }
}

impl IntakeSource for ScriptedIntake {
    fn answers(&self, identity: &str, _prompts: &[&str]) -> Result<Vec<String>, StoreError> {
        self.answers
            .get(identity)
            .cloned()
            .ok_or_else(|| StoreError::Intake {
                identity: identity.to_string(),
                message: "no scripted answers for this identity".to_string(),
            })
    }
}

/// Reads answers from a JSON file shaped `{"identity": ["answer", ...]}`.
#[derive(Debug, Clone)]
pub struct AnswerFileIntake {
    pub path: PathBuf,
}

impl AnswerFileIntake {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl IntakeSource for AnswerFileIntake {
    fn answers(&self, identity: &str, prompts: &[&str]) -> Result<Vec<String>, StoreError> {
        let raw = std::fs::read_to_string(&self.path)?;
        let scripted = ScriptedIntake {
            answers: serde_json::from_str(&raw)?,
        };
        scripted.answers(identity, prompts)
    }
}

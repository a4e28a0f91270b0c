//! Dialogue engine: two personas alternating over a fixed number of rounds.
//!
//! ```text
//!   ┌──────────┐  reply   ┌──────────┐
//!   │ A speaks │ ───────▶ │ B speaks │
//!   └──────────┘ ◀─────── └──────────┘
//!         ▲        reply        │
//!         └─ start    (after 2N turns) ─▶ done
//! ```
//!
//! Every turn is one completion with the speaker's system instruction and a
//! user prompt embedding the other party's latest message. Turns are never
//! retried: the first failure aborts the run.

use crate::chat::transcript::{Speaker, Transcript};
use crate::llms::base_llm::{BaseLLM, CompletionParams, LLMMessage};
use crate::utilities::errors::LlmError;

/// Steering for the first round.
pub const ICEBREAKER: &str =
    "Open with a light, specific icebreaker that shows a bit of who you are.";
/// Steering for every later round.
pub const CURIOUS_FOLLOW_UP: &str =
    "Respond to what they said with genuine curiosity, and share something of your own.";

/// Runs dialogues against one completion backend.
pub struct DialogueEngine<'a> {
    llm: &'a dyn BaseLLM,
    params: CompletionParams,
}

impl<'a> DialogueEngine<'a> {
    pub fn new(llm: &'a dyn BaseLLM, params: CompletionParams) -> Self {
        Self { llm, params }
    }

    /// Produce exactly `2 * rounds` turns, starting with A.
    ///
    /// `rounds == 0` yields an empty transcript without calling the backend.
    pub async fn run(
        &self,
        system_a: &str,
        system_b: &str,
        rounds: usize,
    ) -> Result<Transcript, LlmError> {
        let mut transcript = Transcript::with_capacity(rounds * 2);

        for round in 0..rounds {
            for speaker in [Speaker::A, Speaker::B] {
                let system = match speaker {
                    Speaker::A => system_a,
                    Speaker::B => system_b,
                };
                let heard = transcript.last_from(speaker.other()).unwrap_or("");
                let messages = [
                    LLMMessage::system(system),
                    LLMMessage::user(turn_prompt(heard, round)),
                ];

                let reply = self.llm.complete(&messages, &self.params).await.map_err(|e| {
                    tracing::warn!(round, speaker = %speaker, error = %e, "dialogue turn failed");
                    e
                })?;
                let reply = reply.trim().to_string();
                tracing::debug!(round, speaker = %speaker, chars = reply.len(), "turn generated");
                transcript.push(reply);
            }
        }

        Ok(transcript)
    }
}

/// User prompt for one turn.
pub fn turn_prompt(heard: &str, round: usize) -> String {
    let steer = if round == 0 {
        ICEBREAKER
    } else {
        CURIOUS_FOLLOW_UP
    };
    format!("They said: \"{}\"\n\n{}", heard, steer)
}

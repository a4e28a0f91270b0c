//! Summarization: one completion turned into a report that always exists.
//!
//! Unlike dialogue generation this step fails soft. A completion error or
//! unparseable output yields [`Report::fallback`] with a red flag naming
//! what went wrong; [`Summarizer::summarize`] has no error path.

use crate::chat::transcript::Transcript;
use crate::evaluation::features::FeatureVector;
use crate::evaluation::json_recovery::recover_object;
use crate::evaluation::report::Report;
use crate::llms::base_llm::{BaseLLM, CompletionParams, LLMMessage};

/// Red flag recorded when no JSON object could be recovered.
pub const PARSE_FAILURE_FLAG: &str = "summary could not be parsed; default report used";
/// Red flag recorded when the summary completion itself failed.
pub const COMPLETION_FAILURE_FLAG: &str = "summary unavailable: model call failed";

const SYSTEM_PROMPT: &str = "You are a careful compatibility analyst. \
You read a short conversation between two dating clones and judge how well the two people would get along.";

const SCHEMA: &str = r#"{
  "compatibility_score": <integer 0-100>,
  "highlights": [<short strings>],
  "evidence_tags": [<short topic tags>],
  "red_flags": [<short strings>],
  "next_step": "<one sentence>"
}"#;

pub struct Summarizer<'a> {
    llm: &'a dyn BaseLLM,
    params: CompletionParams,
}

impl<'a> Summarizer<'a> {
    pub fn new(llm: &'a dyn BaseLLM, params: CompletionParams) -> Self {
        Self { llm, params }
    }

    pub async fn summarize(&self, transcript: &Transcript, features: &FeatureVector) -> Report {
        let messages = [
            LLMMessage::system(SYSTEM_PROMPT),
            LLMMessage::user(summary_prompt(transcript, features)),
        ];

        let raw = match self.llm.complete(&messages, &self.params).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "summary completion failed, using default report");
                return Report::fallback(COMPLETION_FAILURE_FLAG);
            }
        };

        match recover_object(&raw) {
            Some(object) => Report::from_map(object),
            None => {
                tracing::warn!(chars = raw.len(), "no JSON object in summary, using default report");
                Report::fallback(PARSE_FAILURE_FLAG)
            }
        }
    }
}

/// User prompt for the summary request.
pub fn summary_prompt(transcript: &Transcript, features: &FeatureVector) -> String {
    let features_json = serde_json::to_string(features).unwrap_or_default();
    format!(
        "Return ONLY a single JSON object with exactly this shape:\n{schema}\n\n\
         Rules:\n\
         - No narration before or after the object.\n\
         - No Markdown code fences.\n\
         - Exactly one object, never several.\n\
         - Do not plan real-world logistics: no dates, times, venues or contact details.\n\n\
         Computed conversation features (0-1): {features}\n\n\
         Conversation:\n{dialogue}",
        schema = SCHEMA,
        features = features_json,
        dialogue = transcript.render(),
    )
}

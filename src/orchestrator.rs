//! The matchmaking pipeline.
//!
//! ```text
//! ensure memories (A, B)
//!   → build system prompts
//!   → dialogue (2 × turns completions, fail hard)
//!   → features
//!   → summary (fail soft) → normalize
//!   → attach features [+ transcript]
//! ```

use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::chat::dialogue::DialogueEngine;
use crate::chat::transcript::Transcript;
use crate::evaluation::features::FeatureExtractor;
use crate::evaluation::lexicon::Lexicon;
use crate::evaluation::quick_score::quick_score;
use crate::evaluation::report::Report;
use crate::evaluation::summarizer::Summarizer;
use crate::llms::base_llm::BaseLLM;
use crate::memory::{MemoryBank, MemoryRecord};
use crate::persona::prompt::{build_system_prompt, DEFAULT_GOAL};
use crate::utilities::config::GenerationSettings;
use crate::utilities::errors::MatchError;

/// Default number of dialogue rounds per `score` call.
pub const DEFAULT_TURNS: usize = 10;

/// Entry point of the pipeline.
///
/// Cheap to share: independent `score` calls for different pairs may run
/// concurrently against one `Matchmaker`.
pub struct Matchmaker {
    llm: Arc<dyn BaseLLM>,
    memory: Arc<MemoryBank>,
    extractor: FeatureExtractor,
    generation: GenerationSettings,
    goal: String,
}

impl Matchmaker {
    pub fn new(llm: Arc<dyn BaseLLM>, memory: Arc<MemoryBank>) -> Self {
        Self {
            llm,
            memory,
            extractor: FeatureExtractor::default(),
            generation: GenerationSettings::default(),
            goal: DEFAULT_GOAL.to_string(),
        }
    }

    pub fn with_lexicon(mut self, lexicon: Lexicon) -> Self {
        self.extractor = FeatureExtractor::new(lexicon);
        self
    }

    pub fn with_generation(mut self, generation: GenerationSettings) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn memory(&self) -> &Arc<MemoryBank> {
        &self.memory
    }

    /// Run the full pipeline for one pair.
    ///
    /// Returns a fully populated report, or an error if memory intake or any
    /// dialogue turn failed. Summarization problems never surface here.
    #[instrument(skip(self), fields(run_id = %Uuid::new_v4()))]
    pub async fn score(
        &self,
        identity_a: &str,
        identity_b: &str,
        turns: usize,
        include_history: bool,
    ) -> Result<Report, MatchError> {
        info!("scoring started");
        let record_a = self.ensure(identity_a).await?;
        let record_b = self.ensure(identity_b).await?;
        let system_a = build_system_prompt(identity_a, &record_a, &self.goal);
        let system_b = build_system_prompt(identity_b, &record_b, &self.goal);

        let transcript = self.dialogue(&system_a, &system_b, turns).await?;
        let report = self.evaluate(&transcript, include_history).await;
        info!(score = ?report.score(), "scoring finished");
        Ok(report)
    }

    /// Generate the dialogue alone.
    pub async fn dialogue(
        &self,
        system_a: &str,
        system_b: &str,
        turns: usize,
    ) -> Result<Transcript, MatchError> {
        let engine = DialogueEngine::new(self.llm.as_ref(), self.generation.dialogue.clone());
        Ok(engine.run(system_a, system_b, turns).await?)
    }

    /// Features, summary and normalization for an existing transcript.
    pub async fn evaluate(&self, transcript: &Transcript, include_history: bool) -> Report {
        let features = self.extractor.extract(transcript);
        debug!(?features, "features extracted");

        let summarizer = Summarizer::new(self.llm.as_ref(), self.generation.summary.clone());
        let mut report = summarizer.summarize(transcript, &features).await.normalize();
        report.attach_features(&features);
        if include_history {
            report.attach_transcript(transcript);
        }
        report
    }

    /// The single-prompt strategy: score two fact lists directly.
    pub async fn quick_score(&self, identity_a: &str, identity_b: &str) -> Result<u8, MatchError> {
        let record_a = self.ensure(identity_a).await?;
        let record_b = self.ensure(identity_b).await?;
        let score = quick_score(
            self.llm.as_ref(),
            record_a.facts(),
            record_b.facts(),
            &self.generation.summary,
        )
        .await?;
        info!(identity_a, identity_b, score, "quick score");
        Ok(score)
    }

    /// Re-run intake for `identity`, replacing its record.
    pub async fn regenerate(&self, identity: &str) -> Result<MemoryRecord, MatchError> {
        let memory = self.memory.clone();
        let identity = identity.to_string();
        Ok(tokio::task::spawn_blocking(move || memory.regenerate(&identity)).await??)
    }

    // Intake may block on a terminal, so it runs off the async workers.
    async fn ensure(&self, identity: &str) -> Result<MemoryRecord, MatchError> {
        let memory = self.memory.clone();
        let identity = identity.to_string();
        Ok(tokio::task::spawn_blocking(move || memory.ensure(&identity)).await??)
    }
}

impl std::fmt::Debug for Matchmaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matchmaker")
            .field("llm", &self.llm)
            .field("memory", &self.memory)
            .field("goal", &self.goal)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::transcript::Speaker;
    use crate::evaluation::report::{FEATURES_KEY, TRANSCRIPT_KEY};
    use crate::evaluation::summarizer::PARSE_FAILURE_FLAG;
    use crate::llms::base_llm::ScriptedLLM;
    use crate::memory::{InMemoryPersistence, MemoryDocument, ScriptedIntake};
    use crate::utilities::errors::{LlmError, StoreError};

    fn bank() -> Arc<MemoryBank> {
        let intake = ScriptedIntake::new()
            .with_answers("alice", ["Hiking and camping. Dry humor"])
            .with_answers("bo", ["Coding all night. Software meetups"]);
        Arc::new(MemoryBank::new(
            Box::new(InMemoryPersistence::new()),
            Box::new(intake),
        ))
    }

    fn matchmaker(llm: Arc<ScriptedLLM>) -> Matchmaker {
        Matchmaker::new(llm, bank())
    }

    const SUMMARY: &str = "```json\n{\"compatibility_score\": 73, \"highlights\": [\"shared humor\"], \"evidence_tags\": [\"music\"], \"red_flags\": [], \"next_step\": \"ask about favorite album\"}\n```";

    #[tokio::test]
    async fn test_score_end_to_end() {
        let llm = Arc::new(ScriptedLLM::new([
            "Hiking trails every weekend.",
            "Coding side projects all night.",
            "Camping by the beach.",
            "Software and gadgets, mostly.",
            SUMMARY,
        ]));
        let report = matchmaker(llm.clone())
            .score("alice", "bo", 2, true)
            .await
            .unwrap();

        assert_eq!(report.score(), Some(73.0));
        let features = report.get(FEATURES_KEY).unwrap();
        assert_eq!(features["topic_overlap"], 0.0);
        assert_eq!(features["reciprocity"], 1.0);

        let transcript: Transcript =
            serde_json::from_value(report.get(TRANSCRIPT_KEY).unwrap().clone()).unwrap();
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript.turns()[0].speaker, Speaker::A);

        // Personas were grounded in their own facts.
        let requests = llm.requests();
        assert!(requests[0].0[0].content.contains("- Hiking and camping"));
        assert!(requests[1].0[0].content.contains("- Software meetups"));
        assert_eq!(requests.len(), 5);
    }

    #[tokio::test]
    async fn test_history_is_optional() {
        let llm = Arc::new(ScriptedLLM::new(["hi", "hey", "not json at all"]));
        let report = matchmaker(llm).score("alice", "bo", 1, false).await.unwrap();

        assert!(report.get(TRANSCRIPT_KEY).is_none());
        assert!(report.get(FEATURES_KEY).is_some());
        assert_eq!(report.score(), Some(50.0));
        assert_eq!(report.red_flags(), vec![PARSE_FAILURE_FLAG]);
    }

    #[tokio::test]
    async fn test_dialogue_failure_aborts_score() {
        let llm = Arc::new(ScriptedLLM::new(["only one turn"]));
        let err = matchmaker(llm.clone())
            .score("alice", "bo", 3, false)
            .await
            .unwrap_err();

        assert!(matches!(err, MatchError::Completion(LlmError::Transport { .. })));
        // Two dialogue attempts, no summary request.
        assert_eq!(llm.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_intake_failure_aborts_before_dialogue() {
        let llm = Arc::new(ScriptedLLM::new(["unused"]));
        let err = matchmaker(llm.clone())
            .score("alice", "stranger", 1, false)
            .await
            .unwrap_err();

        assert!(matches!(err, MatchError::Store(StoreError::Intake { .. })));
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_zero_turns_still_reports() {
        let llm = Arc::new(ScriptedLLM::new([SUMMARY]));
        let report = matchmaker(llm).score("alice", "bo", 0, true).await.unwrap();
        assert_eq!(report.score(), Some(73.0));
        assert_eq!(report.get(TRANSCRIPT_KEY), Some(&serde_json::json!([])));
    }

    #[tokio::test]
    async fn test_quick_score_strategy() {
        let llm = Arc::new(ScriptedLLM::new(["64"]));
        let mm = matchmaker(llm.clone());
        assert_eq!(mm.quick_score("alice", "bo").await.unwrap(), 64);

        let prompt = &llm.requests()[0].0[0].content;
        assert!(prompt.contains("Hiking and camping"));
        assert!(prompt.contains("Coding all night"));
    }

    #[tokio::test]
    async fn test_regenerate_replaces_record() {
        let mut doc = MemoryDocument::new();
        doc.insert("alice".into(), vec!["Collects stamps".into()]);
        let memory = Arc::new(MemoryBank::new(
            Box::new(InMemoryPersistence::with_document(doc)),
            Box::new(ScriptedIntake::new().with_answers("alice", ["Surfs at sunrise"])),
        ));
        let mm = Matchmaker::new(Arc::new(ScriptedLLM::default()), memory);

        let before = mm.memory().ensure("alice").unwrap();
        assert_eq!(before.facts(), ["Collects stamps"]);

        let after = mm.regenerate("alice").await.unwrap();
        assert_eq!(after.facts(), ["Surfs at sunrise"]);
        assert_eq!(mm.memory().lookup("alice").unwrap(), Some(after));
    }
}

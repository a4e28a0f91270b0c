//! Single-prompt scoring from two fact lists.
//!
//! An alternative to the dialogue-based report; neither feeds the other.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::evaluation::report::DEFAULT_SCORE;
use crate::llms::base_llm::{BaseLLM, CompletionParams, LLMMessage};
use crate::utilities::errors::LlmError;

static FIRST_INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Ask for a 0-100 number. Completion failures propagate; a reply with no
/// number scores [`DEFAULT_SCORE`].
pub async fn quick_score(
    llm: &dyn BaseLLM,
    facts_a: &[String],
    facts_b: &[String],
    params: &CompletionParams,
) -> Result<u8, LlmError> {
    let prompt = format!(
        "Calculate a compatibility score (0-100) between these two people.\n\
         Person A: {}\nPerson B: {}\nRespond with just the number.",
        serde_json::to_string(facts_a).unwrap_or_default(),
        serde_json::to_string(facts_b).unwrap_or_default(),
    );

    let reply = llm.complete(&[LLMMessage::user(prompt)], params).await?;
    let score = extract_score(&reply).unwrap_or_else(|| {
        tracing::warn!(reply = %reply, "no number in quick score reply");
        DEFAULT_SCORE
    });
    Ok(score)
}

/// First integer in `text`, clamped to 100.
pub fn extract_score(text: &str) -> Option<u8> {
    let digits = FIRST_INTEGER.find(text)?.as_str();
    // Too many digits to parse is still "more than 100".
    let value = digits.parse::<u64>().map_or(100, |n| n.min(100));
    Some(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llms::base_llm::ScriptedLLM;

    #[test]
    fn test_extract_score() {
        assert_eq!(extract_score("82"), Some(82));
        assert_eq!(extract_score("Score: 67/100"), Some(67));
        assert_eq!(extract_score("about 250"), Some(100));
        assert_eq!(extract_score("99999999999999999999999"), Some(100));
        assert_eq!(extract_score("no idea"), None);
    }

    #[tokio::test]
    async fn test_quick_score_defaults_without_number() {
        let llm = ScriptedLLM::new(["quite compatible!"]);
        let facts = vec!["likes tea".to_string()];
        let score = quick_score(&llm, &facts, &facts, &CompletionParams::default())
            .await
            .unwrap();
        assert_eq!(score, DEFAULT_SCORE);
    }

    #[tokio::test]
    async fn test_quick_score_prompt_and_errors() {
        let llm = ScriptedLLM::new(["71"]);
        let a = vec!["hikes".to_string()];
        let b = vec!["reads".to_string()];
        let params = CompletionParams::default();
        assert_eq!(quick_score(&llm, &a, &b, &params).await.unwrap(), 71);

        let prompt = &llm.requests()[0].0[0].content;
        assert!(prompt.contains(r#"["hikes"]"#));
        assert!(prompt.contains(r#"["reads"]"#));

        // Queue is now empty: the failure propagates.
        assert!(quick_score(&llm, &a, &b, &params).await.is_err());
    }
}

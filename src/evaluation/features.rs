//! Deterministic conversational features over a transcript.
//!
//! All four signals lie in `[0, 1]` and are rounded to three decimals, so an
//! identical transcript always yields a bit-identical vector.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chat::transcript::{Speaker, Transcript};
use crate::evaluation::lexicon::Lexicon;
use crate::utilities::string_utils::word_count;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Smaller over larger of the two speakers' word totals (each +1).
    pub engagement: f64,
    /// 1 minus the gap between the speakers' question-asking rates.
    pub reciprocity: f64,
    /// Shared mass of the two speakers' topic distributions.
    pub topic_overlap: f64,
    /// Fraction of all turns containing a first-person pronoun.
    pub self_disclosure: f64,
}

/// Computes [`FeatureVector`]s using a configured [`Lexicon`].
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    lexicon: Lexicon,
}

impl FeatureExtractor {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn extract(&self, transcript: &Transcript) -> FeatureVector {
        let a = SpeakerStats::collect(transcript, Speaker::A, &self.lexicon);
        let b = SpeakerStats::collect(transcript, Speaker::B, &self.lexicon);

        let (wa, wb) = ((a.words + 1) as f64, (b.words + 1) as f64);
        let engagement = wa.min(wb) / wa.max(wb);

        let reciprocity = 1.0 - (a.question_rate() - b.question_rate()).abs();

        let topic_overlap = distribution_overlap(&a.topic_distribution(), &b.topic_distribution());

        let disclosing = transcript
            .turns()
            .iter()
            .filter(|t| self.lexicon.has_first_person(&t.text))
            .count();
        let self_disclosure = if transcript.is_empty() {
            0.0
        } else {
            disclosing as f64 / transcript.len() as f64
        };

        FeatureVector {
            engagement: round3(engagement),
            reciprocity: round3(reciprocity),
            topic_overlap: round3(topic_overlap),
            self_disclosure: round3(self_disclosure),
        }
    }
}

#[derive(Debug, Default)]
struct SpeakerStats {
    turns: usize,
    words: usize,
    questions: usize,
    topic_turns: BTreeMap<String, usize>,
}

impl SpeakerStats {
    fn collect(transcript: &Transcript, speaker: Speaker, lexicon: &Lexicon) -> Self {
        let mut stats = Self::default();
        for turn in transcript.by(speaker) {
            stats.turns += 1;
            stats.words += word_count(&turn.text);
            if turn.text.trim_end().ends_with('?') {
                stats.questions += 1;
            }
            for label in lexicon.topics_in(&turn.text) {
                *stats.topic_turns.entry(label.to_string()).or_insert(0) += 1;
            }
        }
        stats
    }

    fn question_rate(&self) -> f64 {
        if self.turns == 0 {
            0.0
        } else {
            self.questions as f64 / self.turns as f64
        }
    }

    /// Empty when no turn matched any topic.
    fn topic_distribution(&self) -> BTreeMap<&str, f64> {
        let total: usize = self.topic_turns.values().sum();
        if total == 0 {
            return BTreeMap::new();
        }
        self.topic_turns
            .iter()
            .map(|(label, count)| (label.as_str(), *count as f64 / total as f64))
            .collect()
    }
}

/// Sum of per-topic minima over the union of topics.
fn distribution_overlap(a: &BTreeMap<&str, f64>, b: &BTreeMap<&str, f64>) -> f64 {
    let mut labels: Vec<&str> = a.keys().chain(b.keys()).copied().collect();
    labels.sort_unstable();
    labels.dedup();
    labels
        .into_iter()
        .map(|label| {
            let pa = a.get(label).copied().unwrap_or(0.0);
            let pb = b.get(label).copied().unwrap_or(0.0);
            pa.min(pb)
        })
        .sum::<f64>()
        .min(1.0)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::transcript::Turn;

    fn transcript(lines: &[&str]) -> Transcript {
        let mut t = Transcript::new();
        for line in lines {
            t.push(*line);
        }
        t
    }

    fn in_unit_range(f: &FeatureVector) -> bool {
        [f.engagement, f.reciprocity, f.topic_overlap, f.self_disclosure]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }

    #[test]
    fn test_extract_is_deterministic() {
        let t = transcript(&[
            "I love strong coffee in the morning. You?",
            "Tea person, but my band runs on espresso!",
            "What kind of music?",
            "Mostly jazz, some vinyl hunting.",
        ]);
        let extractor = FeatureExtractor::default();
        assert_eq!(extractor.extract(&t), extractor.extract(&t));
    }

    #[test]
    fn test_known_values() {
        let t = transcript(&[
            "I love coffee?",       // A: 3 words, a question, coffee, "I"
            "coffee and music too", // B: 4 words, coffee and music
        ]);
        let f = FeatureExtractor::default().extract(&t);

        // (3 + 1) / (4 + 1)
        assert_eq!(f.engagement, 0.8);
        // rates 1.0 vs 0.0
        assert_eq!(f.reciprocity, 0.0);
        // A {coffee: 1.0}, B {coffee: 0.5, music: 0.5}
        assert_eq!(f.topic_overlap, 0.5);
        assert_eq!(f.self_disclosure, 0.5);
    }

    #[test]
    fn test_question_mark_allows_trailing_whitespace() {
        let t = transcript(&["really?  \n", "yes?"]);
        let f = FeatureExtractor::default().extract(&t);
        assert_eq!(f.reciprocity, 1.0);
    }

    #[test]
    fn test_degenerate_inputs_stay_in_range() {
        let extractor = FeatureExtractor::default();

        let empty = extractor.extract(&Transcript::new());
        assert!(in_unit_range(&empty));
        assert_eq!(empty.engagement, 1.0);
        assert_eq!(empty.reciprocity, 1.0);
        assert_eq!(empty.topic_overlap, 0.0);
        assert_eq!(empty.self_disclosure, 0.0);

        let single = extractor.extract(&transcript(&["Do you like hiking?"]));
        assert!(in_unit_range(&single));
        // B has no turns and therefore a question rate of zero.
        assert_eq!(single.reciprocity, 0.0);
        assert_eq!(single.topic_overlap, 0.0);

        let no_matches = extractor.extract(&transcript(&["zzz qqq", "xxx yyy"]));
        assert!(in_unit_range(&no_matches));
        assert_eq!(no_matches.topic_overlap, 0.0);
    }

    #[test]
    fn test_overlap_tops_out_at_one() {
        let t = transcript(&["coffee", "espresso", "music", "band"]);
        let f = FeatureExtractor::default().extract(&t);
        assert_eq!(f.topic_overlap, 1.0);
        assert!(in_unit_range(&f));
    }

    #[test]
    fn test_disjoint_topics_without_questions() {
        let t = Transcript::from_turns(vec![
            Turn::new(Speaker::A, "Hiking trails every weekend."),
            Turn::new(Speaker::B, "Coding side projects all night."),
            Turn::new(Speaker::A, "Camping by the beach."),
            Turn::new(Speaker::B, "Software and gadgets, mostly."),
        ]);
        let f = FeatureExtractor::default().extract(&t);
        assert_eq!(f.topic_overlap, 0.0);
        assert_eq!(f.reciprocity, 1.0);
    }

    #[test]
    fn test_rounds_to_three_decimals() {
        // (1 + 1) / (2 + 1) = 0.666...
        let t = transcript(&["one", "two words"]);
        let f = FeatureExtractor::default().extract(&t);
        assert_eq!(f.engagement, 0.667);
    }
}

//! Keyword tables behind topic and pronoun detection.
//!
//! A [`LexiconTable`] is the plain, serializable form (loadable from YAML);
//! a [`Lexicon`] is the compiled form the feature extractor matches with.
//!
//! ```yaml
//! topics:
//!   coffee: [coffee, espresso, latte]
//!   music: [music, band, vinyl]
//! first_person: [i, my, me, mine]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::utilities::errors::StoreError;

/// Serializable topic → keyword table plus the first-person pronoun list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconTable {
    pub topics: BTreeMap<String, Vec<String>>,
    #[serde(default = "default_first_person")]
    pub first_person: Vec<String>,
}

fn default_first_person() -> Vec<String> {
    ["i", "my", "me", "mine"].iter().map(|s| s.to_string()).collect()
}

impl Default for LexiconTable {
    fn default() -> Self {
        let topics: &[(&str, &[&str])] = &[
            (
                "outdoors",
                &["hike", "hiking", "trail", "trails", "camping", "outdoors", "beach", "mountain", "mountains", "surf", "surfing", "climbing", "park"],
            ),
            ("coffee", &["coffee", "espresso", "latte", "cafe", "brew", "cappuccino"]),
            (
                "music",
                &["music", "song", "songs", "band", "bands", "concert", "album", "guitar", "jazz", "playlist", "vinyl", "sing"],
            ),
            (
                "books",
                &["book", "books", "novel", "novels", "reading", "read", "author", "poetry", "library"],
            ),
            (
                "food",
                &["food", "cook", "cooking", "recipe", "restaurant", "dinner", "brunch", "pizza", "sushi", "tacos", "baking"],
            ),
            (
                "tech",
                &["tech", "code", "coding", "software", "startup", "gadget", "gadgets", "programming", "computer", "ai"],
            ),
            (
                "vibes",
                &["vibe", "vibes", "chill", "cozy", "energy", "mood", "laugh", "funny"],
            ),
        ];

        Self {
            topics: topics
                .iter()
                .map(|(label, words)| {
                    (label.to_string(), words.iter().map(|w| w.to_string()).collect())
                })
                .collect(),
            first_person: default_first_person(),
        }
    }
}

/// One topic label with its compiled keyword matcher.
#[derive(Debug, Clone)]
pub struct TopicMatcher {
    pub label: String,
    pattern: Regex,
}

impl TopicMatcher {
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Compiled lexicon. Matching is case-insensitive and whole-word.
#[derive(Debug, Clone)]
pub struct Lexicon {
    topics: Vec<TopicMatcher>,
    first_person: Option<Regex>,
}

impl Lexicon {
    /// Compile a table. Topics with no keywords never match anything and are
    /// dropped.
    pub fn compile(table: &LexiconTable) -> Result<Self, StoreError> {
        let mut topics = Vec::with_capacity(table.topics.len());
        for (label, words) in &table.topics {
            if let Some(pattern) = word_alternation(words)? {
                topics.push(TopicMatcher {
                    label: label.clone(),
                    pattern,
                });
            }
        }

        Ok(Self {
            topics,
            first_person: word_alternation(&table.first_person)?,
        })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, StoreError> {
        let table: LexiconTable = serde_yaml::from_str(yaml)?;
        Self::compile(&table)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let lexicon = Self::from_yaml_str(&raw)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            topics = lexicon.topics.len(),
            "lexicon loaded"
        );
        Ok(lexicon)
    }

    pub fn topics(&self) -> &[TopicMatcher] {
        &self.topics
    }

    /// Labels of every topic whose keywords appear in `text`.
    pub fn topics_in<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.topics
            .iter()
            .filter(move |t| t.matches(text))
            .map(|t| t.label.as_str())
    }

    pub fn has_first_person(&self, text: &str) -> bool {
        self.first_person
            .as_ref()
            .is_some_and(|re| re.is_match(text))
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        // The built-in table is escaped literals only.
        Self::compile(&LexiconTable::default()).unwrap_or_else(|e| {
            tracing::error!(error = %e, "built-in lexicon failed to compile");
            Self {
                topics: Vec::new(),
                first_person: None,
            }
        })
    }
}

fn pattern_for(words: &[String]) -> Option<String> {
    let alternatives: Vec<String> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        None
    } else {
        Some(format!(r"\b(?:{})\b", alternatives.join("|")))
    }
}

fn word_alternation(words: &[String]) -> Result<Option<Regex>, StoreError> {
    pattern_for(words)
        .map(|pattern| {
            RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| StoreError::Lexicon(e.to_string()))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_all_builtin_topics() {
        let lexicon = Lexicon::default();
        let labels: Vec<&str> = lexicon.topics().iter().map(|t| t.label.as_str()).collect();
        for expected in ["books", "coffee", "food", "music", "outdoors", "tech", "vibes"] {
            assert!(labels.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_default_matches_compiled_builtin_table() {
        let table = LexiconTable::default();
        let compiled = Lexicon::compile(&table).unwrap();
        let default = Lexicon::default();

        let labels = |l: &Lexicon| l.topics().iter().map(|t| t.label.clone()).collect::<Vec<_>>();
        assert_eq!(labels(&default), labels(&compiled));
        assert_eq!(labels(&default).len(), table.topics.len());
        assert!(default.has_first_person("honestly I would"));
        assert!(!default.has_first_person("they would"));
    }

    #[test]
    fn test_matching_is_whole_word_and_case_insensitive() {
        let lexicon = Lexicon::default();
        let found: Vec<&str> = lexicon.topics_in("COFFEE then a Hike").collect();
        assert_eq!(found, vec!["coffee", "outdoors"]);

        // "jazzercise" must not count as jazz, "said" must not count as ai.
        assert_eq!(lexicon.topics_in("jazzercise, she said").count(), 0);
    }

    #[test]
    fn test_first_person() {
        let lexicon = Lexicon::default();
        assert!(lexicon.has_first_person("Honestly I love it"));
        assert!(lexicon.has_first_person("that one is MINE"));
        assert!(!lexicon.has_first_person("imagine menus"));
    }

    #[test]
    fn test_from_yaml() {
        let yaml = "topics:\n  pets: [dog, cat]\n  empty: []\nfirst_person: [yo]\n";
        let lexicon = Lexicon::from_yaml_str(yaml).unwrap();
        assert_eq!(lexicon.topics().len(), 1);
        assert_eq!(lexicon.topics_in("my dog").collect::<Vec<_>>(), vec!["pets"]);
        assert!(lexicon.has_first_person("yo tengo"));
        assert!(!lexicon.has_first_person("I do"));
    }

    #[test]
    fn test_yaml_without_pronouns_uses_default_list() {
        let lexicon = Lexicon::from_yaml_str("topics:\n  pets: [dog]\n").unwrap();
        assert!(lexicon.has_first_person("me too"));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.yaml");
        std::fs::write(&path, "topics:\n  games: [chess]\n").unwrap();
        let lexicon = Lexicon::from_path(&path).unwrap();
        assert_eq!(lexicon.topics_in("chess club").count(), 1);

        assert!(matches!(
            Lexicon::from_yaml_str("topics: [not, a, map]"),
            Err(StoreError::Yaml(_))
        ));
    }
}

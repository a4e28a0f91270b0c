//! Transcript types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two fixed dialogue roles. `A` always speaks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    A,
    B,
}

impl Speaker {
    pub fn other(self) -> Self {
        match self {
            Speaker::A => Speaker::B,
            Speaker::B => Speaker::A,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Speaker::A => "A",
            Speaker::B => "B",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

/// Ordered, strictly alternating turns starting with [`Speaker::A`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            turns: Vec::with_capacity(capacity),
        }
    }

    /// Build from already-ordered turns. Alternation is not checked; this is
    /// for fixtures and replaying stored dialogue.
    pub fn from_turns(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    /// Append a turn for whoever speaks next.
    pub fn push(&mut self, text: impl Into<String>) -> &Turn {
        let speaker = self.next_speaker();
        self.turns.push(Turn::new(speaker, text));
        &self.turns[self.turns.len() - 1]
    }

    pub fn next_speaker(&self) -> Speaker {
        self.turns
            .last()
            .map(|t| t.speaker.other())
            .unwrap_or(Speaker::A)
    }

    /// Most recent message by `speaker`, if any.
    pub fn last_from(&self, speaker: Speaker) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.speaker == speaker)
            .map(|t| t.text.as_str())
    }

    /// Turns spoken by `speaker`, in order.
    pub fn by(&self, speaker: Speaker) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(move |t| t.speaker == speaker)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// `A: text` / `B: text` lines.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.speaker, t.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_alternates_from_a() {
        let mut t = Transcript::new();
        assert_eq!(t.next_speaker(), Speaker::A);
        assert_eq!(t.push("hi").speaker, Speaker::A);
        assert_eq!(t.push("hey").speaker, Speaker::B);
        assert_eq!(t.push("so").speaker, Speaker::A);
        assert_eq!(t.last_from(Speaker::B), Some("hey"));
        assert_eq!(t.by(Speaker::A).count(), 2);
    }

    #[test]
    fn test_render() {
        let mut t = Transcript::new();
        t.push("Coffee person?");
        t.push("Tea, sorry.");
        assert_eq!(t.render(), "A: Coffee person?\nB: Tea, sorry.");
        assert_eq!(Transcript::new().render(), "");
    }

    #[test]
    fn test_serializes_as_turn_list() {
        let mut t = Transcript::new();
        t.push("hello");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json, serde_json::json!([{"speaker": "A", "text": "hello"}]));
    }
}

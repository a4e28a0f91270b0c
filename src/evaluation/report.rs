//! The compatibility report and its normalizer.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::chat::transcript::Transcript;
use crate::evaluation::features::FeatureVector;

pub const SCORE_KEY: &str = "compatibility_score";
pub const HIGHLIGHTS_KEY: &str = "highlights";
pub const EVIDENCE_TAGS_KEY: &str = "evidence_tags";
pub const RED_FLAGS_KEY: &str = "red_flags";
pub const NEXT_STEP_KEY: &str = "next_step";
pub const FEATURES_KEY: &str = "features";
pub const TRANSCRIPT_KEY: &str = "transcript";

/// Midpoint score used whenever the model's judgment is unavailable.
pub const DEFAULT_SCORE: u8 = 50;
pub const DEFAULT_NEXT_STEP: &str =
    "Keep the conversation going to learn more about each other's values.";

/// A report mapping. Field contents come from the model and are not
/// validated; [`Report::normalize`] only guarantees the fixed keys exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report(Map<String, Value>);

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// The safe default, with one red flag explaining the degradation.
    pub fn fallback(reason: &str) -> Self {
        let mut report = Self::new();
        report.insert(SCORE_KEY, json!(DEFAULT_SCORE));
        report.insert(HIGHLIGHTS_KEY, json!([]));
        report.insert(EVIDENCE_TAGS_KEY, json!([]));
        report.insert(RED_FLAGS_KEY, json!([reason]));
        report.insert(NEXT_STEP_KEY, json!(DEFAULT_NEXT_STEP));
        report
    }

    /// Insert defaults for any missing fixed field. Present fields are kept
    /// as-is whatever their shape, so this is idempotent.
    pub fn normalize(mut self) -> Self {
        for (key, default) in fixed_defaults() {
            self.0.entry(key.to_string()).or_insert(default);
        }
        self
    }

    pub fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        self.0.insert(key.to_string(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn score(&self) -> Option<f64> {
        self.0.get(SCORE_KEY).and_then(Value::as_f64)
    }

    pub fn red_flags(&self) -> Vec<&str> {
        self.0
            .get(RED_FLAGS_KEY)
            .and_then(Value::as_array)
            .map(|flags| flags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn attach_features(&mut self, features: &FeatureVector) {
        self.insert(FEATURES_KEY, json!(features));
    }

    pub fn attach_transcript(&mut self, transcript: &Transcript) {
        self.insert(TRANSCRIPT_KEY, json!(transcript));
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn fixed_defaults() -> [(&'static str, Value); 5] {
    [
        (SCORE_KEY, json!(DEFAULT_SCORE)),
        (HIGHLIGHTS_KEY, json!([])),
        (EVIDENCE_TAGS_KEY, json!([])),
        (RED_FLAGS_KEY, json!([])),
        (NEXT_STEP_KEY, json!(DEFAULT_NEXT_STEP)),
    ]
}

/// Free-function form of [`Report::normalize`].
pub fn normalize(report: Report) -> Report {
    report.normalize()
}

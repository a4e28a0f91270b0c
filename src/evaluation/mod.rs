//! Evaluation: turning a transcript into a compatibility report.
//!
//! ```text
//! Transcript ──▶ FeatureExtractor ──▶ FeatureVector ─┐
//!     │                                            ▼
//!     └──────▶ Summarizer (json_recovery) ──▶ Report::normalize ──▶ Report
//! ```
//!
//! [`quick_score`] is a separate strategy that scores two fact lists with
//! one prompt and never touches the report.

pub mod features;
pub mod json_recovery;
pub mod lexicon;
pub mod quick_score;
pub mod report;
pub mod summarizer;

pub use features::{FeatureExtractor, FeatureVector};
pub use json_recovery::{object_spans, recover_object};
pub use lexicon::{Lexicon, LexiconTable};
pub use quick_score::{extract_score, quick_score};
pub use report::{normalize, Report, DEFAULT_NEXT_STEP, DEFAULT_SCORE};
pub use summarizer::{Summarizer, COMPLETION_FAILURE_FLAG, PARSE_FAILURE_FLAG};

//! Chat: transcripts and the two-persona dialogue engine.

pub mod dialogue;
pub mod transcript;

pub use dialogue::{turn_prompt, DialogueEngine, CURIOUS_FOLLOW_UP, ICEBREAKER};
pub use transcript::{Speaker, Transcript, Turn};

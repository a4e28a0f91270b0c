//! Persona: turning an identity's approved facts into a system instruction.
//!
//! ```text
//! MemoryRecord { facts }
//!   ↓  build_system_prompt(identity, record, goal)
//! system instruction (scope, forbidden topics, fact list, reply shape)
//!   ↓
//! Dialogue engine
//! ```

pub mod prompt;

pub use prompt::{build_system_prompt, DEFAULT_GOAL, NO_FACTS, SCOPE_TOPICS};

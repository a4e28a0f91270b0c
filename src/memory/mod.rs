//! Memory: per-identity approved facts that ground each persona.
//!
//! - [`intake`] collects free-text answers and distills them into facts.
//! - [`storage`] persists the identity → facts document.
//! - [`memory_bank`] is the read-through cache the orchestrator talks to.

pub mod intake;
pub mod memory_bank;
pub mod storage;

pub use intake::{
    decompose_answers, distill, AnswerFileIntake, ConsoleIntake, Distillation, IntakeSource,
    ScriptedIntake, StdinIntake, ELICITATION_PROMPTS,
};
pub use memory_bank::{MemoryBank, MemoryRecord};
pub use storage::{InMemoryPersistence, JsonFilePersistence, MemoryDocument, MemoryPersistence, SqlitePersistence};

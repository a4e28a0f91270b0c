//! Persistence backends for memory records.

pub mod interface;
pub mod json_storage;
pub mod sqlite_storage;

pub use interface::{InMemoryPersistence, MemoryDocument, MemoryPersistence};
pub use json_storage::JsonFilePersistence;
pub use sqlite_storage::SqlitePersistence;

//! Persistence contract for memory records.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::utilities::errors::StoreError;

/// The whole persisted document: identity → ordered fact list.
pub type MemoryDocument = BTreeMap<String, Vec<String>>;

/// A key-value document store for memory records.
///
/// Backends read and write the entire document. Callers that modify it
/// concurrently must provide their own mutual exclusion.
pub trait MemoryPersistence: Send + Sync {
    /// Load the full document. A backend with nothing stored returns an
    /// empty document, not an error.
    fn load(&self) -> Result<MemoryDocument, StoreError>;

    /// Replace the full document.
    fn save(&self, document: &MemoryDocument) -> Result<(), StoreError>;
}

/// An in-process backend, for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    document: Mutex<MemoryDocument>,
    saves: AtomicUsize,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with an existing document.
    pub fn with_document(document: MemoryDocument) -> Self {
        Self {
            document: Mutex::new(document),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl MemoryPersistence for InMemoryPersistence {
    fn load(&self) -> Result<MemoryDocument, StoreError> {
        Ok(self.document.lock().clone())
    }

    fn save(&self, document: &MemoryDocument) -> Result<(), StoreError> {
        *self.document.lock() = document.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_roundtrip() {
        let store = InMemoryPersistence::new();
        assert!(store.load().unwrap().is_empty());

        let mut doc = MemoryDocument::new();
        doc.insert("alice".into(), vec!["loves trail running".into()]);
        store.save(&doc).unwrap();

        assert_eq!(store.load().unwrap(), doc);
        assert_eq!(store.save_count(), 1);
    }
}

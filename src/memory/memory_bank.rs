//! Read-through cache of memory records over a persistence backend.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::memory::intake::{distill, IntakeSource, ELICITATION_PROMPTS};
use crate::memory::storage::interface::MemoryPersistence;
use crate::utilities::errors::StoreError;

/// The approved facts grounding one persona.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryRecord {
    facts: Vec<String>,
}

impl MemoryRecord {
    pub fn new(facts: Vec<String>) -> Self {
        Self { facts }
    }

    /// Build a record by decomposing raw intake answers.
    pub fn from_answers(answers: &[String]) -> Self {
        Self::new(distill(answers).facts)
    }

    pub fn facts(&self) -> &[String] {
        &self.facts
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// The memory store handed to the orchestrator.
///
/// Lookups go cache → persistence → intake. Intake for a given identity is
/// serialized: concurrent first-time `ensure` calls run intake once, and
/// every later caller observes the first writer's record.
pub struct MemoryBank {
    persistence: Box<dyn MemoryPersistence>,
    intake: Box<dyn IntakeSource>,
    cache: RwLock<HashMap<String, MemoryRecord>>,
    intake_locks: DashMap<String, Arc<Mutex<()>>>,
    // Guards the load-modify-save cycle on the shared document.
    write_lock: Mutex<()>,
}

impl MemoryBank {
    pub fn new(persistence: Box<dyn MemoryPersistence>, intake: Box<dyn IntakeSource>) -> Self {
        Self {
            persistence,
            intake,
            cache: RwLock::new(HashMap::new()),
            intake_locks: DashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Return the record for `identity`, running intake if none exists yet.
    ///
    /// An existing record is always reused, never regenerated implicitly.
    pub fn ensure(&self, identity: &str) -> Result<MemoryRecord, StoreError> {
        if let Some(record) = self.lookup(identity)? {
            return Ok(record);
        }

        self.with_intake_lock(identity, || {
            // Another caller may have finished intake while we waited.
            if let Some(record) = self.lookup(identity)? {
                tracing::debug!(identity, "memory created by concurrent intake");
                return Ok(record);
            }
            self.run_intake(identity)
        })
    }

    /// Discard any existing record for `identity` and run intake again.
    pub fn regenerate(&self, identity: &str) -> Result<MemoryRecord, StoreError> {
        self.with_intake_lock(identity, || self.run_intake(identity))
    }

    /// Cached or persisted record, without triggering intake.
    pub fn lookup(&self, identity: &str) -> Result<Option<MemoryRecord>, StoreError> {
        if let Some(record) = self.cache.read().get(identity) {
            return Ok(Some(record.clone()));
        }

        let document = self.persistence.load()?;
        let record = document.get(identity).cloned().map(MemoryRecord::new);
        if let Some(ref record) = record {
            self.cache
                .write()
                .insert(identity.to_string(), record.clone());
        }
        Ok(record)
    }

    /// Run `f` holding the intake lock for `identity`. The lock entry is
    /// removed afterwards unless another caller is waiting on it.
    fn with_intake_lock<T>(&self, identity: &str, f: impl FnOnce() -> T) -> T {
        let lock = self
            .intake_locks
            .entry(identity.to_string())
            .or_default()
            .clone();
        let result = {
            let _guard = lock.lock();
            f()
        };
        drop(lock);
        self.intake_locks
            .remove_if(identity, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    fn run_intake(&self, identity: &str) -> Result<MemoryRecord, StoreError> {
        tracing::info!(identity, "running memory intake");
        let answers = self.intake.answers(identity, &ELICITATION_PROMPTS)?;
        let distilled = distill(&answers);
        if distilled.used_fallback {
            tracing::warn!(identity, "intake fell back to the first raw answer");
        } else if distilled.facts.is_empty() {
            tracing::warn!(identity, "intake produced no usable facts");
        }
        let record = MemoryRecord::new(distilled.facts);

        self.persist(identity, &record)?;
        Ok(record)
    }

    fn persist(&self, identity: &str, record: &MemoryRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut document = self.persistence.load()?;
        document.insert(identity.to_string(), record.facts.clone());
        self.persistence.save(&document)?;
        self.cache
            .write()
            .insert(identity.to_string(), record.clone());
        tracing::debug!(identity, facts = record.facts.len(), "memory record saved");
        Ok(())
    }
}

impl std::fmt::Debug for MemoryBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBank")
            .field("cached", &self.cache.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::intake::ScriptedIntake;
    use crate::memory::storage::interface::{InMemoryPersistence, MemoryDocument};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps another intake source and counts calls.
    struct CountingIntake {
        inner: ScriptedIntake,
        calls: Arc<AtomicUsize>,
    }

    impl IntakeSource for CountingIntake {
        fn answers(&self, identity: &str, prompts: &[&str]) -> Result<Vec<String>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            self.inner.answers(identity, prompts)
        }
    }

    fn bank_with(answers: ScriptedIntake) -> (MemoryBank, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let intake = CountingIntake {
            inner: answers,
            calls: calls.clone(),
        };
        (
            MemoryBank::new(Box::new(InMemoryPersistence::new()), Box::new(intake)),
            calls,
        )
    }

    #[test]
    fn test_ensure_runs_intake_once() {
        let (bank, calls) = bank_with(
            ScriptedIntake::new().with_answers("alice", ["Trail runs at dawn. Strong espresso"]),
        );

        let first = bank.ensure("alice").unwrap();
        assert_eq!(first.facts(), ["Trail runs at dawn", "Strong espresso"]);

        let second = bank.ensure("alice").unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ensure_reads_through_persistence() {
        let mut doc = MemoryDocument::new();
        doc.insert("bo".into(), vec!["collects vinyl".into()]);
        let bank = MemoryBank::new(
            Box::new(InMemoryPersistence::with_document(doc)),
            Box::new(ScriptedIntake::new()),
        );

        let record = bank.ensure("bo").unwrap();
        assert_eq!(record.facts(), ["collects vinyl"]);
    }

    #[test]
    fn test_ensure_propagates_intake_failure() {
        let (bank, _) = bank_with(ScriptedIntake::new());
        assert!(matches!(
            bank.ensure("nobody"),
            Err(StoreError::Intake { .. })
        ));
        assert!(bank.lookup("nobody").unwrap().is_none());
    }

    #[test]
    fn test_regenerate_overwrites() {
        let mut doc = MemoryDocument::new();
        doc.insert("alice".into(), vec!["old fact".into()]);
        let bank = MemoryBank::new(
            Box::new(InMemoryPersistence::with_document(doc)),
            Box::new(ScriptedIntake::new().with_answers("alice", ["brand new fact"])),
        );

        assert_eq!(bank.ensure("alice").unwrap().facts(), ["old fact"]);
        assert_eq!(bank.regenerate("alice").unwrap().facts(), ["brand new fact"]);
        assert_eq!(bank.ensure("alice").unwrap().facts(), ["brand new fact"]);
    }

    #[test]
    fn test_intake_locks_released_after_use() {
        let (bank, _) = bank_with(
            ScriptedIntake::new()
                .with_answers("alice", ["likes chess"])
                .with_answers("bo", ["plays bass"]),
        );

        bank.ensure("alice").unwrap();
        bank.regenerate("bo").unwrap();
        assert!(bank.ensure("nobody").is_err());
        assert!(bank.intake_locks.is_empty());
    }

    #[test]
    fn test_concurrent_first_intake_is_serialized() {
        let (bank, calls) =
            bank_with(ScriptedIntake::new().with_answers("alice", ["loves board games"]));
        let bank = Arc::new(bank);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let bank = bank.clone();
                std::thread::spawn(move || bank.ensure("alice").unwrap())
            })
            .collect();

        let records: Vec<MemoryRecord> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(records.iter().all(|r| r == &records[0]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(bank.intake_locks.is_empty());
    }
}

//! SQLite backend for memory records.

use std::path::PathBuf;

use rusqlite::{params, Connection};

use crate::memory::storage::interface::{MemoryDocument, MemoryPersistence};
use crate::utilities::errors::StoreError;

/// SQLite storage for memory records.
///
/// One row per identity; the fact list is stored as a JSON array alongside
/// the time it was last written.
pub struct SqlitePersistence {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
}

impl SqlitePersistence {
    /// Open (creating if needed) the database at `db_path`.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let db_path = db_path.into();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let storage = Self { db_path };
        storage.initialize_db()?;
        Ok(storage)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Connection::open(&self.db_path).map_err(|e| {
            tracing::error!(
                path = %self.db_path.display(),
                error = %e,
                "failed to open memory database"
            );
            StoreError::Database(e)
        })
    }

    fn initialize_db(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS memories (
                identity TEXT PRIMARY KEY,
                facts TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl MemoryPersistence for SqlitePersistence {
    fn load(&self) -> Result<MemoryDocument, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT identity, facts FROM memories ORDER BY identity")?;
        let rows = stmt.query_map([], |row| {
            let identity: String = row.get(0)?;
            let facts: String = row.get(1)?;
            Ok((identity, facts))
        })?;

        let mut document = MemoryDocument::new();
        for row in rows {
            let (identity, facts_json) = row?;
            let facts: Vec<String> = serde_json::from_str(&facts_json)?;
            document.insert(identity, facts);
        }
        Ok(document)
    }

    fn save(&self, document: &MemoryDocument) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let now = chrono::Utc::now().to_rfc3339();
        let tx = conn.transaction()?;

        {
            let existing: Vec<String> = {
                let mut stmt = tx.prepare("SELECT identity FROM memories")?;
                let ids = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                ids
            };
            for identity in existing.iter().filter(|id| !document.contains_key(*id)) {
                tx.execute("DELETE FROM memories WHERE identity = ?1", params![identity])?;
            }

            let mut upsert = tx.prepare(
                "INSERT INTO memories (identity, facts, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(identity) DO UPDATE SET facts = excluded.facts, updated_at = excluded.updated_at",
            )?;
            for (identity, facts) in document {
                upsert.execute(params![identity, serde_json::to_string(facts)?, now])?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_init_creates_empty_store() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let store = SqlitePersistence::new(tmp.path()).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_save_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let store = SqlitePersistence::new(tmp.path()).unwrap();

        let mut doc = MemoryDocument::new();
        doc.insert("alice".into(), vec!["hikes on sundays".into(), "hates olives".into()]);
        doc.insert("bo".into(), vec!["plays bass".into()]);
        store.save(&doc).unwrap();

        assert_eq!(store.load().unwrap(), doc);
    }

    #[test]
    fn test_sqlite_save_replaces_document() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let store = SqlitePersistence::new(tmp.path()).unwrap();

        let mut doc = MemoryDocument::new();
        doc.insert("alice".into(), vec!["first".into()]);
        doc.insert("bo".into(), vec!["second".into()]);
        store.save(&doc).unwrap();

        doc.remove("bo");
        doc.insert("alice".into(), vec!["updated fact".into()]);
        store.save(&doc).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["alice"], vec!["updated fact".to_string()]);
    }
}

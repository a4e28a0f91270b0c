//! JSON file backend for memory records.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::memory::storage::interface::{MemoryDocument, MemoryPersistence};
use crate::utilities::errors::StoreError;

/// Stores the whole memory document as one pretty-printed JSON object.
///
/// Writes go to a sibling temp file that is then renamed over the target,
/// so a crash mid-write never leaves a truncated document behind.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    pub path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "memories.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl MemoryPersistence for JsonFilePersistence {
    fn load(&self) -> Result<MemoryDocument, StoreError> {
        if !self.path.exists() {
            return Ok(MemoryDocument::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(MemoryDocument::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, document: &MemoryDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(serde_json::to_string_pretty(document)?.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(
            path = %self.path.display(),
            identities = document.len(),
            "memory document saved"
        );
        Ok(())
    }
}

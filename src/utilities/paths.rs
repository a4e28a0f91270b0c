//! Path management for persisted memory records.

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "cloneme";

/// Platform data directory for this application.
///
/// On Linux: `~/.local/share/cloneme`
/// On macOS: `~/Library/Application Support/cloneme`
/// On Windows: `%LOCALAPPDATA%\cloneme`
///
/// The directory is not created here; persistence backends create parents
/// on first write.
pub fn data_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        let home = env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home)
            .join("Library")
            .join("Application Support")
            .join(APP_DIR)
    } else if cfg!(target_os = "windows") {
        let local_app_data = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| env::var("APPDATA").unwrap_or_else(|_| "C:\\tmp".to_string()));
        PathBuf::from(local_app_data).join(APP_DIR)
    } else {
        let base = env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local").join("share")
            });
        base.join(APP_DIR)
    }
}

/// Default location for the memory document of the given backend.
pub fn default_store_path(extension: &str) -> PathBuf {
    data_dir().join(format!("memories.{}", extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_path_extension() {
        let path = default_store_path("json");
        assert_eq!(path.file_name().unwrap(), "memories.json");
        assert!(path.parent().unwrap().ends_with(APP_DIR));
    }
}

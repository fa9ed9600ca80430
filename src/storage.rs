//! Key-value persistence for session state.
//!
//! The token store never touches the filesystem directly; it goes through
//! the `TokenStorage` trait so the desktop shell can use the on-disk backend
//! while tests and short-lived tools substitute the in-memory one without
//! changing any protocol logic.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use parking_lot::RwLock;

/// Storage file name in the cache directory
const STORAGE_FILE: &str = "session.json";

pub trait TokenStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// File-backed storage: a flat JSON map under the cache directory.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            path: cache_dir.join(STORAGE_FILE),
        }
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read session storage file")?;
        serde_json::from_str(&contents).context("Failed to parse session storage file")
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents).context("Failed to write session storage file")
    }
}

impl TokenStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.load()?;
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert!(storage.get("access_token").unwrap().is_none());

        storage.put("access_token", "abc").unwrap();
        assert_eq!(storage.get("access_token").unwrap().as_deref(), Some("abc"));

        storage.put("access_token", "def").unwrap();
        assert_eq!(storage.get("access_token").unwrap().as_deref(), Some("def"));

        storage.remove("access_token").unwrap();
        assert!(storage.get("access_token").unwrap().is_none());

        // Removing a missing key is not an error
        storage.remove("access_token").unwrap();
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());

        assert!(storage.get("access_token").unwrap().is_none());

        storage.put("access_token", "abc").unwrap();
        storage.put("authorities", "ROLE_DISPATCHER").unwrap();

        // A fresh instance over the same directory sees persisted entries
        let reopened = FileStorage::new(dir.path().to_path_buf());
        assert_eq!(
            reopened.get("access_token").unwrap().as_deref(),
            Some("abc")
        );

        reopened.remove("access_token").unwrap();
        assert!(storage.get("access_token").unwrap().is_none());
        assert_eq!(
            storage.get("authorities").unwrap().as_deref(),
            Some("ROLE_DISPATCHER")
        );
    }
}

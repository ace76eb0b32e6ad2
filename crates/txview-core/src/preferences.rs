//! Key-value preference storage
//!
//! The sort controller depends on the [`PreferenceStore`] capability rather
//! than a concrete store, so tests can swap in [`MemoryPreferenceStore`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::error::{CoreError, CoreResult};

/// Durable, synchronous key-value store for user preferences
pub trait PreferenceStore: Send + Sync {
    /// Read a value; unavailable stores behave as empty
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;

    /// Remove a value
    fn remove(&self, key: &str) -> CoreResult<()>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RwLock<BTreeMap<String, String>>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Store backed by a JSON object file, rewritten on every change.
///
/// A missing or corrupt file reads as empty.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FilePreferenceStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = Self::read_file(&path);
        Self {
            path,
            values: RwLock::new(values),
        }
    }

    fn read_file(path: &Path) -> BTreeMap<String, String> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                log::warn!("Cannot read {}: {}", path.display(), e);
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Ignoring corrupt preference file {}: {}", path.display(), e);
            BTreeMap::new()
        })
    }

    fn write_file(&self, values: &BTreeMap<String, String>) -> CoreResult<()> {
        let content = serde_json::to_string_pretty(values).map_err(|e| CoreError::PreferenceStore {
            message: e.to_string(),
        })?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        self.write_file(&values)
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        if values.remove(key).is_some() {
            self.write_file(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("txview-prefs-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryPreferenceStore::default();
        assert_eq!(store.get("k"), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let path = temp_path("persist");
        let _ = std::fs::remove_file(&path);

        let store = FilePreferenceStore::open(&path);
        store.set("transactions-sort-config", r#"{"field":"title","order":"asc"}"#).unwrap();

        let reopened = FilePreferenceStore::open(&path);
        assert_eq!(
            reopened.get("transactions-sort-config").as_deref(),
            Some(r#"{"field":"title","order":"asc"}"#)
        );

        reopened.remove("transactions-sort-config").unwrap();
        assert_eq!(FilePreferenceStore::open(&path).get("transactions-sort-config"), None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{not json").unwrap();

        let store = FilePreferenceStore::open(&path);
        assert_eq!(store.get("anything"), None);

        // writing replaces the corrupt content
        store.set("k", "v").unwrap();
        assert_eq!(FilePreferenceStore::open(&path).get("k").as_deref(), Some("v"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unwritable_location_reports_error() {
        let path = temp_path("dir-as-file");
        let _ = std::fs::remove_file(&path);
        std::fs::create_dir_all(&path).unwrap();

        let store = FilePreferenceStore::open(&path);
        assert!(store.set("k", "v").is_err());
        // the in-memory value is still readable
        assert_eq!(store.get("k").as_deref(), Some("v"));
        let _ = std::fs::remove_dir_all(&path);
    }
}

//! File-based key-value storage
//!
//! One JSON file per key inside a data directory. The file name is the
//! URL-encoded key, so namespaced keys such as `@taskflow/tasks/ada` stay
//! flat and unambiguous on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::repository::KeyValueStore;
use crate::{Error, Result};

const FILE_EXTENSION: &str = "json";

/// File-backed storage rooted at a directory
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Create a new FileKeyValueStore
    ///
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", urlencoding::encode(key), FILE_EXTENSION))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::Storage(format!("Failed to create directory: {}", e))
        })?;

        // Write beside the target, then rename over it
        let path = self.path_for(key);
        let staging = path.with_extension(format!("{}.tmp", FILE_EXTENSION));
        tokio::fs::write(&staging, value).await.map_err(|e| {
            Error::Storage(format!("Failed to write {}: {}", staging.display(), e))
        })?;
        tokio::fs::rename(&staging, &path).await.map_err(|e| {
            Error::Storage(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FileKeyValueStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(temp_dir.path().join("data"));
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_missing_key_reads_none() {
        let (store, _temp) = create_test_store();
        assert!(store.get("@taskflow/tasks/default").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_creates_directory_and_round_trips() {
        let (store, _temp) = create_test_store();

        store.set("@taskflow/tasks/ada", "[]").await.unwrap();
        assert_eq!(
            store.get("@taskflow/tasks/ada").await.unwrap().as_deref(),
            Some("[]")
        );

        store.set("@taskflow/tasks/ada", "[1]").await.unwrap();
        assert_eq!(
            store.get("@taskflow/tasks/ada").await.unwrap().as_deref(),
            Some("[1]")
        );
    }

    #[tokio::test]
    async fn test_keys_map_to_flat_distinct_files() {
        let (store, _temp) = create_test_store();

        let a = store.path_for("@taskflow/tasks/ada");
        let b = store.path_for("@taskflow/tasks~ada");
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(store.dir()));

        store.set("@taskflow/tasks/ada", "a").await.unwrap();
        store.set("@taskflow/tasks~ada", "b").await.unwrap();
        assert_eq!(store.get("@taskflow/tasks/ada").await.unwrap().as_deref(), Some("a"));
        assert_eq!(store.get("@taskflow/tasks~ada").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_remove() {
        let (store, _temp) = create_test_store();

        store.set("@taskflow/profile", "{}").await.unwrap();
        store.remove("@taskflow/profile").await.unwrap();
        assert!(store.get("@taskflow/profile").await.unwrap().is_none());

        // Removing again is fine
        store.remove("@taskflow/profile").await.unwrap();
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = FileKeyValueStore::new(temp_dir.path());
            store.set("k", "survives").await.unwrap();
        }

        {
            let store = FileKeyValueStore::new(temp_dir.path());
            assert_eq!(store.get("k").await.unwrap().as_deref(), Some("survives"));
        }
    }
}

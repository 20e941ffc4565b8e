//! Filesystem-backed durable store.
//!
//! One file per key inside a single directory. File names are the
//! hex-encoded key so any string is a valid key.

use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::{fs, task};

use super::{DurableStore, StorageResult};

// == File Store ==
/// A [`DurableStore`] that keeps every key in its own file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    // == Constructor ==
    /// Creates a store rooted at `dir`. The directory is created on first
    /// write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(hex::encode(key.as_bytes()))
    }

    async fn remove_path(&self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl DurableStore for FileStore {
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        fs::create_dir_all(&self.dir).await?;

        // Each write gets its own temp file, then an atomic rename. The last
        // rename to land wins and readers never observe a partial value.
        let dir = self.dir.clone();
        let path = self.path_for(key);
        let value = value.to_owned();
        task::spawn_blocking(move || -> StorageResult<()> {
            let mut file = NamedTempFile::new_in(&dir)?;
            file.write_all(value.as_bytes())?;
            file.persist(&path).map_err(|x| x.error)?;
            Ok(())
        })
        .await
        .map_err(io::Error::other)?
    }

    async fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.remove_path(key).await
    }

    async fn get_all_keys(&self) -> StorageResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            // Leftover temp files and foreign files do not decode.
            let Ok(bytes) = hex::decode(name) else {
                continue;
            };
            if let Ok(key) = String::from_utf8(bytes) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    async fn multi_remove(&self, keys: &[String]) -> StorageResult<()> {
        for key in keys {
            self.remove_path(key).await?;
        }
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("cache"));

        assert_eq!(store.get_item("cache_a").await.unwrap(), None);
        assert!(store.get_all_keys().await.unwrap().is_empty());

        store.set_item("cache_a", r#"{"x":1}"#).await.unwrap();
        assert_eq!(
            store.get_item("cache_a").await.unwrap().as_deref(),
            Some(r#"{"x":1}"#)
        );
    }

    #[tokio::test]
    async fn test_keys_with_path_characters() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let key = "cache_class_details_../../etc/passwd";
        store.set_item(key, "v").await.unwrap();

        assert_eq!(store.get_all_keys().await.unwrap(), vec![key.to_string()]);
        assert_eq!(store.get_item(key).await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::new(dir.path())
            .set_item("cache_k", "persisted")
            .await
            .unwrap();

        let reopened = FileStore::new(dir.path());
        assert_eq!(
            reopened.get_item("cache_k").await.unwrap().as_deref(),
            Some("persisted")
        );
    }

    #[tokio::test]
    async fn test_remove_and_multi_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        for key in ["a", "b", "c"] {
            store.set_item(key, key).await.unwrap();
        }

        store.remove_item("a").await.unwrap();
        store.remove_item("missing").await.unwrap();
        store
            .multi_remove(&["b".to_string(), "nope".to_string()])
            .await
            .unwrap();

        assert_eq!(store.get_all_keys().await.unwrap(), vec!["c".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_to_one_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let writers: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                let value = format!("{i:02}").repeat(50_000);
                tokio::spawn(async move { store.set_item("cache_k", &value).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let stored = store.get_item("cache_k").await.unwrap().unwrap();
        assert_eq!(stored.len(), 100_000);
        assert_eq!(stored, stored[..2].repeat(50_000));
        assert_eq!(store.get_all_keys().await.unwrap(), vec!["cache_k".to_string()]);
    }

    #[tokio::test]
    async fn test_foreign_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README"), "not a key").unwrap();
        let store = FileStore::new(dir.path());
        store.set_item("k", "v").await.unwrap();

        assert_eq!(store.get_all_keys().await.unwrap(), vec!["k".to_string()]);
    }
}

//! Persisted-tier back-ends
//!
//! The persisted tier plays the role of a browser tab's session storage: it
//! survives a reload of the process that owns the cache but is not shared
//! across sessions. Values are opaque strings; the cache store owns their
//! layout.

use crate::error::{CatalogError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use tracing::debug;

/// Longest file name common filesystems accept
const MAX_FILE_NAME_LEN: usize = 255;

/// Key/value storage backing the persisted cache tier
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the raw value stored under `key`
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    async fn write(&self, key: &str, value: String) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    async fn remove(&self, key: &str) -> Result<()>;

    /// List every stored key
    async fn keys(&self) -> Result<Vec<String>>;
}

/// In-process session store
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: String) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.values.read().await.keys().cloned().collect())
    }
}

/// Session store keeping one JSON file per key inside a directory
///
/// File names are the hex encoding of the key so any key maps to a valid,
/// reversible file name. Hex doubles the key length, so keys longer than
/// about 120 bytes (namespace included) are rejected with a storage error,
/// which the cache logs and treats as a miss.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        debug!("Opened file session store at {}", dir.display());
        Ok(Self { dir })
    }

    /// Directory holding the entries
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let name = format!("{}.json", hex::encode(key));
        if name.len() > MAX_FILE_NAME_LEN {
            return Err(CatalogError::Storage(format!(
                "key of {} bytes is too long for the file session store",
                key.len()
            )));
        }
        Ok(self.dir.join(name))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read(self.path_for(key)?).await {
            // Non UTF-8 bytes are foreign content; hand them to the cache as-is
            // so it can treat them as corrupt.
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key)?;
        let dir = self.dir.clone();

        // Every write stages its own uniquely named file and renames it over
        // the target, so readers see either the old or the new document.
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut staged = NamedTempFile::new_in(&dir)?;
            staged.write_all(value.as_bytes())?;
            staged.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| CatalogError::Storage(format!("session write task failed: {}", e)))?
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if let Some(key) = decode_key(stem) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

fn decode_key(encoded: &str) -> Option<String> {
    hex::decode(encoded)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_encoding_is_reversible() {
        for key in ["catalog:products", "catalog:page?q=camiseta roja&page=2", "ñ"] {
            assert_eq!(decode_key(&hex::encode(key)).as_deref(), Some(key));
        }
        assert_eq!(decode_key("abc"), None);
        assert_eq!(decode_key("zz"), None);
    }

    #[tokio::test]
    async fn test_memory_store_operations() {
        let store = MemorySessionStore::new();

        store.write("a", "1".to_string()).await.unwrap();
        store.write("b", "2".to_string()).await.unwrap();
        assert_eq!(store.read("a").await.unwrap(), Some("1".to_string()));

        store.remove("a").await.unwrap();
        store.remove("missing").await.unwrap();
        assert_eq!(store.read("a").await.unwrap(), None);
        assert_eq!(store.keys().await.unwrap(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileSessionStore::open(dir.path()).await.unwrap();
        store
            .write("catalog:products", r#"{"data":[],"timestamp":"2024-01-01T00:00:00Z"}"#.to_string())
            .await
            .unwrap();
        drop(store);

        let reopened = FileSessionStore::open(dir.path()).await.unwrap();
        let raw = reopened.read("catalog:products").await.unwrap();
        assert!(raw.unwrap().contains("timestamp"));
        assert_eq!(reopened.keys().await.unwrap(), vec!["catalog:products".to_string()]);

        reopened.remove("catalog:products").await.unwrap();
        assert_eq!(reopened.read("catalog:products").await.unwrap(), None);
        assert!(reopened.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "hello").await.unwrap();
        tokio::fs::write(dir.path().join("xyz.json"), "{}").await.unwrap();

        let store = FileSessionStore::open(dir.path()).await.unwrap();
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_rejects_overlong_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();
        let key = format!("catalog:page?q={}", "x".repeat(200));

        let err = store.write(&key, "{}".to_string()).await.unwrap_err();
        assert!(matches!(err, CatalogError::Storage(_)));
        assert!(store.read(&key).await.is_err());
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_of_one_key_never_tear() {
        use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).await.unwrap();
        let write_errors = Arc::new(AtomicUsize::new(0));
        let torn_reads = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let done = Arc::new(AtomicBool::new(false));

            let reader = {
                let store = store.clone();
                let done = done.clone();
                let torn_reads = torn_reads.clone();
                tokio::spawn(async move {
                    while !done.load(Ordering::SeqCst) {
                        if let Ok(Some(raw)) = store.read("catalog:products").await {
                            if serde_json::from_str::<serde_json::Value>(&raw).is_err() {
                                torn_reads.fetch_add(1, Ordering::SeqCst);
                            }
                        }
                        tokio::task::yield_now().await;
                    }
                })
            };

            let writers: Vec<_> = (0..8)
                .map(|writer| {
                    let store = store.clone();
                    let write_errors = write_errors.clone();
                    tokio::spawn(async move {
                        let doc = serde_json::json!({
                            "writer": writer,
                            "data": "x".repeat(200_000),
                        })
                        .to_string();
                        if store.write("catalog:products", doc).await.is_err() {
                            write_errors.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();

            for result in futures::future::join_all(writers).await {
                result.unwrap();
            }
            done.store(true, Ordering::SeqCst);
            reader.await.unwrap();
        }

        assert_eq!(write_errors.load(Ordering::SeqCst), 0);
        assert_eq!(torn_reads.load(Ordering::SeqCst), 0);

        // Staged files never linger as keys
        assert_eq!(store.keys().await.unwrap(), vec!["catalog:products".to_string()]);
    }
}

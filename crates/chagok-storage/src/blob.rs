//! Blob store trait and implementations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use chagok_core::{Error, Result};

/// Object storage for raw evidence files, addressed by key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store an object.
    async fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Fetch an object's bytes. `Error::NotFound` when the key is absent.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Whether an object exists.
    async fn exists(&self, key: &str) -> Result<bool>;
}

/// Filesystem-backed blob store for development and self-hosted deployments.
///
/// Keys map to paths under the root directory. Keys are validated against
/// traversal before touching the filesystem.
pub struct FilesystemBlobStore {
    root: PathBuf,
}

impl FilesystemBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Read the storage root from `CHAGOK_STORAGE_ROOT`.
    pub fn from_env() -> Result<Self> {
        let root = std::env::var(chagok_core::defaults::ENV_STORAGE_ROOT)
            .map_err(|_| Error::Config("CHAGOK_STORAGE_ROOT is not set".to_string()))?;
        Ok(Self::new(root))
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.starts_with('/') || key.split('/').any(|seg| seg == "..") {
            return Err(Error::Storage(format!("invalid object key: {}", key)));
        }
        Ok(self.root.join(Path::new(key)))
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        debug!(
            subsystem = "storage",
            component = "blob",
            op = "put",
            object_key = %key,
            blob_bytes = data.len(),
            "Object stored"
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("object {}", key)))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}

/// In-memory blob store for tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        self.objects
            .write()
            .await
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("object {}", key)))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryBlobStore::new();
        store.put("cases/c1/raw/a.txt", b"hello").await.unwrap();

        assert!(store.exists("cases/c1/raw/a.txt").await.unwrap());
        assert_eq!(store.get("cases/c1/raw/a.txt").await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_memory_store_missing_key() {
        let store = MemoryBlobStore::new();
        let err = store.get("cases/c1/raw/nope.txt").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(!store.exists("cases/c1/raw/nope.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_filesystem_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());

        store
            .put("cases/c1/raw/ev_0123456789ab_chat.txt", b"[A] hi")
            .await
            .unwrap();
        let data = store
            .get("cases/c1/raw/ev_0123456789ab_chat.txt")
            .await
            .unwrap();
        assert_eq!(data, b"[A] hi");
    }

    #[tokio::test]
    async fn test_filesystem_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());

        assert!(store.get("../outside.txt").await.is_err());
        assert!(store.get("/etc/passwd").await.is_err());
        assert!(store.put("cases/../../x", b"data").await.is_err());
    }

    #[tokio::test]
    async fn test_filesystem_store_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path());
        let err = store.get("cases/c1/raw/missing.txt").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}

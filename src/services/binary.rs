//! Binary content storage for NonRDFSource resources.
//! Uses the Apache Arrow object_store crate.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{ObjectStore, path::Path as StoragePath};
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BinaryError {
    #[error("binary not found: {0}")]
    NotFound(String),

    #[error("requested range {start}-{end} not satisfiable for {size} bytes")]
    RangeNotSatisfiable { start: u64, end: u64, size: u64 },

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BinaryError>;

#[async_trait]
pub trait BinaryService: Send + Sync {
    /// Full content of a binary.
    async fn get(&self, identifier: &str) -> Result<Bytes>;

    /// A byte range; `end` is exclusive and clamped to the content length.
    async fn get_range(&self, identifier: &str, range: Range<u64>) -> Result<Bytes>;

    /// Size of a stored binary in bytes.
    async fn size(&self, identifier: &str) -> Result<u64>;

    /// Store content, returning the number of bytes written.
    async fn set_content(&self, identifier: &str, content: Bytes) -> Result<u64>;

    fn generate_identifier(&self) -> String {
        format!("binaries/{}", Uuid::now_v7())
    }
}

/// BinaryService over any object_store backend.
#[derive(Clone)]
pub struct ObjectStoreBinaryService {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreBinaryService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// In-memory storage for tests and development.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(object_store::memory::InMemory::new()))
    }

    /// Local filesystem storage rooted at `root`, created if missing.
    pub fn local(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let store = object_store::local::LocalFileSystem::new_with_prefix(root)?;
        Ok(Self::new(Arc::new(store)))
    }
}

fn not_found(identifier: &str, err: object_store::Error) -> BinaryError {
    match err {
        object_store::Error::NotFound { .. } => BinaryError::NotFound(identifier.to_string()),
        other => BinaryError::ObjectStore(other),
    }
}

#[async_trait]
impl BinaryService for ObjectStoreBinaryService {
    async fn get(&self, identifier: &str) -> Result<Bytes> {
        let path = StoragePath::from(identifier);
        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| not_found(identifier, e))?;
        let bytes = result.bytes().await?;

        tracing::debug!(identifier, size = bytes.len(), "Read binary");
        Ok(bytes)
    }

    async fn get_range(&self, identifier: &str, range: Range<u64>) -> Result<Bytes> {
        let size = self.size(identifier).await?;
        if range.start >= size || range.start >= range.end {
            return Err(BinaryError::RangeNotSatisfiable {
                start: range.start,
                end: range.end,
                size,
            });
        }
        let clamped = range.start..range.end.min(size);
        let path = StoragePath::from(identifier);
        let bytes = self
            .store
            .get_range(&path, clamped)
            .await
            .map_err(|e| not_found(identifier, e))?;
        Ok(bytes)
    }

    async fn size(&self, identifier: &str) -> Result<u64> {
        let path = StoragePath::from(identifier);
        let meta = self
            .store
            .head(&path)
            .await
            .map_err(|e| not_found(identifier, e))?;
        Ok(meta.size)
    }

    async fn set_content(&self, identifier: &str, content: Bytes) -> Result<u64> {
        let path = StoragePath::from(identifier);
        let size = content.len() as u64;
        self.store.put(&path, content.into()).await?;

        tracing::info!(identifier, size, "Stored binary");
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_reads_content() {
        let svc = ObjectStoreBinaryService::in_memory();
        let id = svc.generate_identifier();
        assert!(id.starts_with("binaries/"));

        let written = svc
            .set_content(&id, Bytes::from_static(b"Some input stream"))
            .await
            .unwrap();
        assert_eq!(written, 17);
        assert_eq!(svc.get(&id).await.unwrap(), Bytes::from_static(b"Some input stream"));
        assert_eq!(svc.size(&id).await.unwrap(), 17);
    }

    #[tokio::test]
    async fn range_reads_are_clamped() {
        let svc = ObjectStoreBinaryService::in_memory();
        svc.set_content("binaries/r", Bytes::from_static(b"0123456789"))
            .await
            .unwrap();

        assert_eq!(
            svc.get_range("binaries/r", 2..5).await.unwrap(),
            Bytes::from_static(b"234")
        );
        assert_eq!(
            svc.get_range("binaries/r", 8..100).await.unwrap(),
            Bytes::from_static(b"89")
        );
        assert!(matches!(
            svc.get_range("binaries/r", 20..30).await,
            Err(BinaryError::RangeNotSatisfiable { size: 10, .. })
        ));
    }

    #[tokio::test]
    async fn missing_content() {
        let svc = ObjectStoreBinaryService::in_memory();
        assert!(matches!(
            svc.get("binaries/missing").await,
            Err(BinaryError::NotFound(_))
        ));
        assert!(svc.size("binaries/missing").await.is_err());
    }

    #[tokio::test]
    async fn local_filesystem_backend() {
        let dir = tempfile::TempDir::new().unwrap();
        let svc = ObjectStoreBinaryService::local(&dir.path().join("bin")).unwrap();
        svc.set_content("binaries/local", Bytes::from_static(b"on disk"))
            .await
            .unwrap();
        assert_eq!(
            svc.get("binaries/local").await.unwrap(),
            Bytes::from_static(b"on disk")
        );
    }
}

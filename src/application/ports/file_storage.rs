use std::io;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ExecutionSource, StoragePath};

/// Path-addressed byte storage. Every document access goes through this port
/// so local disk and object stores are interchangeable.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn read(&self, path: &StoragePath) -> Result<Vec<u8>, FileStorageError>;

    async fn write(&self, path: &StoragePath, data: &[u8]) -> Result<(), FileStorageError>;

    async fn write_text(&self, path: &StoragePath, text: &str) -> Result<(), FileStorageError> {
        self.write(path, text.as_bytes()).await
    }

    async fn exists(&self, path: &StoragePath) -> Result<bool, FileStorageError>;

    async fn mkdir(&self, path: &StoragePath, create_parents: bool)
    -> Result<(), FileStorageError>;
}

/// Picks the storage backend for an execution source.
pub trait FileStorageResolver: Send + Sync {
    fn for_source(&self, source: ExecutionSource) -> Arc<dyn FileStorage>;
}

#[derive(Debug, thiserror::Error)]
pub enum FileStorageError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("read failed: {0}")]
    ReadFailed(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("storage configuration: {0}")]
    Configuration(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

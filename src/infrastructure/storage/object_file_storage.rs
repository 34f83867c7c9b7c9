use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};

use crate::application::ports::{FileStorage, FileStorageError};
use crate::domain::StoragePath;

/// `FileStorage` over any `object_store` backend. Object stores have no real
/// directories, so `mkdir` only touches disk when a local root is known.
pub struct ObjectFileStorage {
    inner: Arc<dyn ObjectStore>,
    local_root: Option<PathBuf>,
}

impl ObjectFileStorage {
    pub fn new(inner: Arc<dyn ObjectStore>) -> Self {
        Self {
            inner,
            local_root: None,
        }
    }

    pub(super) fn with_local_root(inner: Arc<dyn ObjectStore>, root: PathBuf) -> Self {
        Self {
            inner,
            local_root: Some(root),
        }
    }
}

fn store_path(path: &StoragePath) -> StorePath {
    StorePath::from(path.as_str())
}

#[async_trait]
impl FileStorage for ObjectFileStorage {
    async fn read(&self, path: &StoragePath) -> Result<Vec<u8>, FileStorageError> {
        let result = self
            .inner
            .get(&store_path(path))
            .await
            .map_err(|e| match e {
                object_store::Error::NotFound { .. } => FileStorageError::NotFound(path.to_string()),
                other => FileStorageError::ReadFailed(other.to_string()),
            })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| FileStorageError::ReadFailed(e.to_string()))?;

        Ok(bytes.to_vec())
    }

    async fn write(&self, path: &StoragePath, data: &[u8]) -> Result<(), FileStorageError> {
        self.inner
            .put(&store_path(path), PutPayload::from(data.to_vec()))
            .await
            .map_err(|e| FileStorageError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    async fn exists(&self, path: &StoragePath) -> Result<bool, FileStorageError> {
        match self.inner.head(&store_path(path)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(FileStorageError::ReadFailed(e.to_string())),
        }
    }

    async fn mkdir(
        &self,
        path: &StoragePath,
        create_parents: bool,
    ) -> Result<(), FileStorageError> {
        let Some(root) = self.local_root.as_ref() else {
            return Ok(());
        };
        let dir = root.join(path.as_str().trim_start_matches('/'));
        if create_parents {
            tokio::fs::create_dir_all(&dir).await?;
        } else if !tokio::fs::try_exists(&dir).await? {
            tokio::fs::create_dir(&dir).await?;
        }
        Ok(())
    }
}

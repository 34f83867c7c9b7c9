use std::sync::Arc;

use async_trait::async_trait;
use object_store::ObjectStore;
use object_store::memory::InMemory;
use object_store::path::Path as StorePath;

use crate::application::ports::{FileStorage, FileStorageError};
use crate::domain::StoragePath;

use super::object_file_storage::ObjectFileStorage;

/// In-process storage for tests and scaffolding.
pub struct MemoryFileStorage {
    store: Arc<InMemory>,
    files: ObjectFileStorage,
}

impl Default for MemoryFileStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileStorage {
    pub fn new() -> Self {
        let store = Arc::new(InMemory::new());
        let files = ObjectFileStorage::new(Arc::clone(&store) as Arc<dyn ObjectStore>);
        Self { store, files }
    }

    pub async fn with_file(self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        let _ = self.files.write(&StoragePath::new(path), &data).await;
        self
    }

    pub async fn read_text(&self, path: &str) -> Option<String> {
        let bytes = self.files.read(&StoragePath::new(path)).await.ok()?;
        String::from_utf8(bytes).ok()
    }

    pub async fn object_count(&self) -> usize {
        use futures::TryStreamExt;
        self.store
            .list(None::<&StorePath>)
            .try_collect::<Vec<_>>()
            .await
            .map(|objects| objects.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl FileStorage for MemoryFileStorage {
    async fn read(&self, path: &StoragePath) -> Result<Vec<u8>, FileStorageError> {
        self.files.read(path).await
    }

    async fn write(&self, path: &StoragePath, data: &[u8]) -> Result<(), FileStorageError> {
        self.files.write(path, data).await
    }

    async fn exists(&self, path: &StoragePath) -> Result<bool, FileStorageError> {
        self.files.exists(path).await
    }

    async fn mkdir(
        &self,
        path: &StoragePath,
        create_parents: bool,
    ) -> Result<(), FileStorageError> {
        self.files.mkdir(path, create_parents).await
    }
}

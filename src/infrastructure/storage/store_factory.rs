use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{FileStorage, FileStorageError, FileStorageResolver};
use crate::domain::ExecutionSource;
use crate::presentation::config::{StorageProviderSetting, StorageSettings};

use super::azure_store::azure_file_storage;
use super::local_store::local_file_storage;
use super::mock_store::MemoryFileStorage;

/// One backend for ad hoc (IDE) runs and one for tool runs.
#[derive(Clone)]
pub struct StorageRouter {
    ide: Arc<dyn FileStorage>,
    tool: Arc<dyn FileStorage>,
}

impl StorageRouter {
    pub fn new(ide: Arc<dyn FileStorage>, tool: Arc<dyn FileStorage>) -> Self {
        Self { ide, tool }
    }

    /// Same backend for every execution source.
    pub fn shared(storage: Arc<dyn FileStorage>) -> Self {
        Self {
            ide: Arc::clone(&storage),
            tool: storage,
        }
    }
}

impl FileStorageResolver for StorageRouter {
    fn for_source(&self, source: ExecutionSource) -> Arc<dyn FileStorage> {
        match source {
            ExecutionSource::Ide => Arc::clone(&self.ide),
            ExecutionSource::Tool => Arc::clone(&self.tool),
        }
    }
}

pub struct FileStorageFactory;

impl FileStorageFactory {
    pub fn create(settings: &StorageSettings) -> Result<StorageRouter, FileStorageError> {
        match settings.provider {
            StorageProviderSetting::Local => {
                let ide = local_file_storage(PathBuf::from(&settings.local_path))?;
                let tool_root = settings.tool_path.as_deref().unwrap_or(&settings.local_path);
                let tool = local_file_storage(PathBuf::from(tool_root))?;
                Ok(StorageRouter::new(Arc::new(ide), Arc::new(tool)))
            }
            StorageProviderSetting::Azure => {
                let account = settings.azure_account.as_deref().ok_or_else(|| {
                    FileStorageError::Configuration("azure_account required".into())
                })?;
                let key = settings.azure_access_key.as_deref().ok_or_else(|| {
                    FileStorageError::Configuration("azure_access_key required".into())
                })?;
                let container = settings.azure_container.as_deref().ok_or_else(|| {
                    FileStorageError::Configuration("azure_container required".into())
                })?;
                let tool_container = settings.azure_tool_container.as_deref().unwrap_or(container);

                let ide = azure_file_storage(account, key, container)?;
                let tool = azure_file_storage(account, key, tool_container)?;
                Ok(StorageRouter::new(Arc::new(ide), Arc::new(tool)))
            }
            StorageProviderSetting::Memory => {
                Ok(StorageRouter::shared(Arc::new(MemoryFileStorage::new())))
            }
        }
    }
}

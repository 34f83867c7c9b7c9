use std::path::PathBuf;
use std::sync::Arc;

use object_store::local::LocalFileSystem;

use crate::application::ports::FileStorageError;

use super::object_file_storage::ObjectFileStorage;

/// Storage rooted at a local directory; document paths resolve below it.
pub fn local_file_storage(base_path: PathBuf) -> Result<ObjectFileStorage, FileStorageError> {
    std::fs::create_dir_all(&base_path)?;
    let fs = LocalFileSystem::new_with_prefix(&base_path)
        .map_err(|e| FileStorageError::Configuration(e.to_string()))?;
    Ok(ObjectFileStorage::with_local_root(Arc::new(fs), base_path))
}

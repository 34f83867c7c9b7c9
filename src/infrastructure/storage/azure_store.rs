use std::sync::Arc;

use object_store::azure::MicrosoftAzureBuilder;

use crate::application::ports::FileStorageError;

use super::object_file_storage::ObjectFileStorage;

pub fn azure_file_storage(
    account: &str,
    access_key: &str,
    container: &str,
) -> Result<ObjectFileStorage, FileStorageError> {
    let store = MicrosoftAzureBuilder::new()
        .with_account(account)
        .with_access_key(access_key)
        .with_container_name(container)
        .build()
        .map_err(|e| FileStorageError::Configuration(e.to_string()))?;

    Ok(ObjectFileStorage::new(Arc::new(store)))
}

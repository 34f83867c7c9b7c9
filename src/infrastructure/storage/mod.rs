mod azure_store;
mod local_store;
mod mock_store;
mod object_file_storage;
mod store_factory;

pub use azure_store::azure_file_storage;
pub use local_store::local_file_storage;
pub use mock_store::MemoryFileStorage;
pub use object_file_storage::ObjectFileStorage;
pub use store_factory::{FileStorageFactory, StorageRouter};

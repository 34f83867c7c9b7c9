mod adapter_config_provider;
mod file_storage;
mod llm_client;
mod page_rasterizer;
mod text_extractor;

pub use adapter_config_provider::{AdapterConfigError, AdapterConfigProvider};
pub use file_storage::{FileStorage, FileStorageError, FileStorageResolver};
pub use llm_client::{LlmClient, LlmClientError};
pub use page_rasterizer::{PageRasterizer, RasterizeError};
pub use text_extractor::{ExtractorError, ExtractorResolver, ProcessOptions, TextExtractor};

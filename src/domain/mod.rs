mod adapter_config;
mod document;
mod execution_source;
mod extraction_result;
mod storage_path;
mod vision_message;

pub use adapter_config::{AdapterConfig, LlmCallConfig, ToolSettings};
pub use document::ContentType;
pub use execution_source::ExecutionSource;
pub use extraction_result::{ExtractionMetadata, ExtractionResult};
pub use storage_path::StoragePath;
pub use vision_message::{ContentPart, ImageUrl, MessageContent, MessageRole, VisionMessage};

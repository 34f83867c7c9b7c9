use std::sync::Arc;

use async_trait::async_trait;

use super::FileStorage;
use crate::domain::{ExtractionResult, StoragePath};

/// Per-call overrides passed to an adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    pub enable_highlight: bool,
    pub tag: Option<String>,
}

impl ProcessOptions {
    pub fn with_highlight(mut self, enable_highlight: bool) -> Self {
        self.enable_highlight = enable_highlight;
        self
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag.filter(|t| !t.trim().is_empty());
        self
    }
}

/// Capability contract shared by every extraction backend.
///
/// `process` only reads `input`. When `output` is given the extracted text is
/// written there as a side effect. Failures to reach or understand the backend
/// are errors; an adapter never reports partial success.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn supports_highlight(&self) -> bool {
        false
    }

    /// Operator hint appended to every error this adapter surfaces.
    fn failure_guidance(&self) -> Option<&'static str> {
        None
    }

    async fn process(
        &self,
        input: &StoragePath,
        output: Option<&StoragePath>,
        options: &ProcessOptions,
        storage: &dyn FileStorage,
    ) -> Result<ExtractionResult, ExtractorError>;

    async fn test_connection(&self) -> Result<bool, ExtractorError>;
}

/// Turns an adapter instance id into a ready-to-use adapter.
#[async_trait]
pub trait ExtractorResolver: Send + Sync {
    async fn resolve(&self, instance_id: &str) -> Result<Arc<dyn TextExtractor>, ExtractorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    #[error("{0}")]
    InvalidConfig(String),
    #[error("{0}")]
    UnsupportedInput(String),
    #[error("{0}")]
    FileRead(String),
    #[error("{0}")]
    Unreachable(String),
    #[error("{0}")]
    Timeout(String),
    #[error("{0}")]
    ProtocolViolation(String),
    #[error("{message}")]
    Service { message: String, status_code: u16 },
    #[error("{0}")]
    Failed(String),
}

impl ExtractorError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidConfig(_) | Self::UnsupportedInput(_) => 400,
            Self::FileRead(_) => 404,
            Self::Unreachable(_) => 503,
            Self::Timeout(_) => 504,
            Self::ProtocolViolation(_) => 502,
            Self::Service { status_code, .. } => *status_code,
            Self::Failed(_) => 500,
        }
    }
}

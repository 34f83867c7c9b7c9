use async_trait::async_trait;

use crate::domain::{LlmCallConfig, VisionMessage};

/// Chat-completion call against a vision-capable model. Returns the raw text
/// of the first choice.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        config: &LlmCallConfig,
        messages: &[VisionMessage],
    ) -> Result<String, LlmClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmClientError {
    #[error("api request failed: {message}")]
    ApiRequestFailed {
        message: String,
        status: Option<u16>,
    },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiRequestFailed { status, .. } => *status,
            Self::RateLimited => Some(429),
            Self::InvalidResponse(_) => None,
        }
    }
}

use async_trait::async_trait;

use crate::domain::AdapterConfig;

/// Resolves a stored, decrypted adapter configuration by instance id.
#[async_trait]
pub trait AdapterConfigProvider: Send + Sync {
    async fn get_adapter_config(&self, instance_id: &str)
    -> Result<AdapterConfig, AdapterConfigError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AdapterConfigError {
    #[error("adapter instance not found: {0}")]
    NotFound(String),
    #[error("adapter config request failed: {0}")]
    RequestFailed(String),
    #[error("invalid adapter config: {0}")]
    Invalid(String),
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{
    AdapterConfigError, AdapterConfigProvider, ExtractorError, ExtractorResolver, LlmClient,
    PageRasterizer, TextExtractor,
};
use crate::domain::AdapterConfig;

use super::azure_doc_intel_ocr_adapter::{AZURE_DOC_INTEL_ID, AzureDocIntelOcrAdapter};
use super::llm_whisperer_adapter::{LLM_WHISPERER_ID, LlmWhispererAdapter};
use super::native_pdf_adapter::{NATIVE_PDF_ID, NativePdfAdapter};
use super::vlm_ocr_adapter::{VLM_OCR_ID, VlmOcrAdapter};
use super::whisperer_client::RetryPolicy;

/// Shared collaborators handed to adapters at construction.
#[derive(Clone)]
pub struct AdapterDependencies {
    pub retry: RetryPolicy,
    pub poll_interval: Duration,
    pub rasterizer: Arc<dyn PageRasterizer>,
    pub llm: Arc<dyn LlmClient>,
    pub render_dpi: f32,
}

/// Builds the concrete adapter for an instance id from its stored config.
pub struct AdapterRegistry {
    configs: Arc<dyn AdapterConfigProvider>,
    deps: AdapterDependencies,
}

impl AdapterRegistry {
    pub fn new(configs: Arc<dyn AdapterConfigProvider>, deps: AdapterDependencies) -> Self {
        Self { configs, deps }
    }

    pub fn create(&self, config: &AdapterConfig) -> Result<Arc<dyn TextExtractor>, ExtractorError> {
        match config.adapter_id.as_str() {
            LLM_WHISPERER_ID => Ok(Arc::new(LlmWhispererAdapter::from_config(
                config,
                self.deps.retry,
                self.deps.poll_interval,
            )?)),
            NATIVE_PDF_ID => Ok(Arc::new(NativePdfAdapter::new())),
            AZURE_DOC_INTEL_ID => Ok(Arc::new(AzureDocIntelOcrAdapter::from_config(config)?)),
            VLM_OCR_ID => Ok(Arc::new(VlmOcrAdapter::from_config(
                config,
                Arc::clone(&self.deps.rasterizer),
                Arc::clone(&self.deps.llm),
                self.deps.render_dpi,
            )?)),
            other => Err(ExtractorError::InvalidConfig(format!(
                "Unknown adapter id '{other}'"
            ))),
        }
    }
}

#[async_trait]
impl ExtractorResolver for AdapterRegistry {
    async fn resolve(&self, instance_id: &str) -> Result<Arc<dyn TextExtractor>, ExtractorError> {
        let config = self
            .configs
            .get_adapter_config(instance_id)
            .await
            .map_err(|e| match e {
                AdapterConfigError::NotFound(_) | AdapterConfigError::Invalid(_) => {
                    ExtractorError::InvalidConfig(e.to_string())
                }
                AdapterConfigError::RequestFailed(_) => ExtractorError::Failed(e.to_string()),
            })?;

        tracing::debug!(instance_id, adapter_id = %config.adapter_id, "Resolved adapter instance");
        self.create(&config)
    }
}

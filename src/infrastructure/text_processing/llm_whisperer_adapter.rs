use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::application::ports::{ExtractorError, FileStorage, ProcessOptions, TextExtractor};
use crate::domain::{AdapterConfig, ExtractionResult, StoragePath};

use super::whisperer_client::{LINE_METADATA_KEY, RetryPolicy, WhispererClient};
use super::whisperer_params::{WhispererRequestParams, WhispererSettings};
use super::whisperer_transport::HttpWhisperTransport;

pub const LLM_WHISPERER_ID: &str = "llmwhisperer|v2";

pub const LLM_WHISPERER_GUIDANCE: &str = "Ensure the LLMWhisperer V2 adapter URL is reachable \
from this service, the API key is set, and the service returns result_text.";

/// Remote layout-preserving extraction through LLMWhisperer v2.
pub struct LlmWhispererAdapter {
    client: WhispererClient,
}

impl LlmWhispererAdapter {
    pub fn new(client: WhispererClient) -> Self {
        Self { client }
    }

    pub fn from_config(
        config: &AdapterConfig,
        retry: RetryPolicy,
        poll_interval: Duration,
    ) -> Result<Self, ExtractorError> {
        let settings: WhispererSettings = config.parse().map_err(|e| {
            ExtractorError::InvalidConfig(format!("Invalid LLMWhisperer settings: {e}"))
        })?;
        if settings.url.trim().is_empty() {
            return Err(ExtractorError::InvalidConfig(
                "LLMWhisperer 'url' is required".to_string(),
            ));
        }
        if settings.unstract_key.trim().is_empty() {
            return Err(ExtractorError::InvalidConfig(
                "LLMWhisperer 'unstract_key' is required".to_string(),
            ));
        }

        let transport =
            HttpWhisperTransport::new(&settings.url, &settings.unstract_key, poll_interval)
                .map_err(|e| ExtractorError::InvalidConfig(e.to_string()))?;

        Ok(Self::new(WhispererClient::new(
            Arc::new(transport),
            settings,
            retry,
        )))
    }
}

#[async_trait]
impl TextExtractor for LlmWhispererAdapter {
    fn id(&self) -> &'static str {
        LLM_WHISPERER_ID
    }

    fn name(&self) -> &'static str {
        "LLMWhisperer V2"
    }

    fn supports_highlight(&self) -> bool {
        true
    }

    fn failure_guidance(&self) -> Option<&'static str> {
        Some(LLM_WHISPERER_GUIDANCE)
    }

    #[tracing::instrument(
        skip(self, options, storage),
        fields(adapter = LLM_WHISPERER_ID, input = %input, highlight = options.enable_highlight)
    )]
    async fn process(
        &self,
        input: &StoragePath,
        output: Option<&StoragePath>,
        options: &ProcessOptions,
        storage: &dyn FileStorage,
    ) -> Result<ExtractionResult, ExtractorError> {
        let params = WhispererRequestParams::from(options);
        let payload = self.client.send_request(input, &params, storage).await?;

        let text = self
            .client
            .extract_text_from_response(&payload, output, storage)
            .await?;

        let hash = payload
            .get("whisper_hash")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        tracing::info!(chars = text.chars().count(), whisper_hash = %hash, "LLMWhisperer extraction complete");

        Ok(ExtractionResult::text(text)
            .with_content_hash(hash)
            .with_line_metadata(payload.get(LINE_METADATA_KEY).cloned()))
    }

    async fn test_connection(&self) -> Result<bool, ExtractorError> {
        self.client.test_connection().await
    }
}

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde::Deserialize;

use crate::application::ports::{ExtractorError, FileStorage, ProcessOptions, TextExtractor};
use crate::domain::{AdapterConfig, ExtractionResult, StoragePath};

use super::text_sanitizer::sanitize_page_text;

pub const AZURE_DOC_INTEL_ID: &str = "azure|document_intelligence";
pub const POLL_TIMEOUT: Duration = Duration::from_secs(300);
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(2);
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);
pub const API_VERSION: &str = "2024-11-30";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

#[derive(Debug, Deserialize)]
struct AzureOcrSettings {
    endpoint: String,
    api_key: String,
    #[serde(default = "default_model")]
    model: String,
}

fn default_model() -> String {
    "prebuilt-read".to_string()
}

/// OCR through Azure Document Intelligence: submit, then poll the
/// Operation-Location until the analysis settles.
pub struct AzureDocIntelOcrAdapter {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl AzureDocIntelOcrAdapter {
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Result<Self, ExtractorError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExtractorError::InvalidConfig(format!("http client build: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    pub fn from_config(config: &AdapterConfig) -> Result<Self, ExtractorError> {
        let settings: AzureOcrSettings = config.parse().map_err(|e| {
            ExtractorError::InvalidConfig(format!("Invalid Azure Document Intelligence settings: {e}"))
        })?;
        if settings.endpoint.trim().is_empty() || settings.api_key.trim().is_empty() {
            return Err(ExtractorError::InvalidConfig(
                "Azure Document Intelligence requires 'endpoint' and 'api_key'".to_string(),
            ));
        }
        Self::new(&settings.endpoint, &settings.api_key, &settings.model)
    }

    async fn submit(&self, data: &[u8]) -> Result<String, ExtractorError> {
        let body = serde_json::json!({ "base64Source": general_purpose::STANDARD.encode(data) });

        let url = format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}",
            self.endpoint, self.model, API_VERSION
        );

        let response = self
            .client
            .post(&url)
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error("Azure submit failed", e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(ExtractorError::Service {
                message: format!("Azure submit returned {status}: {text}"),
                status_code: status,
            });
        }

        let operation_url = response
            .headers()
            .get("Operation-Location")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ExtractorError::ProtocolViolation(
                    "Azure response missing Operation-Location header".to_string(),
                )
            })?
            .to_string();

        Ok(operation_url)
    }

    async fn poll_until_complete(&self, operation_url: &str) -> Result<String, ExtractorError> {
        let poll_future = async {
            let mut backoff = INITIAL_BACKOFF;

            loop {
                let response = self
                    .client
                    .get(operation_url)
                    .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
                    .send()
                    .await
                    .map_err(|e| request_error("Azure poll request failed", e))?;

                if response.status().as_u16() == 429 {
                    let retry_after = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(backoff.as_secs());
                    tokio::time::sleep(Duration::from_secs(retry_after)).await;
                    continue;
                }

                if !response.status().is_success() {
                    let status = response.status().as_u16();
                    let text = response.text().await.unwrap_or_default();
                    return Err(ExtractorError::Service {
                        message: format!("Azure poll returned {status}: {text}"),
                        status_code: status,
                    });
                }

                let result: AnalyzeResponse = response.json().await.map_err(|e| {
                    ExtractorError::ProtocolViolation(format!("Azure response parse failed: {e}"))
                })?;

                match result.status.as_str() {
                    "succeeded" => {
                        return Ok(result.analyze_result.map(|r| r.content).unwrap_or_default());
                    }
                    "failed" => {
                        return Err(ExtractorError::Failed(
                            "Azure Document Intelligence analysis failed".to_string(),
                        ));
                    }
                    _ => {
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            }
        };

        tokio::time::timeout(POLL_TIMEOUT, poll_future)
            .await
            .map_err(|_| {
                ExtractorError::Timeout(format!(
                    "Azure Document Intelligence polling timed out after {}s",
                    POLL_TIMEOUT.as_secs()
                ))
            })?
    }
}

#[async_trait]
impl TextExtractor for AzureDocIntelOcrAdapter {
    fn id(&self) -> &'static str {
        AZURE_DOC_INTEL_ID
    }

    fn name(&self) -> &'static str {
        "Azure Document Intelligence"
    }

    #[tracing::instrument(
        skip(self, _options, storage),
        fields(adapter = AZURE_DOC_INTEL_ID, model = %self.model, input = %input)
    )]
    async fn process(
        &self,
        input: &StoragePath,
        output: Option<&StoragePath>,
        _options: &ProcessOptions,
        storage: &dyn FileStorage,
    ) -> Result<ExtractionResult, ExtractorError> {
        let data = storage
            .read(input)
            .await
            .map_err(|e| ExtractorError::FileRead(format!("Failed to read input file: {e}")))?;

        let operation_url = self.submit(&data).await?;
        let content = sanitize_page_text(&self.poll_until_complete(&operation_url).await?);

        tracing::info!(chars = content.chars().count(), "Azure OCR complete");

        if let Some(output) = output {
            storage
                .write_text(output, &content)
                .await
                .map_err(|e| ExtractorError::Failed(format!("Failed to write output: {e}")))?;
        }

        Ok(ExtractionResult::text(content))
    }

    async fn test_connection(&self) -> Result<bool, ExtractorError> {
        let url = format!(
            "{}/documentintelligence/info?api-version={}",
            self.endpoint, API_VERSION
        );
        let response = self
            .client
            .get(&url)
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| request_error("Azure connection test failed", e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(ExtractorError::Service {
                message: format!("Azure connection test returned {status}"),
                status_code: status,
            });
        }
        Ok(true)
    }
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    status: String,
    #[serde(rename = "analyzeResult")]
    analyze_result: Option<AnalyzeResult>,
}

#[derive(Deserialize)]
struct AnalyzeResult {
    content: String,
}

fn request_error(context: &str, err: reqwest::Error) -> ExtractorError {
    if err.is_timeout() {
        ExtractorError::Timeout(format!("{context}: {err}"))
    } else if err.is_connect() {
        ExtractorError::Unreachable(format!("{context}: {err}"))
    } else {
        ExtractorError::Failed(format!("{context}: {err}"))
    }
}

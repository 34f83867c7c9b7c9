use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use super::whisperer_params::{WhispererRequestParams, WhispererSettings, build_whisper_query};
use super::whisperer_transport::{WhisperTransport, WhisperTransportError};
use crate::application::ports::{ExtractorError, FileStorage, FileStorageError};
use crate::application::services::{RESULT_TEXT_KEY, write_extraction_output};
use crate::domain::StoragePath;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(5);
pub const LINE_METADATA_KEY: &str = "line_metadata";

const UNREACHABLE_GUIDANCE: &str = "Unable to connect to LLMWhisperer service. Please check the \
service URL is reachable and the API key is valid.";
const TIMEOUT_GUIDANCE: &str = "Request to LLMWhisperer service timed out. Please check the \
service URL is reachable and the API key is valid.";
const MISSING_RESULT_TEXT: &str = "LLMWhisperer response is missing 'result_text'. The service \
is reachable but returned an unexpected payload; check the service version and API key.";

/// Linear backoff over a bounded number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

impl RetryPolicy {
    /// Sleep after the failed `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base * attempt
    }

    /// Worst-case time spent sleeping when every attempt fails.
    pub fn total_backoff(&self) -> Duration {
        (1..self.max_attempts.max(1)).map(|a| self.delay_for(a)).sum()
    }
}

/// Synchronous (wait-for-completion) client for the remote layout service,
/// with retries on transient transport faults only.
pub struct WhispererClient {
    transport: Arc<dyn WhisperTransport>,
    settings: WhispererSettings,
    retry: RetryPolicy,
}

impl WhispererClient {
    pub fn new(
        transport: Arc<dyn WhisperTransport>,
        settings: WhispererSettings,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            settings,
            retry,
        }
    }

    /// Run one extraction and return the raw payload: the service extraction
    /// plus `whisper_hash`, and `line_metadata` when highlights were asked for.
    #[tracing::instrument(skip_all, fields(input = %input, mode = self.settings.mode.as_str()))]
    pub async fn send_request(
        &self,
        input: &StoragePath,
        params: &WhispererRequestParams,
        storage: &dyn FileStorage,
    ) -> Result<Map<String, Value>, ExtractorError> {
        let query = build_whisper_query(&self.settings, params);
        let document = storage.read(input).await.map_err(read_error)?;

        let response = self
            .with_retry("sending document", || self.transport.whisper(&query, document.clone()))
            .await?;

        if response.status_code != 200 {
            let message = if response.whisper_hash.is_empty() {
                response.message
            } else {
                format!("{}. Whisper hash: {}", response.message, response.whisper_hash)
            };
            tracing::error!(
                status_code = response.status_code,
                error = %message,
                "LLMWhisperer reported failure"
            );
            return Err(ExtractorError::Service {
                message,
                status_code: response.status_code,
            });
        }

        let mut payload = response.extraction.unwrap_or_default();
        payload.insert(
            "whisper_hash".to_string(),
            Value::String(response.whisper_hash.clone()),
        );

        if params.enable_highlight {
            let highlights = self
                .with_retry("fetching highlight data", || {
                    self.transport.highlights(&response.whisper_hash, true)
                })
                .await?;
            payload.insert(LINE_METADATA_KEY.to_string(), highlights);
        }

        Ok(payload)
    }

    /// Pull `result_text` out of a payload, writing it (and the sidecar) to
    /// `output` when given.
    pub async fn extract_text_from_response(
        &self,
        payload: &Map<String, Value>,
        output: Option<&StoragePath>,
        storage: &dyn FileStorage,
    ) -> Result<String, ExtractorError> {
        let text = payload
            .get(RESULT_TEXT_KEY)
            .ok_or_else(|| ExtractorError::ProtocolViolation(MISSING_RESULT_TEXT.to_string()))?;
        let text = match text {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };

        if let Some(output) = output {
            write_extraction_output(storage, output, payload)
                .await
                .map_err(|e| ExtractorError::Failed(format!("Failed to write output: {e}")))?;
        }

        Ok(text)
    }

    pub async fn test_connection(&self) -> Result<bool, ExtractorError> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| transport_error(e, "testing connection"))?;
        Ok(true)
    }

    /// Run `call` until it succeeds, fails for good, or runs out of
    /// attempts. Only transient transport faults are retried.
    async fn with_retry<T, F, Fut>(&self, action: &str, mut call: F) -> Result<T, ExtractorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, WhisperTransportError>>,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        action,
                        delay_secs = delay.as_secs_f64(),
                        error = %e,
                        "LLMWhisperer request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        tracing::error!(
                            attempts = attempt,
                            action,
                            error = %e,
                            "LLMWhisperer retries exhausted"
                        );
                    }
                    return Err(transport_error(e, action));
                }
            }
        }
    }
}

fn transport_error(err: WhisperTransportError, action: &str) -> ExtractorError {
    match err {
        WhisperTransportError::Connect(detail) => {
            ExtractorError::Unreachable(format!("{UNREACHABLE_GUIDANCE} Error: {detail}"))
        }
        WhisperTransportError::Timeout(detail) => {
            ExtractorError::Timeout(format!("{TIMEOUT_GUIDANCE} Error: {detail}"))
        }
        WhisperTransportError::Http { status, message } => ExtractorError::Service {
            message: format!("LLMWhisperer error while {action}: {message}"),
            status_code: status,
        },
        WhisperTransportError::Decode(detail) => ExtractorError::ProtocolViolation(format!(
            "LLMWhisperer returned a malformed response while {action}: {detail}"
        )),
    }
}

fn read_error(err: FileStorageError) -> ExtractorError {
    ExtractorError::FileRead(format!("Failed to read input file: {err}"))
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::time::Instant;

use super::whisperer_params::WhisperQuery;

pub const UNSTRACT_KEY_HEADER: &str = "unstract-key";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);
const STATUS_TIMEOUT: Duration = Duration::from_secs(60);

/// Result envelope of one whisper operation.
#[derive(Debug, Clone, PartialEq)]
pub struct WhisperResponse {
    pub status_code: u16,
    pub message: String,
    pub extraction: Option<Map<String, Value>>,
    pub whisper_hash: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WhisperTransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

impl WhisperTransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Timeout(_))
    }
}

/// Wire protocol of the remote layout-extraction service.
#[async_trait]
pub trait WhisperTransport: Send + Sync {
    async fn whisper(
        &self,
        query: &WhisperQuery,
        document: Vec<u8>,
    ) -> Result<WhisperResponse, WhisperTransportError>;

    async fn highlights(
        &self,
        whisper_hash: &str,
        extract_all_lines: bool,
    ) -> Result<Value, WhisperTransportError>;

    async fn test_connection(&self) -> Result<(), WhisperTransportError>;
}

/// LLMWhisperer v2 over HTTP. `whisper` always polls the status endpoint until
/// the extraction is processed or the query's `wait_timeout` runs out, so a
/// caller only ever sees a terminal envelope.
pub struct HttpWhisperTransport {
    client: Client,
    base_url: String,
    api_key: String,
    poll_interval: Duration,
}

impl HttpWhisperTransport {
    pub fn new(
        service_url: &str,
        api_key: &str,
        poll_interval: Duration,
    ) -> Result<Self, WhisperTransportError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| WhisperTransportError::Connect(format!("http client build: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("{}/api/v2", service_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            poll_interval,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn get_json(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, WhisperTransportError> {
        let response = self
            .client
            .get(self.url(endpoint))
            .header(UNSTRACT_KEY_HEADER, &self.api_key)
            .header("accept", "application/json")
            .query(query)
            .timeout(STATUS_TIMEOUT)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        response.json::<Value>().await.map_err(map_reqwest_error)
    }

    async fn wait_for_result(
        &self,
        whisper_hash: &str,
        wait_timeout: Duration,
    ) -> Result<WhisperResponse, WhisperTransportError> {
        let deadline = Instant::now() + wait_timeout;

        loop {
            let status: StatusPayload = serde_json::from_value(
                self.get_json("whisper-status", &[("whisper_hash", whisper_hash)])
                    .await?,
            )
            .map_err(|e| WhisperTransportError::Decode(format!("whisper-status: {e}")))?;

            match status.status.as_str() {
                "processed" => {
                    let retrieved = self
                        .get_json(
                            "whisper-retrieve",
                            &[("whisper_hash", whisper_hash), ("text_only", "false")],
                        )
                        .await?;
                    let Value::Object(extraction) = retrieved else {
                        return Err(WhisperTransportError::Decode(
                            "whisper-retrieve did not return a JSON object".to_string(),
                        ));
                    };
                    return Ok(WhisperResponse {
                        status_code: 200,
                        message: "Whisper operation completed".to_string(),
                        extraction: Some(extraction),
                        whisper_hash: whisper_hash.to_string(),
                    });
                }
                "error" => {
                    return Ok(WhisperResponse {
                        status_code: 500,
                        message: status
                            .message
                            .unwrap_or_else(|| "Whisper operation failed".to_string()),
                        extraction: None,
                        whisper_hash: whisper_hash.to_string(),
                    });
                }
                other => {
                    tracing::debug!(whisper_hash, status = other, "Whisper still processing");
                }
            }

            if Instant::now() >= deadline {
                return Ok(WhisperResponse {
                    status_code: 504,
                    message: format!(
                        "Whisper operation did not complete within {}s",
                        wait_timeout.as_secs()
                    ),
                    extraction: None,
                    whisper_hash: whisper_hash.to_string(),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[derive(Deserialize)]
struct SubmitPayload {
    #[serde(default)]
    whisper_hash: String,
}

#[derive(Deserialize)]
struct StatusPayload {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl WhisperTransport for HttpWhisperTransport {
    async fn whisper(
        &self,
        query: &WhisperQuery,
        document: Vec<u8>,
    ) -> Result<WhisperResponse, WhisperTransportError> {
        let response = self
            .client
            .post(self.url("whisper"))
            .header(UNSTRACT_KEY_HEADER, &self.api_key)
            .header("Content-Type", "application/octet-stream")
            .query(query.pairs())
            .body(document)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if response.status().as_u16() != 202 {
            return Err(http_error(response).await);
        }

        let submitted: SubmitPayload = response.json().await.map_err(map_reqwest_error)?;
        if submitted.whisper_hash.is_empty() {
            return Err(WhisperTransportError::Decode(
                "whisper response missing whisper_hash".to_string(),
            ));
        }
        tracing::info!(whisper_hash = %submitted.whisper_hash, "LLMWhisperer accepted document");

        let wait_timeout = Duration::from_secs(query.wait_timeout_secs());
        self.wait_for_result(&submitted.whisper_hash, wait_timeout)
            .await
    }

    async fn highlights(
        &self,
        whisper_hash: &str,
        extract_all_lines: bool,
    ) -> Result<Value, WhisperTransportError> {
        let all_lines = extract_all_lines.to_string();
        self.get_json(
            "highlights",
            &[
                ("whisper_hash", whisper_hash),
                ("lines", ""),
                ("extract_all_lines", all_lines.as_str()),
            ],
        )
        .await
    }

    async fn test_connection(&self) -> Result<(), WhisperTransportError> {
        self.get_json("test-connection", &[]).await.map(|_| ())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> WhisperTransportError {
    if err.is_timeout() {
        WhisperTransportError::Timeout(err.to_string())
    } else if err.is_connect() {
        WhisperTransportError::Connect(err.to_string())
    } else if err.is_decode() {
        WhisperTransportError::Decode(err.to_string())
    } else if let Some(status) = err.status() {
        WhisperTransportError::Http {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else {
        WhisperTransportError::Connect(err.to_string())
    }
}

async fn http_error(response: Response) -> WhisperTransportError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);

    WhisperTransportError::Http { status, message }
}

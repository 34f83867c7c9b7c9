use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::application::ports::{LlmClient, LlmClientError};
use crate::domain::{LlmCallConfig, VisionMessage};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// OpenAI-compatible chat completions (OpenAI, LM Studio, vLLM, LiteLLM
/// proxies). The call config's provider options are merged into the body.
pub struct OpenAiVisionClient {
    client: Client,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiVisionClient {
    pub fn new() -> Result<Self, LlmClientError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmClientError::ApiRequestFailed {
                message: format!("http client build: {e}"),
                status: None,
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// Provider options first, then `model` and `messages`, which always win.
pub fn build_request_body(
    config: &LlmCallConfig,
    messages: &[VisionMessage],
) -> Result<Value, LlmClientError> {
    let mut body: Map<String, Value> = config.extra.clone();
    body.insert("model".to_string(), Value::String(config.model.clone()));
    let messages = serde_json::to_value(messages)
        .map_err(|e| LlmClientError::InvalidResponse(format!("serialize messages: {e}")))?;
    body.insert("messages".to_string(), messages);
    body.insert("stream".to_string(), Value::Bool(false));
    Ok(Value::Object(body))
}

#[async_trait]
impl LlmClient for OpenAiVisionClient {
    #[tracing::instrument(skip_all, fields(model = %config.model, messages = messages.len()))]
    async fn complete(
        &self,
        config: &LlmCallConfig,
        messages: &[VisionMessage],
    ) -> Result<String, LlmClientError> {
        let base_url = config
            .api_base
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/');
        let body = build_request_body(config, messages)?;

        let mut request = self
            .client
            .post(format!("{base_url}/chat/completions"))
            .json(&body);
        if let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmClientError::ApiRequestFailed {
                message: e.to_string(),
                status: e.status().map(|s| s.as_u16()),
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmClientError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmClientError::ApiRequestFailed {
                message: format!("HTTP {status}: {text}"),
                status: Some(status.as_u16()),
            });
        }

        let raw_bytes = response
            .bytes()
            .await
            .map_err(|e| LlmClientError::InvalidResponse(e.to_string()))?;

        let completion: ChatCompletionResponse =
            serde_json::from_slice(&raw_bytes).map_err(|e| {
                tracing::error!(
                    raw_response = %String::from_utf8_lossy(&raw_bytes),
                    "Failed to parse chat completion JSON"
                );
                LlmClientError::InvalidResponse(e.to_string())
            })?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| LlmClientError::InvalidResponse("no choices in response".to_string()))
    }
}

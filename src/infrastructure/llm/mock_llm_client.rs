use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::application::ports::{LlmClient, LlmClientError};
use crate::domain::{LlmCallConfig, VisionMessage};

/// Replays a fixed response and records what it was sent.
pub struct MockLlmClient {
    response: Result<String, (String, Option<u16>)>,
    calls: AtomicUsize,
    last_messages: Mutex<Vec<VisionMessage>>,
}

impl MockLlmClient {
    pub fn returning(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            response: Err((message.into(), status)),
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<VisionMessage> {
        self.last_messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        _config: &LlmCallConfig,
        messages: &[VisionMessage],
    ) -> Result<String, LlmClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_messages.lock() {
            *last = messages.to_vec();
        }

        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err((message, status)) => Err(LlmClientError::ApiRequestFailed {
                message: message.clone(),
                status: *status,
            }),
        }
    }
}

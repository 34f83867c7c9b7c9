use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use parseris::application::ports::{ExtractorError, ProcessOptions, TextExtractor};
use parseris::application::services::ExtractionError;
use parseris::domain::StoragePath;
use parseris::infrastructure::storage::MemoryFileStorage;
use parseris::infrastructure::text_processing::{
    LlmWhispererAdapter, RetryPolicy, WhisperQuery, WhisperResponse, WhisperTransport,
    WhisperTransportError, WhispererClient, WhispererRequestParams, WhispererSettings,
};
use serde_json::{Map, Value, json};

const BASE: Duration = Duration::from_secs(5);

type Scripted = Result<WhisperResponse, WhisperTransportError>;

struct ScriptedTransport {
    responses: Mutex<VecDeque<Scripted>>,
    highlight_failures: Mutex<VecDeque<WhisperTransportError>>,
    whisper_calls: AtomicUsize,
    highlight_calls: AtomicUsize,
}

impl ScriptedTransport {
    fn new(responses: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            highlight_failures: Mutex::new(VecDeque::new()),
            whisper_calls: AtomicUsize::new(0),
            highlight_calls: AtomicUsize::new(0),
        })
    }

    fn with_highlight_failures(responses: Vec<Scripted>, failures: Vec<WhisperTransportError>) -> Arc<Self> {
        let transport = Self::new(responses);
        *transport.highlight_failures.lock().unwrap() = failures.into();
        transport
    }

    fn whisper_calls(&self) -> usize {
        self.whisper_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WhisperTransport for ScriptedTransport {
    async fn whisper(
        &self,
        _query: &WhisperQuery,
        _document: Vec<u8>,
    ) -> Result<WhisperResponse, WhisperTransportError> {
        self.whisper_calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("transport called more often than scripted")
    }

    async fn highlights(
        &self,
        whisper_hash: &str,
        extract_all_lines: bool,
    ) -> Result<Value, WhisperTransportError> {
        self.highlight_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.highlight_failures.lock().unwrap().pop_front() {
            return Err(failure);
        }
        Ok(json!({ "1": { "hash": whisper_hash, "all": extract_all_lines } }))
    }

    async fn test_connection(&self) -> Result<(), WhisperTransportError> {
        Ok(())
    }
}

fn processed(text: &str) -> Scripted {
    let mut extraction = Map::new();
    extraction.insert("result_text".to_string(), Value::String(text.to_string()));
    Ok(WhisperResponse {
        status_code: 200,
        message: "Whisper operation completed".to_string(),
        extraction: Some(extraction),
        whisper_hash: "hash-123".to_string(),
    })
}

fn client(transport: Arc<ScriptedTransport>) -> WhispererClient {
    WhispererClient::new(
        transport,
        WhispererSettings::default(),
        RetryPolicy {
            max_attempts: 3,
            backoff_base: BASE,
        },
    )
}

async fn storage() -> MemoryFileStorage {
    MemoryFileStorage::new()
        .with_file("in/doc.pdf", b"%PDF-1.7".to_vec())
        .await
}

#[test]
fn given_linear_policy_when_computing_delays_then_they_grow_by_the_base() {
    let policy = RetryPolicy {
        max_attempts: 3,
        backoff_base: BASE,
    };

    assert_eq!(policy.delay_for(1), Duration::from_secs(5));
    assert_eq!(policy.delay_for(2), Duration::from_secs(10));
    assert_eq!(policy.total_backoff(), Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn given_two_connect_failures_when_sending_then_third_attempt_succeeds_after_linear_backoff() {
    let transport = ScriptedTransport::new(vec![
        Err(WhisperTransportError::Connect("refused".to_string())),
        Err(WhisperTransportError::Connect("refused".to_string())),
        processed("hello"),
    ]);
    let storage = storage().await;
    let start = tokio::time::Instant::now();

    let payload = client(Arc::clone(&transport))
        .send_request(
            &StoragePath::new("in/doc.pdf"),
            &WhispererRequestParams::default(),
            &storage,
        )
        .await
        .unwrap();

    assert_eq!(transport.whisper_calls(), 3);
    assert!(start.elapsed() >= BASE * 3);
    assert_eq!(payload["result_text"], "hello");
    assert_eq!(payload["whisper_hash"], "hash-123");
}

#[tokio::test(start_paused = true)]
async fn given_persistent_connect_failures_when_sending_then_unreachable_after_three_attempts() {
    let transport = ScriptedTransport::new(vec![
        Err(WhisperTransportError::Connect("refused".to_string())),
        Err(WhisperTransportError::Connect("refused".to_string())),
        Err(WhisperTransportError::Connect("refused".to_string())),
    ]);
    let storage = storage().await;

    let err = client(Arc::clone(&transport))
        .send_request(
            &StoragePath::new("in/doc.pdf"),
            &WhispererRequestParams::default(),
            &storage,
        )
        .await
        .unwrap_err();

    assert_eq!(transport.whisper_calls(), 3);
    assert!(matches!(err, ExtractorError::Unreachable(_)));
    assert_eq!(err.status_code(), 503);
    assert!(err.to_string().contains("Unable to connect to LLMWhisperer"));
}

#[tokio::test(start_paused = true)]
async fn given_persistent_timeouts_when_sending_then_timeout_error() {
    let transport = ScriptedTransport::new(vec![
        Err(WhisperTransportError::Timeout("deadline".to_string())),
        Err(WhisperTransportError::Timeout("deadline".to_string())),
        Err(WhisperTransportError::Timeout("deadline".to_string())),
    ]);
    let storage = storage().await;

    let err = client(Arc::clone(&transport))
        .send_request(
            &StoragePath::new("in/doc.pdf"),
            &WhispererRequestParams::default(),
            &storage,
        )
        .await
        .unwrap_err();

    assert_eq!(transport.whisper_calls(), 3);
    assert_eq!(err.status_code(), 504);
}

#[tokio::test]
async fn given_http_error_when_sending_then_no_retry_and_status_is_kept() {
    let transport = ScriptedTransport::new(vec![Err(WhisperTransportError::Http {
        status: 401,
        message: "Invalid key".to_string(),
    })]);
    let storage = storage().await;

    let err = client(Arc::clone(&transport))
        .send_request(
            &StoragePath::new("in/doc.pdf"),
            &WhispererRequestParams::default(),
            &storage,
        )
        .await
        .unwrap_err();

    assert_eq!(transport.whisper_calls(), 1);
    assert_eq!(err.status_code(), 401);
    assert!(err.to_string().contains("Invalid key"));
}

#[tokio::test]
async fn given_failed_envelope_when_sending_then_message_carries_whisper_hash() {
    let transport = ScriptedTransport::new(vec![Ok(WhisperResponse {
        status_code: 500,
        message: "OCR engine crashed".to_string(),
        extraction: None,
        whisper_hash: "abc".to_string(),
    })]);
    let storage = storage().await;

    let err = client(transport)
        .send_request(
            &StoragePath::new("in/doc.pdf"),
            &WhispererRequestParams::default(),
            &storage,
        )
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 500);
    assert_eq!(err.to_string(), "OCR engine crashed. Whisper hash: abc");
}

#[tokio::test]
async fn given_non_terminal_envelope_when_sending_then_error_surfaces_as_500() {
    let transport = ScriptedTransport::new(vec![Ok(WhisperResponse {
        status_code: 202,
        message: "Whisper operation accepted".to_string(),
        extraction: None,
        whisper_hash: "abc".to_string(),
    })]);
    let storage = storage().await;

    let err = client(transport)
        .send_request(
            &StoragePath::new("in/doc.pdf"),
            &WhispererRequestParams::default(),
            &storage,
        )
        .await
        .unwrap_err();
    let surfaced = ExtractionError::from_adapter("LLMWhisperer V2", err);

    assert_eq!(surfaced.status_code(), 500);
    assert!(surfaced.to_string().contains("Whisper hash: abc"));
}

#[tokio::test]
async fn given_missing_input_file_when_sending_then_read_error_without_calling_service() {
    let transport = ScriptedTransport::new(vec![]);

    let err = client(Arc::clone(&transport))
        .send_request(
            &StoragePath::new("in/missing.pdf"),
            &WhispererRequestParams::default(),
            &MemoryFileStorage::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractorError::FileRead(_)));
    assert_eq!(transport.whisper_calls(), 0);
}

#[tokio::test]
async fn given_highlight_requested_when_sending_then_line_metadata_is_attached() {
    let transport = ScriptedTransport::new(vec![processed("hello")]);
    let storage = storage().await;
    let params = WhispererRequestParams {
        enable_highlight: true,
        tag: None,
    };

    let payload = client(Arc::clone(&transport))
        .send_request(&StoragePath::new("in/doc.pdf"), &params, &storage)
        .await
        .unwrap();

    assert_eq!(transport.highlight_calls.load(Ordering::SeqCst), 1);
    assert_eq!(payload["line_metadata"]["1"]["hash"], "hash-123");
    assert_eq!(payload["line_metadata"]["1"]["all"], true);
}

#[tokio::test(start_paused = true)]
async fn given_transient_highlight_failure_when_sending_then_highlight_fetch_is_retried() {
    let transport = ScriptedTransport::with_highlight_failures(
        vec![processed("hello")],
        vec![WhisperTransportError::Connect("reset".to_string())],
    );
    let storage = storage().await;
    let params = WhispererRequestParams {
        enable_highlight: true,
        tag: None,
    };
    let start = tokio::time::Instant::now();

    let payload = client(Arc::clone(&transport))
        .send_request(&StoragePath::new("in/doc.pdf"), &params, &storage)
        .await
        .unwrap();

    assert_eq!(transport.whisper_calls(), 1);
    assert_eq!(transport.highlight_calls.load(Ordering::SeqCst), 2);
    assert!(start.elapsed() >= BASE);
    assert_eq!(payload["line_metadata"]["1"]["hash"], "hash-123");
}

#[tokio::test(start_paused = true)]
async fn given_persistent_highlight_timeouts_when_sending_then_timeout_after_all_attempts() {
    let transport = ScriptedTransport::with_highlight_failures(
        vec![processed("hello")],
        (0..3)
            .map(|_| WhisperTransportError::Timeout("deadline".to_string()))
            .collect(),
    );
    let storage = storage().await;
    let params = WhispererRequestParams {
        enable_highlight: true,
        tag: None,
    };

    let err = client(Arc::clone(&transport))
        .send_request(&StoragePath::new("in/doc.pdf"), &params, &storage)
        .await
        .unwrap_err();

    assert_eq!(transport.highlight_calls.load(Ordering::SeqCst), 3);
    assert_eq!(err.status_code(), 504);
}

#[tokio::test]
async fn given_highlight_http_error_when_sending_then_not_retried() {
    let transport = ScriptedTransport::with_highlight_failures(
        vec![processed("hello")],
        vec![WhisperTransportError::Http {
            status: 404,
            message: "unknown hash".to_string(),
        }],
    );
    let storage = storage().await;
    let params = WhispererRequestParams {
        enable_highlight: true,
        tag: None,
    };

    let err = client(Arc::clone(&transport))
        .send_request(&StoragePath::new("in/doc.pdf"), &params, &storage)
        .await
        .unwrap_err();

    assert_eq!(transport.highlight_calls.load(Ordering::SeqCst), 1);
    assert_eq!(err.status_code(), 404);
    assert!(err.to_string().contains("fetching highlight data"));
}

#[tokio::test]
async fn given_payload_without_result_text_when_extracting_then_protocol_violation() {
    let transport = ScriptedTransport::new(vec![]);
    let mut payload = Map::new();
    payload.insert("whisper_hash".to_string(), json!("h"));

    let err = client(transport)
        .extract_text_from_response(&payload, None, &MemoryFileStorage::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractorError::ProtocolViolation(_)));
    assert_eq!(err.status_code(), 502);
}

#[tokio::test]
async fn given_output_path_when_extracting_then_text_and_sidecar_are_written() {
    let transport = ScriptedTransport::new(vec![]);
    let storage = MemoryFileStorage::new();
    let mut payload = Map::new();
    payload.insert("result_text".to_string(), json!("page one"));
    payload.insert("whisper_hash".to_string(), json!("h"));

    let text = client(transport)
        .extract_text_from_response(&payload, Some(&StoragePath::new("out/doc.txt")), &storage)
        .await
        .unwrap();

    assert_eq!(text, "page one");
    assert_eq!(storage.read_text("out/doc.txt").await.as_deref(), Some("page one"));
    assert!(storage.read_text("out/metadata/doc.json").await.is_some());
    assert_eq!(storage.object_count().await, 2);
}

#[tokio::test]
async fn given_adapter_over_scripted_transport_when_processing_then_result_carries_hash() {
    let transport = ScriptedTransport::new(vec![processed("  layout text  ")]);
    let adapter = LlmWhispererAdapter::new(client(transport));
    let storage = storage().await;

    let result = adapter
        .process(
            &StoragePath::new("in/doc.pdf"),
            None,
            &ProcessOptions::default(),
            &storage,
        )
        .await
        .unwrap();

    assert_eq!(result.extracted_text, "  layout text  ");
    assert_eq!(
        result.extraction_metadata.content_hash.as_deref(),
        Some("hash-123")
    );
    assert!(result.extraction_metadata.line_metadata.is_none());
    assert!(adapter.supports_highlight());
}

use std::sync::Arc;

use parseris::application::ports::{LlmClient, PageRasterizer, RasterizeError};
use parseris::application::services::{
    DEFAULT_INSTRUCTION, ExtractionError, SYSTEM_PROMPT, VisionPolicy, VisionTableService,
    compose_instruction,
};
use parseris::domain::{
    ContentPart, LlmCallConfig, MessageContent, MessageRole, StoragePath, ToolSettings,
};
use parseris::infrastructure::llm::MockLlmClient;
use parseris::infrastructure::storage::MemoryFileStorage;
use parseris::infrastructure::text_processing::{MAX_PAGES_DUE_TO_RAM_USAGE, ensure_within_page_limit};
use serde_json::json;

struct FakeRasterizer {
    pages: usize,
}

impl PageRasterizer for FakeRasterizer {
    fn rasterize(&self, _pdf: &[u8], _dpi: f32) -> Result<Vec<Vec<u8>>, RasterizeError> {
        Ok((0..self.pages).map(|i| vec![0x89, b'P', b'N', b'G', i as u8]).collect())
    }
}

struct OversizedRasterizer;

impl PageRasterizer for OversizedRasterizer {
    fn rasterize(&self, _pdf: &[u8], _dpi: f32) -> Result<Vec<Vec<u8>>, RasterizeError> {
        ensure_within_page_limit(250, MAX_PAGES_DUE_TO_RAM_USAGE)?;
        Ok(Vec::new())
    }
}

fn llm_config() -> LlmCallConfig {
    LlmCallConfig {
        model: "gpt-4o".to_string(),
        ..Default::default()
    }
}

fn service(pages: usize, llm: Arc<MockLlmClient>) -> VisionTableService {
    VisionTableService::new(
        Arc::new(FakeRasterizer { pages }),
        llm,
        VisionPolicy::default(),
    )
}

async fn storage_with(path: &str, data: &[u8]) -> MemoryFileStorage {
    MemoryFileStorage::new().with_file(path, data.to_vec()).await
}

#[tokio::test]
async fn given_non_pdf_input_when_running_then_validation_error_before_llm_call() {
    let llm = Arc::new(MockLlmClient::returning("[]"));
    let storage = storage_with("docs/sheet.xlsx", b"PK\x03\x04").await;

    let err = service(1, Arc::clone(&llm))
        .run(
            &StoragePath::new("docs/sheet.xlsx"),
            &storage,
            &llm_config(),
            "",
            &ToolSettings::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractionError::Validation(_)));
    assert_eq!(err.status_code(), 400);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn given_missing_file_when_running_then_not_found() {
    let llm = Arc::new(MockLlmClient::returning("[]"));

    let err = service(1, Arc::clone(&llm))
        .run(
            &StoragePath::new("docs/missing.pdf"),
            &MemoryFileStorage::new(),
            &llm_config(),
            "",
            &ToolSettings::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 404);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn given_empty_file_when_running_then_validation_error() {
    let llm = Arc::new(MockLlmClient::returning("[]"));
    let storage = storage_with("docs/empty.pdf", b"").await;

    let err = service(1, Arc::clone(&llm))
        .run(
            &StoragePath::new("docs/empty.pdf"),
            &storage,
            &llm_config(),
            "",
            &ToolSettings::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractionError::Validation(_)));
}

#[tokio::test]
async fn given_pdf_without_pages_when_running_then_validation_error() {
    let llm = Arc::new(MockLlmClient::returning("[]"));
    let storage = storage_with("docs/a.pdf", b"%PDF-1.7").await;

    let err = service(0, Arc::clone(&llm))
        .run(
            &StoragePath::new("docs/a.pdf"),
            &storage,
            &llm_config(),
            "",
            &ToolSettings::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractionError::Validation(_)));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn given_pdf_over_page_limit_when_running_then_validation_error_and_no_partial_call() {
    let llm = Arc::new(MockLlmClient::returning("[]"));
    let storage = storage_with("docs/long.pdf", b"%PDF-1.7").await;
    let service = VisionTableService::new(
        Arc::new(OversizedRasterizer),
        Arc::clone(&llm) as Arc<dyn LlmClient>,
        VisionPolicy::default(),
    );

    let err = service
        .run(
            &StoragePath::new("docs/long.pdf"),
            &storage,
            &llm_config(),
            "",
            &ToolSettings::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractionError::Validation(_)));
    assert_eq!(err.status_code(), 400);
    assert!(err.to_string().contains("250 pages"));
    assert_eq!(llm.call_count(), 0);
}

#[test]
fn given_page_count_at_or_over_limit_when_checking_then_only_excess_is_refused() {
    assert!(ensure_within_page_limit(200, 200).is_ok());

    let err = ensure_within_page_limit(201, 200).unwrap_err();

    assert!(matches!(err, RasterizeError::TooManyPages { count: 201, max: 200 }));
}

#[tokio::test]
async fn given_multi_page_pdf_when_running_then_one_call_with_all_pages_in_order() {
    let llm = Arc::new(MockLlmClient::returning(
        "Here you go:\n```json\n[{\"item\": \"Widget\", \"qty\": 3}]\n```",
    ));
    let storage = storage_with("docs/a.pdf", b"%PDF-1.7").await;
    let tool_settings = ToolSettings {
        preamble: "You read invoices.".to_string(),
        postamble: String::new(),
    };

    let output = service(3, Arc::clone(&llm))
        .run(
            &StoragePath::new("docs/a.pdf"),
            &storage,
            &llm_config(),
            "List the line items.",
            &tool_settings,
        )
        .await
        .unwrap();

    assert_eq!(output, json!([{ "item": "Widget", "qty": 3 }]));
    assert_eq!(llm.call_count(), 1);

    let messages = llm.last_messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::System);
    assert_eq!(messages[0].content, MessageContent::Text(SYSTEM_PROMPT.to_string()));
    assert_eq!(messages[1].role, MessageRole::User);
    assert_eq!(messages[1].image_count(), 3);

    let MessageContent::Parts(parts) = &messages[1].content else {
        panic!("user message must carry parts");
    };
    assert_eq!(
        parts[0],
        ContentPart::Text {
            text: "You read invoices.\n\nList the line items.".to_string()
        }
    );
}

#[tokio::test]
async fn given_llm_failure_without_status_when_running_then_500_class_adapter_error() {
    let llm = Arc::new(MockLlmClient::failing("connection reset", None));
    let storage = storage_with("docs/a.pdf", b"%PDF-1.7").await;

    let err = service(1, llm)
        .run(
            &StoragePath::new("docs/a.pdf"),
            &storage,
            &llm_config(),
            "",
            &ToolSettings::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 500);
    assert!(err.to_string().contains("connection reset"));
}

#[tokio::test]
async fn given_llm_failure_with_status_when_running_then_status_is_carried() {
    let llm = Arc::new(MockLlmClient::failing("bad gateway", Some(502)));
    let storage = storage_with("docs/a.pdf", b"%PDF-1.7").await;

    let err = service(1, llm)
        .run(
            &StoragePath::new("docs/a.pdf"),
            &storage,
            &llm_config(),
            "",
            &ToolSettings::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 502);
}

#[tokio::test]
async fn given_prose_only_response_when_running_then_parse_error() {
    let llm = Arc::new(MockLlmClient::returning("There are no tables in this document."));
    let storage = storage_with("docs/a.pdf", b"%PDF-1.7").await;

    let err = service(1, llm)
        .run(
            &StoragePath::new("docs/a.pdf"),
            &storage,
            &llm_config(),
            "",
            &ToolSettings::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractionError::Parse(_)));
    assert_eq!(err.status_code(), 500);
}

#[test]
fn given_all_parts_empty_when_composing_then_default_instruction() {
    assert_eq!(
        compose_instruction(&ToolSettings::default(), ""),
        DEFAULT_INSTRUCTION
    );
}

#[test]
fn given_all_parts_when_composing_then_joined_in_order_with_blank_lines() {
    let settings = ToolSettings {
        preamble: "Pre".to_string(),
        postamble: "Post".to_string(),
    };

    assert_eq!(compose_instruction(&settings, "Prompt"), "Pre\n\nPrompt\n\nPost");
}

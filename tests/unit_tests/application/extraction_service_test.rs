use std::sync::Arc;

use parseris::application::ports::{FileStorage, TextExtractor};
use parseris::application::services::{
    EXTRACTION_HINT_SCANNED_PDF, ExtractionError, ExtractionPolicy, ExtractionRequest,
    ExtractionService, extraction_hint,
};
use parseris::domain::{ExecutionSource, ExtractionResult, StoragePath};
use parseris::infrastructure::storage::{MemoryFileStorage, StorageRouter};
use parseris::infrastructure::text_processing::{
    LLM_WHISPERER_GUIDANCE, MockExtractorResolver, MockTextExtractor,
};

const LONG_TEXT: &str = "Invoice 2024-0042 issued to ACME Corp for consulting services rendered in March.";
const OCR_TEXT: &str = "OCR transcription of the scanned invoice 2024-0042 for ACME Corp, March services.";

fn service_with(
    resolver: MockExtractorResolver,
    storage: Arc<MemoryFileStorage>,
) -> ExtractionService {
    ExtractionService::new(
        Arc::new(resolver),
        Arc::new(StorageRouter::shared(storage)),
        ExtractionPolicy::default(),
    )
}

fn extractor(name: &'static str, text: &str) -> Arc<MockTextExtractor> {
    Arc::new(MockTextExtractor::returning(name, ExtractionResult::text(text)))
}

#[tokio::test]
async fn given_short_primary_text_and_ocr_adapter_when_extracting_then_ocr_output_replaces_it() {
    let primary = extractor("primary", "  tiny  ");
    let ocr = extractor("ocr", OCR_TEXT);
    let resolver = MockExtractorResolver::new()
        .with("primary", primary.clone())
        .with("ocr", ocr.clone());
    let service = service_with(resolver, Arc::new(MemoryFileStorage::new()));

    let mut request = ExtractionRequest::new("primary", "docs/scan.pdf", ExecutionSource::Ide);
    request.ocr_instance_id = Some("ocr".to_string());

    let outcome = service.perform_extraction(&request).await.unwrap();

    assert_eq!(outcome.extracted_text, OCR_TEXT);
    assert!(!outcome.extracted_text.contains("tiny"));
    assert!(outcome.ocr_fallback_used);
    assert_eq!(outcome.extraction_hint, None);
    assert_eq!(ocr.call_count(), 1);
}

#[tokio::test]
async fn given_short_pdf_text_without_ocr_when_extracting_then_returns_primary_text_with_hint() {
    let resolver = MockExtractorResolver::new().with("primary", extractor("primary", "Page 1"));
    let service = service_with(resolver, Arc::new(MemoryFileStorage::new()));
    let request = ExtractionRequest::new("primary", "docs/scan.pdf", ExecutionSource::Ide);

    let outcome = service.perform_extraction(&request).await.unwrap();

    assert_eq!(outcome.extracted_text, "Page 1");
    assert_eq!(outcome.extraction_hint, Some(EXTRACTION_HINT_SCANNED_PDF));
    assert!(!outcome.ocr_fallback_used);
}

#[tokio::test]
async fn given_short_text_from_non_pdf_when_extracting_then_no_hint() {
    let resolver = MockExtractorResolver::new().with("primary", extractor("primary", ""));
    let service = service_with(resolver, Arc::new(MemoryFileStorage::new()));
    let request = ExtractionRequest::new("primary", "docs/photo.png", ExecutionSource::Ide);

    let outcome = service.perform_extraction(&request).await.unwrap();

    assert_eq!(outcome.extracted_text, "");
    assert_eq!(outcome.extraction_hint, None);
}

#[tokio::test]
async fn given_long_primary_text_when_extracting_then_ocr_is_not_called() {
    let ocr = extractor("ocr", OCR_TEXT);
    let resolver = MockExtractorResolver::new()
        .with("primary", extractor("primary", LONG_TEXT))
        .with("ocr", ocr.clone());
    let service = service_with(resolver, Arc::new(MemoryFileStorage::new()));
    let mut request = ExtractionRequest::new("primary", "docs/invoice.pdf", ExecutionSource::Ide);
    request.ocr_instance_id = Some("ocr".to_string());

    let outcome = service.perform_extraction(&request).await.unwrap();

    assert_eq!(outcome.extracted_text, LONG_TEXT);
    assert_eq!(ocr.call_count(), 0);
}

#[tokio::test]
async fn given_ocr_also_short_when_extracting_then_hint_still_shown() {
    let resolver = MockExtractorResolver::new()
        .with("primary", extractor("primary", ""))
        .with("ocr", extractor("ocr", "smudge"));
    let service = service_with(resolver, Arc::new(MemoryFileStorage::new()));
    let mut request = ExtractionRequest::new("primary", "docs/scan.pdf", ExecutionSource::Ide);
    request.ocr_instance_id = Some("ocr".to_string());

    let outcome = service.perform_extraction(&request).await.unwrap();

    assert_eq!(outcome.extracted_text, "smudge");
    assert!(outcome.ocr_fallback_used);
    assert_eq!(outcome.extraction_hint, Some(EXTRACTION_HINT_SCANNED_PDF));
}

#[tokio::test]
async fn given_blank_ocr_id_when_extracting_then_treated_as_absent() {
    let resolver = MockExtractorResolver::new().with("primary", extractor("primary", "short"));
    let service = service_with(resolver, Arc::new(MemoryFileStorage::new()));
    let mut request = ExtractionRequest::new("primary", "docs/scan.pdf", ExecutionSource::Ide);
    request.ocr_instance_id = Some("   ".to_string());

    let outcome = service.perform_extraction(&request).await.unwrap();

    assert_eq!(outcome.extracted_text, "short");
    assert!(!outcome.ocr_fallback_used);
}

#[tokio::test]
async fn given_highlight_requested_and_unsupported_when_extracting_then_flag_not_passed() {
    let primary = extractor("primary", LONG_TEXT);
    let resolver = MockExtractorResolver::new().with("primary", primary.clone());
    let service = service_with(resolver, Arc::new(MemoryFileStorage::new()));
    let mut request = ExtractionRequest::new("primary", "docs/a.pdf", ExecutionSource::Ide);
    request.enable_highlight = true;

    service.perform_extraction(&request).await.unwrap();

    assert!(!primary.last_options().unwrap().enable_highlight);
}

#[tokio::test]
async fn given_highlight_requested_and_supported_when_extracting_then_flag_passed() {
    let primary = Arc::new(
        MockTextExtractor::returning("primary", ExtractionResult::text(LONG_TEXT))
            .with_highlight_support(),
    );
    let resolver = MockExtractorResolver::new().with("primary", primary.clone());
    let service = service_with(resolver, Arc::new(MemoryFileStorage::new()));
    let mut request = ExtractionRequest::new("primary", "docs/a.pdf", ExecutionSource::Ide);
    request.enable_highlight = true;
    request.tags = Some("invoices".to_string());

    service.perform_extraction(&request).await.unwrap();

    let options = primary.last_options().unwrap();
    assert!(options.enable_highlight);
    assert_eq!(options.tag.as_deref(), Some("invoices"));
}

#[tokio::test]
async fn given_tool_run_with_content_hash_when_extracting_then_hash_merged_into_execution_metadata() {
    let storage = Arc::new(
        MemoryFileStorage::new()
            .with_file("runs/7/METADATA.json", r#"{"source_name":"invoice.pdf"}"#)
            .await,
    );
    let primary = Arc::new(MockTextExtractor::returning(
        "primary",
        ExtractionResult::text(LONG_TEXT).with_content_hash("abc123"),
    ));
    let resolver = MockExtractorResolver::new().with("primary", primary);
    let service = service_with(resolver, Arc::clone(&storage));
    let mut request = ExtractionRequest::new("primary", "docs/a.pdf", ExecutionSource::Tool);
    request.execution_data_dir = Some(StoragePath::new("runs/7"));

    let outcome = service.perform_extraction(&request).await.unwrap();

    assert_eq!(outcome.content_hash.as_deref(), Some("abc123"));
    let metadata: serde_json::Value =
        serde_json::from_str(&storage.read_text("runs/7/METADATA.json").await.unwrap()).unwrap();
    assert_eq!(metadata["whisper_hash"], "abc123");
    assert_eq!(metadata["source_name"], "invoice.pdf");
}

#[tokio::test]
async fn given_ide_run_with_content_hash_when_extracting_then_no_execution_metadata_written() {
    let storage = Arc::new(MemoryFileStorage::new());
    let primary = Arc::new(MockTextExtractor::returning(
        "primary",
        ExtractionResult::text(LONG_TEXT).with_content_hash("abc123"),
    ));
    let resolver = MockExtractorResolver::new().with("primary", primary);
    let service = service_with(resolver, Arc::clone(&storage));
    let mut request = ExtractionRequest::new("primary", "docs/a.pdf", ExecutionSource::Ide);
    request.execution_data_dir = Some(StoragePath::new("runs/7"));

    service.perform_extraction(&request).await.unwrap();

    assert!(
        !storage
            .exists(&StoragePath::new("runs/7/METADATA.json"))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn given_primary_adapter_failure_when_extracting_then_adapter_error_keeps_status() {
    let primary = Arc::new(MockTextExtractor::failing("LLMWhisperer V2", "quota exceeded", 402));
    let resolver = MockExtractorResolver::new().with("primary", primary);
    let service = service_with(resolver, Arc::new(MemoryFileStorage::new()));
    let request = ExtractionRequest::new("primary", "docs/a.pdf", ExecutionSource::Ide);

    let err = service.perform_extraction(&request).await.unwrap_err();

    assert_eq!(err.status_code(), 402);
    assert_eq!(err.kind(), "adapter");
    assert_eq!(
        err.to_string(),
        "Error from text extractor 'LLMWhisperer V2'. quota exceeded"
    );
}

#[tokio::test]
async fn given_whisperer_service_failure_when_extracting_then_message_carries_guidance_and_status() {
    let primary = Arc::new(
        MockTextExtractor::failing("LLMWhisperer V2", "Invalid key. Whisper hash: h-1", 401)
            .with_failure_guidance(LLM_WHISPERER_GUIDANCE),
    );
    let resolver = MockExtractorResolver::new().with("primary", primary);
    let service = service_with(resolver, Arc::new(MemoryFileStorage::new()));
    let request = ExtractionRequest::new("primary", "docs/a.pdf", ExecutionSource::Ide);

    let err = service.perform_extraction(&request).await.unwrap_err();

    assert_eq!(err.status_code(), 401);
    assert_eq!(
        err.to_string(),
        format!(
            "Error from text extractor 'LLMWhisperer V2'. Invalid key. Whisper hash: h-1. {LLM_WHISPERER_GUIDANCE}"
        )
    );
}

#[tokio::test]
async fn given_ocr_adapter_failure_when_falling_back_then_error_tagged_as_ocr_fallback() {
    let resolver = MockExtractorResolver::new()
        .with("primary", extractor("primary", ""))
        .with(
            "ocr",
            Arc::new(MockTextExtractor::failing("ocr", "service down", 503)) as Arc<dyn TextExtractor>,
        );
    let service = service_with(resolver, Arc::new(MemoryFileStorage::new()));
    let mut request = ExtractionRequest::new("primary", "docs/scan.pdf", ExecutionSource::Ide);
    request.ocr_instance_id = Some("ocr".to_string());

    let err = service.perform_extraction(&request).await.unwrap_err();

    assert!(matches!(err, ExtractionError::OcrFallback(_)));
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.kind(), "ocr_fallback");
}

#[tokio::test]
async fn given_unknown_primary_instance_when_extracting_then_validation_error() {
    let service = service_with(MockExtractorResolver::new(), Arc::new(MemoryFileStorage::new()));
    let request = ExtractionRequest::new("missing", "docs/a.pdf", ExecutionSource::Ide);

    let err = service.perform_extraction(&request).await.unwrap_err();

    assert!(matches!(err, ExtractionError::Validation(_)));
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn given_empty_file_path_when_extracting_then_validation_error() {
    let resolver = MockExtractorResolver::new().with("primary", extractor("primary", LONG_TEXT));
    let service = service_with(resolver, Arc::new(MemoryFileStorage::new()));
    let request = ExtractionRequest::new("primary", "  ", ExecutionSource::Ide);

    let err = service.perform_extraction(&request).await.unwrap_err();

    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn given_deterministic_adapter_when_extracting_twice_then_same_text() {
    let resolver = MockExtractorResolver::new().with("primary", extractor("primary", LONG_TEXT));
    let service = service_with(resolver, Arc::new(MemoryFileStorage::new()));
    let request = ExtractionRequest::new("primary", "docs/a.pdf", ExecutionSource::Ide);

    let first = service.perform_extraction(&request).await.unwrap();
    let second = service.perform_extraction(&request).await.unwrap();

    assert_eq!(first.extracted_text, second.extracted_text);
}

#[tokio::test]
async fn given_custom_threshold_when_extracting_then_policy_is_honoured() {
    let ocr = extractor("ocr", OCR_TEXT);
    let resolver = MockExtractorResolver::new()
        .with("primary", extractor("primary", "twelve chars"))
        .with("ocr", ocr.clone());
    let service = ExtractionService::new(
        Arc::new(resolver),
        Arc::new(StorageRouter::shared(Arc::new(MemoryFileStorage::new()))),
        ExtractionPolicy { min_text_length: 5 },
    );
    let mut request = ExtractionRequest::new("primary", "docs/a.pdf", ExecutionSource::Ide);
    request.ocr_instance_id = Some("ocr".to_string());

    let outcome = service.perform_extraction(&request).await.unwrap();

    assert_eq!(outcome.extracted_text, "twelve chars");
    assert_eq!(ocr.call_count(), 0);
}

#[test]
fn given_text_at_threshold_when_computing_hint_then_none() {
    let path = StoragePath::new("a.PDF");
    let exactly_fifty = "x".repeat(50);

    assert_eq!(extraction_hint(&path, &exactly_fifty, 50), None);
    assert_eq!(
        extraction_hint(&path, &"x".repeat(49), 50),
        Some(EXTRACTION_HINT_SCANNED_PDF)
    );
    assert_eq!(extraction_hint(&StoragePath::new(""), "", 50), None);
}

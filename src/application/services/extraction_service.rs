use std::sync::Arc;
use std::time::Instant;

use crate::application::ports::{
    ExtractorError, ExtractorResolver, FileStorage, FileStorageResolver, ProcessOptions,
    TextExtractor,
};
use crate::domain::{ExecutionSource, ExtractionResult, StoragePath};

use super::extraction_error::ExtractionError;
use super::result_writer::write_execution_metadata;

pub const MIN_EXTRACTED_TEXT_LENGTH: usize = 50;

pub const EXTRACTION_HINT_SCANNED_PDF: &str = "No text was extracted from this PDF. If it is a \
scanned document (image-based), add an OCR adapter in the tool profile and try again. Native PDF \
extraction only works for PDFs with selectable text.";

/// Tunables of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionPolicy {
    /// Trimmed character count below which output counts as "too short".
    pub min_text_length: usize,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            min_text_length: MIN_EXTRACTED_TEXT_LENGTH,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub primary_instance_id: String,
    pub ocr_instance_id: Option<String>,
    pub file_path: StoragePath,
    pub output_path: Option<StoragePath>,
    pub enable_highlight: bool,
    pub tags: Option<String>,
    pub execution_source: ExecutionSource,
    pub run_id: String,
    pub execution_data_dir: Option<StoragePath>,
}

impl ExtractionRequest {
    pub fn new(
        primary_instance_id: impl Into<String>,
        file_path: impl Into<String>,
        execution_source: ExecutionSource,
    ) -> Self {
        Self {
            primary_instance_id: primary_instance_id.into(),
            ocr_instance_id: None,
            file_path: StoragePath::new(file_path),
            output_path: None,
            enable_highlight: false,
            tags: None,
            execution_source,
            run_id: String::new(),
            execution_data_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome {
    pub extracted_text: String,
    pub extraction_hint: Option<&'static str>,
    pub content_hash: Option<String>,
    pub ocr_fallback_used: bool,
}

/// Decides which adapter runs, applies the low-text heuristic and falls back
/// to OCR when configured.
pub struct ExtractionService {
    extractors: Arc<dyn ExtractorResolver>,
    storage: Arc<dyn FileStorageResolver>,
    policy: ExtractionPolicy,
}

impl ExtractionService {
    pub fn new(
        extractors: Arc<dyn ExtractorResolver>,
        storage: Arc<dyn FileStorageResolver>,
        policy: ExtractionPolicy,
    ) -> Self {
        Self {
            extractors,
            storage,
            policy,
        }
    }

    pub fn policy(&self) -> ExtractionPolicy {
        self.policy
    }

    #[tracing::instrument(
        skip(self, request),
        fields(
            file_path = %request.file_path,
            adapter_instance = %request.primary_instance_id,
            execution_source = %request.execution_source,
            run_id = %request.run_id,
        )
    )]
    pub async fn perform_extraction(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        let started = Instant::now();
        let result = self.extract(request).await;

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            success = result.is_ok(),
            "EXTRACTION finished"
        );

        result
    }

    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        if request.file_path.is_empty() {
            return Err(ExtractionError::Validation(
                "file_path must not be empty".to_string(),
            ));
        }

        let storage = self.storage.for_source(request.execution_source);
        let extractor = self
            .extractors
            .resolve(&request.primary_instance_id)
            .await
            .map_err(resolve_error)?;

        let options = ProcessOptions::default()
            .with_highlight(request.enable_highlight && extractor.supports_highlight())
            .with_tag(request.tags.clone());

        let primary = extractor
            .process(
                &request.file_path,
                request.output_path.as_ref(),
                &options,
                storage.as_ref(),
            )
            .await
            .map_err(|e| adapter_error(extractor.as_ref(), e))?;

        let content_hash = primary.extraction_metadata.content_hash.clone();
        self.record_execution_metadata(request, storage.as_ref(), content_hash.as_deref())
            .await;

        let mut extracted_text = primary.extracted_text;
        let mut ocr_fallback_used = false;

        if let Some(ocr_instance_id) = request
            .ocr_instance_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
        {
            let primary_len = extracted_text.trim().chars().count();
            if primary_len < self.policy.min_text_length {
                tracing::info!(
                    chars = primary_len,
                    ocr_instance = ocr_instance_id,
                    "Text extractor returned near-empty text, falling back to OCR adapter"
                );
                let ocr = self
                    .ocr_fallback(ocr_instance_id, request, storage.as_ref())
                    .await?;
                extracted_text = ocr.extracted_text;
                ocr_fallback_used = true;
            }
        }

        let extraction_hint =
            extraction_hint(&request.file_path, &extracted_text, self.policy.min_text_length);

        Ok(ExtractionOutcome {
            extracted_text,
            extraction_hint,
            content_hash,
            ocr_fallback_used,
        })
    }

    async fn ocr_fallback(
        &self,
        ocr_instance_id: &str,
        request: &ExtractionRequest,
        storage: &dyn FileStorage,
    ) -> Result<ExtractionResult, ExtractionError> {
        let ocr = self
            .extractors
            .resolve(ocr_instance_id)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "OCR fallback failed");
                ExtractionError::OcrFallback(format!("OCR fallback failed: {e}"))
            })?;

        let result = ocr
            .process(
                &request.file_path,
                request.output_path.as_ref(),
                &ProcessOptions::default(),
                storage,
            )
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, adapter = ocr.name(), "OCR fallback failed");
                ExtractionError::OcrFallback(format!("OCR fallback failed: {e}"))
            })?;

        tracing::info!(
            chars = result.trimmed_len(),
            "OCR fallback produced text"
        );

        Ok(result)
    }

    async fn record_execution_metadata(
        &self,
        request: &ExtractionRequest,
        storage: &dyn FileStorage,
        content_hash: Option<&str>,
    ) {
        if request.execution_source != ExecutionSource::Tool {
            return;
        }
        let (Some(run_dir), Some(hash)) = (request.execution_data_dir.as_ref(), content_hash)
        else {
            return;
        };

        match write_execution_metadata(storage, run_dir, hash).await {
            Ok(path) => tracing::debug!(path = %path, "Recorded content hash for downstream stages"),
            Err(e) => tracing::warn!(error = %e, "Failed to record execution metadata"),
        }
    }
}

/// Advisory shown when a PDF still yields too little text, whether or not an
/// OCR fallback already ran.
pub fn extraction_hint(
    file_path: &StoragePath,
    extracted_text: &str,
    min_text_length: usize,
) -> Option<&'static str> {
    if file_path.is_empty() || !file_path.is_pdf() {
        return None;
    }
    if extracted_text.trim().chars().count() >= min_text_length {
        return None;
    }
    Some(EXTRACTION_HINT_SCANNED_PDF)
}

fn resolve_error(err: ExtractorError) -> ExtractionError {
    match err {
        ExtractorError::InvalidConfig(msg) | ExtractorError::UnsupportedInput(msg) => {
            let msg = if msg.is_empty() {
                "Text extractor or storage config error.".to_string()
            } else {
                msg
            };
            ExtractionError::Validation(msg)
        }
        other => {
            let msg = other.to_string();
            ExtractionError::Unexpected(if msg.is_empty() {
                "Failed to initialize extractor.".to_string()
            } else {
                msg
            })
        }
    }
}

fn adapter_error(extractor: &dyn TextExtractor, err: ExtractorError) -> ExtractionError {
    tracing::error!(
        adapter = extractor.name(),
        status_code = err.status_code(),
        error = %err,
        "Text extraction failed"
    );
    ExtractionError::from_extractor(extractor, err)
}

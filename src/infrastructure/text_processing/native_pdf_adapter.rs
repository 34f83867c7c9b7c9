use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use pdf_oxide::PdfDocument;

use crate::application::ports::{ExtractorError, FileStorage, ProcessOptions, TextExtractor};
use crate::domain::{ExtractionResult, StoragePath};

use super::text_sanitizer::join_pages;

pub const NATIVE_PDF_ID: &str = "native|pdf";
const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Text-layer extraction with no network dependency. A scanned PDF yields an
/// empty string, which is what lets the orchestrator fall back to OCR.
#[derive(Default)]
pub struct NativePdfAdapter;

impl NativePdfAdapter {
    pub fn new() -> Self {
        Self
    }

    fn extract_pages(path: &std::path::Path) -> Result<Vec<String>, ExtractorError> {
        let doc = PdfDocument::open(path)
            .map_err(|e| ExtractorError::Failed(format!("failed to parse PDF: {e}")))?;

        let page_count = doc
            .page_count()
            .map_err(|e| ExtractorError::Failed(format!("failed to read page count: {e}")))?;

        collect_page_texts(page_count, |page_index| doc.extract_text(page_index))
    }
}

/// Gather the non-blank text of every page. A page that cannot be read
/// fails the whole document rather than silently shrinking the output.
pub fn collect_page_texts<E, F>(
    page_count: usize,
    mut extract: F,
) -> Result<Vec<String>, ExtractorError>
where
    E: std::fmt::Display,
    F: FnMut(usize) -> Result<String, E>,
{
    let mut pages = Vec::with_capacity(page_count);
    for page_index in 0..page_count {
        let text = extract(page_index).map_err(|e| {
            ExtractorError::Failed(format!(
                "failed to extract text from page {}: {e}",
                page_index + 1
            ))
        })?;
        if !text.trim().is_empty() {
            pages.push(text);
        }
    }
    Ok(pages)
}

#[async_trait]
impl TextExtractor for NativePdfAdapter {
    fn id(&self) -> &'static str {
        NATIVE_PDF_ID
    }

    fn name(&self) -> &'static str {
        "Native PDF"
    }

    #[tracing::instrument(skip(self, _options, storage), fields(adapter = NATIVE_PDF_ID, input = %input))]
    async fn process(
        &self,
        input: &StoragePath,
        output: Option<&StoragePath>,
        _options: &ProcessOptions,
        storage: &dyn FileStorage,
    ) -> Result<ExtractionResult, ExtractorError> {
        if !input.is_pdf() {
            return Err(ExtractorError::UnsupportedInput(format!(
                "Native PDF extraction supports PDF only, got '{input}'"
            )));
        }

        let data = storage
            .read(input)
            .await
            .map_err(|e| ExtractorError::FileRead(format!("Failed to read input file: {e}")))?;

        let mut temp_file = tempfile::NamedTempFile::new()
            .map_err(|e| ExtractorError::Failed(format!("failed to create temp file: {e}")))?;
        temp_file
            .write_all(&data)
            .map_err(|e| ExtractorError::Failed(format!("failed to write temp file: {e}")))?;

        let temp_path = temp_file.path().to_path_buf();
        let pages = tokio::time::timeout(
            EXTRACTION_TIMEOUT,
            tokio::task::spawn_blocking(move || Self::extract_pages(&temp_path)),
        )
        .await
        .map_err(|_| ExtractorError::Timeout("PDF extraction timed out".to_string()))?
        .map_err(|e| ExtractorError::Failed(format!("task join error: {e}")))??;

        let text = join_pages(&pages);

        tracing::info!(
            page_count = pages.len(),
            chars = text.chars().count(),
            "PDF text extraction complete"
        );

        if let Some(output) = output {
            if let Err(e) = storage.write_text(output, &text).await {
                tracing::warn!(path = %output, error = %e, "Failed to write extracted text");
            }
        }

        Ok(ExtractionResult::text(text))
    }

    async fn test_connection(&self) -> Result<bool, ExtractorError> {
        Ok(true)
    }
}

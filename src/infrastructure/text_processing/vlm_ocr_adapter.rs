use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{
    ExtractorError, FileStorage, LlmClient, PageRasterizer, ProcessOptions, RasterizeError,
    TextExtractor,
};
use crate::application::services::png_data_url;
use crate::domain::{AdapterConfig, ExtractionResult, LlmCallConfig, StoragePath, VisionMessage};

use super::text_sanitizer::join_pages;

pub const VLM_OCR_ID: &str = "vlm|ocr";
pub const RASTERIZE_TIMEOUT: Duration = Duration::from_secs(300);
pub const OCR_PROMPT: &str = "You are an expert OCR engine. Transcribe all the text on this page \
exactly as it appears, preserving reading order, line breaks and table rows.\n\
\n\
Follow these strict rules:\n\
1. Output ONLY the transcribed text. Do not include any conversational filler.\n\
2. Do not summarize, translate or correct the text.\n\
3. Render tables as one row per line with cells separated by ' | '.";

/// OCR by asking a vision-capable model to transcribe each rasterized page.
pub struct VlmOcrAdapter {
    rasterizer: Arc<dyn PageRasterizer>,
    llm: Arc<dyn LlmClient>,
    llm_config: LlmCallConfig,
    render_dpi: f32,
}

impl VlmOcrAdapter {
    pub fn new(
        rasterizer: Arc<dyn PageRasterizer>,
        llm: Arc<dyn LlmClient>,
        llm_config: LlmCallConfig,
        render_dpi: f32,
    ) -> Self {
        Self {
            rasterizer,
            llm,
            llm_config,
            render_dpi,
        }
    }

    pub fn from_config(
        config: &AdapterConfig,
        rasterizer: Arc<dyn PageRasterizer>,
        llm: Arc<dyn LlmClient>,
        render_dpi: f32,
    ) -> Result<Self, ExtractorError> {
        let llm_config: LlmCallConfig = config
            .parse()
            .map_err(|e| ExtractorError::InvalidConfig(format!("Invalid VLM OCR settings: {e}")))?;
        if llm_config.model.trim().is_empty() {
            return Err(ExtractorError::InvalidConfig(
                "VLM OCR requires a 'model'".to_string(),
            ));
        }
        Ok(Self::new(rasterizer, llm, llm_config, render_dpi))
    }

    async fn transcribe_page(&self, png: &[u8], page_index: usize) -> Result<String, ExtractorError> {
        let messages = [VisionMessage::user_with_images(
            OCR_PROMPT,
            &[png_data_url(png)],
        )];

        self.llm
            .complete(&self.llm_config, &messages)
            .await
            .map_err(|e| ExtractorError::Service {
                message: format!("VLM OCR failed on page {}: {e}", page_index + 1),
                status_code: e.status().unwrap_or(500),
            })
    }
}

#[async_trait]
impl TextExtractor for VlmOcrAdapter {
    fn id(&self) -> &'static str {
        VLM_OCR_ID
    }

    fn name(&self) -> &'static str {
        "Vision LLM OCR"
    }

    #[tracing::instrument(
        skip(self, _options, storage),
        fields(adapter = VLM_OCR_ID, model = %self.llm_config.model, input = %input)
    )]
    async fn process(
        &self,
        input: &StoragePath,
        output: Option<&StoragePath>,
        _options: &ProcessOptions,
        storage: &dyn FileStorage,
    ) -> Result<ExtractionResult, ExtractorError> {
        if !input.is_pdf() {
            return Err(ExtractorError::UnsupportedInput(format!(
                "VLM OCR supports PDF only, got '{input}'"
            )));
        }

        let data = storage
            .read(input)
            .await
            .map_err(|e| ExtractorError::FileRead(format!("Failed to read input file: {e}")))?;

        let rasterizer = Arc::clone(&self.rasterizer);
        let dpi = self.render_dpi;
        let png_buffers = tokio::time::timeout(
            RASTERIZE_TIMEOUT,
            tokio::task::spawn_blocking(move || rasterizer.rasterize(&data, dpi)),
        )
        .await
        .map_err(|_| ExtractorError::Timeout("PDF rasterization timed out".to_string()))?
        .map_err(|e| ExtractorError::Failed(format!("task join error: {e}")))?
        .map_err(|e| match e {
            RasterizeError::TooManyPages { .. } | RasterizeError::InvalidDocument(_) => {
                ExtractorError::UnsupportedInput(format!("Cannot OCR PDF: {e}"))
            }
            other => ExtractorError::Failed(format!("PDF rasterization failed: {other}")),
        })?;

        tracing::info!(
            page_count = png_buffers.len(),
            "PDF rasterization complete, starting VLM transcription"
        );

        let mut page_texts: Vec<String> = Vec::with_capacity(png_buffers.len());
        for (index, png) in png_buffers.iter().enumerate() {
            page_texts.push(self.transcribe_page(png, index).await?);
        }

        let text = join_pages(&page_texts);

        if let Some(output) = output {
            storage
                .write_text(output, &text)
                .await
                .map_err(|e| ExtractorError::Failed(format!("Failed to write output: {e}")))?;
        }

        Ok(ExtractionResult::text(text))
    }

    async fn test_connection(&self) -> Result<bool, ExtractorError> {
        let messages = [VisionMessage::user_with_images("Reply with OK.", &[])];
        self.llm
            .complete(&self.llm_config, &messages)
            .await
            .map_err(|e| ExtractorError::Service {
                message: format!("VLM connection test failed: {e}"),
                status_code: e.status().unwrap_or(500),
            })?;
        Ok(true)
    }
}

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose};
use serde_json::Value;

use crate::application::ports::{
    FileStorage, FileStorageError, LlmClient, PageRasterizer, RasterizeError,
};
use crate::domain::{LlmCallConfig, StoragePath, ToolSettings, VisionMessage};

use super::extraction_error::ExtractionError;
use super::json_block::{JsonBlockError, parse_json_from_response};

pub const RENDER_DPI: f32 = 150.0;

pub const DEFAULT_INSTRUCTION: &str = "Extract all tabular data from this document as JSON.";

pub const SYSTEM_PROMPT: &str = "You are an expert at extracting structured tabular data from \
documents. Return only valid JSON. If the document contains a table, return an array of row \
objects. If there are multiple tables, return a JSON object with keys identifying each table and \
values as arrays of row objects. Do not include any explanation, only the JSON.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisionPolicy {
    pub render_dpi: f32,
}

impl Default for VisionPolicy {
    fn default() -> Self {
        Self {
            render_dpi: RENDER_DPI,
        }
    }
}

/// Table extraction that reads rasterized pages with a vision-capable LLM
/// instead of the document's text layer. PDF input only.
pub struct VisionTableService {
    rasterizer: Arc<dyn PageRasterizer>,
    llm: Arc<dyn LlmClient>,
    policy: VisionPolicy,
}

impl VisionTableService {
    pub fn new(
        rasterizer: Arc<dyn PageRasterizer>,
        llm: Arc<dyn LlmClient>,
        policy: VisionPolicy,
    ) -> Self {
        Self {
            rasterizer,
            llm,
            policy,
        }
    }

    #[tracing::instrument(skip_all, fields(file_path = %file_path, model = %llm_config.model))]
    pub async fn run(
        &self,
        file_path: &StoragePath,
        storage: &dyn FileStorage,
        llm_config: &LlmCallConfig,
        prompt: &str,
        tool_settings: &ToolSettings,
    ) -> Result<Value, ExtractionError> {
        let exists = storage.exists(file_path).await.map_err(storage_error)?;
        if !exists {
            return Err(ExtractionError::NotFound(format!(
                "Document not found: {file_path}"
            )));
        }

        let file_bytes = storage.read(file_path).await.map_err(storage_error)?;
        if file_bytes.is_empty() {
            return Err(ExtractionError::Validation("Document is empty.".to_string()));
        }

        if !file_path.is_pdf() {
            return Err(ExtractionError::Validation(
                "Vision table extraction currently supports PDF only.".to_string(),
            ));
        }

        let image_urls = self.render_pages(file_bytes).await?;
        if image_urls.is_empty() {
            return Err(ExtractionError::Validation(
                "PDF produced no pages.".to_string(),
            ));
        }

        let instruction = compose_instruction(tool_settings, prompt);
        let messages = build_vision_messages(&instruction, &image_urls);

        tracing::info!(
            pages = image_urls.len(),
            prompt = %crate::infrastructure::observability::sanitize_prompt(prompt),
            "Calling vision LLM for table extraction"
        );

        let response_text = self
            .llm
            .complete(llm_config, &messages)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Vision table extraction LLM call failed");
                ExtractionError::Adapter {
                    message: format!("Vision extraction failed: {e}"),
                    status_code: e.status().unwrap_or(500),
                }
            })?;

        parse_json_from_response(&response_text).map_err(|e| match e {
            JsonBlockError::NotFound => ExtractionError::Parse(
                "Vision extraction did not return valid JSON.".to_string(),
            ),
            JsonBlockError::Invalid(detail) => ExtractionError::Parse(format!(
                "Vision extraction returned invalid JSON: {detail}"
            )),
        })
    }

    async fn render_pages(&self, pdf: Vec<u8>) -> Result<Vec<String>, ExtractionError> {
        let rasterizer = Arc::clone(&self.rasterizer);
        let dpi = self.policy.render_dpi;

        let pages = tokio::task::spawn_blocking(move || rasterizer.rasterize(&pdf, dpi))
            .await
            .map_err(|e| ExtractionError::Unexpected(format!("task join error: {e}")))?
            .map_err(|e| match e {
                RasterizeError::TooManyPages { .. } | RasterizeError::InvalidDocument(_) => {
                    ExtractionError::Validation(format!("Cannot process PDF: {e}"))
                }
                other => ExtractionError::Unexpected(format!("PDF rasterization failed: {other}")),
            })?;

        Ok(pages.iter().map(|png| png_data_url(png)).collect())
    }
}

/// Preamble, user prompt and postamble joined by blank lines, skipping empty
/// parts.
pub fn compose_instruction(tool_settings: &ToolSettings, prompt: &str) -> String {
    let instruction = [
        tool_settings.preamble.as_str(),
        prompt,
        tool_settings.postamble.as_str(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("\n\n");

    let instruction = instruction.trim();
    if instruction.is_empty() {
        DEFAULT_INSTRUCTION.to_string()
    } else {
        instruction.to_string()
    }
}

pub fn build_vision_messages(instruction: &str, image_data_urls: &[String]) -> Vec<VisionMessage> {
    vec![
        VisionMessage::system(SYSTEM_PROMPT),
        VisionMessage::user_with_images(instruction, image_data_urls),
    ]
}

pub fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(png)
    )
}

fn storage_error(err: FileStorageError) -> ExtractionError {
    match err {
        FileStorageError::NotFound(msg) => {
            ExtractionError::NotFound(format!("Document not found: {msg}"))
        }
        other => ExtractionError::NotFound(format!("File not found or not readable: {other}")),
    }
}

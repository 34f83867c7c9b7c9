use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use crate::application::services::{ExtractionError, ExtractionRequest};
use crate::domain::{ExecutionSource, StoragePath};
use crate::presentation::state::AppState;

use super::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ExtractRequestBody {
    pub x2text_instance_id: Option<String>,
    pub file_path: Option<String>,
    pub execution_source: Option<String>,
    pub run_id: Option<String>,
    #[serde(default)]
    pub ocr_instance_id: Option<String>,
    #[serde(default)]
    pub output_file_path: Option<String>,
    #[serde(default)]
    pub enable_highlight: bool,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub execution_data_dir: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub extracted_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_hint: Option<&'static str>,
}

impl ExtractRequestBody {
    fn into_request(self) -> Result<ExtractionRequest, ExtractionError> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        let missing: Vec<&str> = [
            ("x2text_instance_id", present(&self.x2text_instance_id)),
            ("file_path", present(&self.file_path)),
            ("execution_source", present(&self.execution_source)),
            ("run_id", present(&self.run_id)),
        ]
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(ExtractionError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let execution_source =
            ExecutionSource::try_from(self.execution_source.as_deref().unwrap_or_default())
                .map_err(ExtractionError::Validation)?;

        let mut request = ExtractionRequest::new(
            self.x2text_instance_id.unwrap_or_default(),
            self.file_path.unwrap_or_default(),
            execution_source,
        );
        request.run_id = self.run_id.unwrap_or_default();
        request.ocr_instance_id = self.ocr_instance_id;
        request.output_path = non_empty(self.output_file_path).map(StoragePath::new);
        request.enable_highlight = self.enable_highlight;
        request.tags = self.tags;
        request.execution_data_dir = non_empty(self.execution_data_dir).map(StoragePath::new);
        Ok(request)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[tracing::instrument(skip_all)]
pub async fn extract_handler(
    State(state): State<AppState>,
    body: Result<Json<ExtractRequestBody>, JsonRejection>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ExtractionError::Validation(e.body_text()))?;
    let request = body.into_request()?;

    let outcome = state.extraction_service.perform_extraction(&request).await?;

    Ok(Json(ExtractResponse {
        extracted_text: outcome.extracted_text,
        extraction_hint: outcome.extraction_hint,
    }))
}

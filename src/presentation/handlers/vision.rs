use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::services::ExtractionError;
use crate::domain::{ExecutionSource, LlmCallConfig, StoragePath, ToolSettings};
use crate::presentation::state::AppState;

use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct VisionExtractRequestBody {
    pub file_path: String,
    pub execution_source: ExecutionSource,
    #[serde(default)]
    pub prompt: String,
    pub llm: LlmCallConfig,
    #[serde(default)]
    pub tool_settings: ToolSettings,
}

#[derive(Debug, Serialize)]
pub struct VisionExtractResponse {
    pub output: Value,
}

#[tracing::instrument(skip_all)]
pub async fn vision_table_handler(
    State(state): State<AppState>,
    body: Result<Json<VisionExtractRequestBody>, JsonRejection>,
) -> Result<Json<VisionExtractResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ExtractionError::Validation(e.body_text()))?;

    let file_path = StoragePath::new(body.file_path);
    if file_path.is_empty() {
        return Err(ExtractionError::Validation("file_path must not be empty".to_string()).into());
    }
    let storage = state.storage.for_source(body.execution_source);

    let output = state
        .vision_service
        .run(
            &file_path,
            storage.as_ref(),
            &body.llm,
            &body.prompt,
            &body.tool_settings,
        )
        .await?;

    Ok(Json(VisionExtractResponse { output }))
}

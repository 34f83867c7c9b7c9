use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use crate::application::ports::ExtractorError;
use crate::application::services::ExtractionError;
use crate::presentation::state::AppState;

use super::error::ApiError;

#[derive(Debug, Serialize)]
pub struct TestConnectionResponse {
    pub status: bool,
}

#[tracing::instrument(skip(state))]
pub async fn test_connection_handler(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
) -> Result<Json<TestConnectionResponse>, ApiError> {
    let extractor = state
        .extractors
        .resolve(&instance_id)
        .await
        .map_err(|e| match e {
            ExtractorError::InvalidConfig(msg) => ExtractionError::Validation(msg),
            other => ExtractionError::Unexpected(other.to_string()),
        })?;

    let status = extractor
        .test_connection()
        .await
        .map_err(|e| ExtractionError::from_extractor(extractor.as_ref(), e))?;

    Ok(Json(TestConnectionResponse { status }))
}

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::services::ExtractionError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    pub kind: &'static str,
}

/// Boundary wrapper turning `ExtractionError` into `{error, code, kind}`.
#[derive(Debug)]
pub struct ApiError(pub ExtractionError);

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.status_code();
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: status.as_u16(),
                kind: self.0.kind(),
            }),
        )
            .into_response()
    }
}

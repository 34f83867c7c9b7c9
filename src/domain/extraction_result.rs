use serde::{Deserialize, Serialize};

/// Output of one adapter `process` call.
///
/// `extracted_text` is always present; an adapter that found nothing returns
/// an empty string rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub extracted_text: String,
    pub extraction_metadata: ExtractionMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Service-issued identifier of the extraction (`whisper_hash`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    /// Per-line highlight data, only when highlighting was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_metadata: Option<serde_json::Value>,
}

impl ExtractionResult {
    pub fn text(extracted_text: impl Into<String>) -> Self {
        Self {
            extracted_text: extracted_text.into(),
            extraction_metadata: ExtractionMetadata::default(),
        }
    }

    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        let hash = hash.into();
        if !hash.is_empty() {
            self.extraction_metadata.content_hash = Some(hash);
        }
        self
    }

    pub fn with_line_metadata(mut self, line_metadata: Option<serde_json::Value>) -> Self {
        self.extraction_metadata.line_metadata = line_metadata;
        self
    }

    /// Length of the trimmed text in characters.
    pub fn trimmed_len(&self) -> usize {
        self.extracted_text.trim().chars().count()
    }
}

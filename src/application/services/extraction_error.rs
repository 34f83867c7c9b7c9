use crate::application::ports::{ExtractorError, TextExtractor};

/// The single error type surfaced by the extraction and vision services.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ServiceUnreachable(String),
    #[error("{0}")]
    ServiceTimeout(String),
    #[error("{0}")]
    ProtocolViolation(String),
    #[error("{message}")]
    Adapter { message: String, status_code: u16 },
    #[error("{0}")]
    OcrFallback(String),
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Unexpected(String),
}

impl ExtractionError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::ServiceUnreachable(_) => 503,
            Self::ServiceTimeout(_) => 504,
            Self::ProtocolViolation(_) => 502,
            Self::Adapter { status_code, .. } => *status_code,
            Self::OcrFallback(_) | Self::Parse(_) | Self::Unexpected(_) => 500,
        }
    }

    /// Stable tag so callers can tell primary failures from fallback ones.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::ServiceUnreachable(_) => "service_unreachable",
            Self::ServiceTimeout(_) => "service_timeout",
            Self::ProtocolViolation(_) => "protocol_violation",
            Self::Adapter { .. } => "adapter",
            Self::OcrFallback(_) => "ocr_fallback",
            Self::Parse(_) => "parse",
            Self::Unexpected(_) => "unexpected",
        }
    }

    /// Normalize a failure raised by `extractor`, prefixing its name and
    /// appending its operator guidance when it has any.
    pub fn from_extractor(extractor: &dyn TextExtractor, err: ExtractorError) -> Self {
        let normalized = Self::from_adapter(extractor.name(), err);
        match extractor.failure_guidance() {
            Some(guidance) => normalized.with_guidance(guidance),
            None => normalized,
        }
    }

    /// Normalize an adapter failure, prefixing the adapter name.
    ///
    /// Service codes outside 400..=599 are not errors on the wire and
    /// collapse to 500.
    pub fn from_adapter(adapter_name: &str, err: ExtractorError) -> Self {
        let detail = err.to_string();
        let message = if detail.is_empty() {
            format!("Error from text extractor '{adapter_name}'.")
        } else {
            format!("Error from text extractor '{adapter_name}'. {detail}")
        };

        match err {
            ExtractorError::InvalidConfig(_) | ExtractorError::UnsupportedInput(_) => {
                Self::Validation(message)
            }
            ExtractorError::FileRead(_) => Self::NotFound(message),
            ExtractorError::Unreachable(_) => Self::ServiceUnreachable(message),
            ExtractorError::Timeout(_) => Self::ServiceTimeout(message),
            ExtractorError::ProtocolViolation(_) => Self::ProtocolViolation(message),
            ExtractorError::Service { status_code, .. } => Self::Adapter {
                message,
                status_code: if (400..=599).contains(&status_code) {
                    status_code
                } else {
                    500
                },
            },
            ExtractorError::Failed(_) => Self::Adapter {
                message,
                status_code: 500,
            },
        }
    }

    /// Append a sentence to the message, keeping the variant and status.
    pub fn with_guidance(self, guidance: &str) -> Self {
        let append = |message: String| {
            if message.ends_with('.') {
                format!("{message} {guidance}")
            } else {
                format!("{message}. {guidance}")
            }
        };
        match self {
            Self::Validation(m) => Self::Validation(append(m)),
            Self::NotFound(m) => Self::NotFound(append(m)),
            Self::ServiceUnreachable(m) => Self::ServiceUnreachable(append(m)),
            Self::ServiceTimeout(m) => Self::ServiceTimeout(append(m)),
            Self::ProtocolViolation(m) => Self::ProtocolViolation(append(m)),
            Self::Adapter {
                message,
                status_code,
            } => Self::Adapter {
                message: append(message),
                status_code,
            },
            Self::OcrFallback(m) => Self::OcrFallback(append(m)),
            Self::Parse(m) => Self::Parse(append(m)),
            Self::Unexpected(m) => Self::Unexpected(append(m)),
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::application::ports::{
    ExtractorError, ExtractorResolver, FileStorage, ProcessOptions, TextExtractor,
};
use crate::domain::{ExtractionResult, StoragePath};

type Outcome = Result<ExtractionResult, (String, u16)>;

/// Deterministic extractor returning a canned result.
pub struct MockTextExtractor {
    name: &'static str,
    supports_highlight: bool,
    failure_guidance: Option<&'static str>,
    outcome: Outcome,
    calls: AtomicUsize,
    last_options: std::sync::Mutex<Option<ProcessOptions>>,
}

impl MockTextExtractor {
    pub fn returning(name: &'static str, result: ExtractionResult) -> Self {
        Self {
            name,
            supports_highlight: false,
            failure_guidance: None,
            outcome: Ok(result),
            calls: AtomicUsize::new(0),
            last_options: std::sync::Mutex::new(None),
        }
    }

    pub fn failing(name: &'static str, message: impl Into<String>, status_code: u16) -> Self {
        Self {
            name,
            supports_highlight: false,
            failure_guidance: None,
            outcome: Err((message.into(), status_code)),
            calls: AtomicUsize::new(0),
            last_options: std::sync::Mutex::new(None),
        }
    }

    pub fn with_highlight_support(mut self) -> Self {
        self.supports_highlight = true;
        self
    }

    pub fn with_failure_guidance(mut self, guidance: &'static str) -> Self {
        self.failure_guidance = Some(guidance);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<ProcessOptions> {
        self.last_options.lock().ok().and_then(|o| o.clone())
    }
}

#[async_trait]
impl TextExtractor for MockTextExtractor {
    fn id(&self) -> &'static str {
        "mock|text"
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn supports_highlight(&self) -> bool {
        self.supports_highlight
    }

    fn failure_guidance(&self) -> Option<&'static str> {
        self.failure_guidance
    }

    async fn process(
        &self,
        _input: &StoragePath,
        output: Option<&StoragePath>,
        options: &ProcessOptions,
        storage: &dyn FileStorage,
    ) -> Result<ExtractionResult, ExtractorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_options.lock() {
            *last = Some(options.clone());
        }

        match &self.outcome {
            Ok(result) => {
                if let Some(output) = output {
                    storage
                        .write_text(output, &result.extracted_text)
                        .await
                        .map_err(|e| ExtractorError::Failed(e.to_string()))?;
                }
                Ok(result.clone())
            }
            Err((message, status_code)) => Err(ExtractorError::Service {
                message: message.clone(),
                status_code: *status_code,
            }),
        }
    }

    async fn test_connection(&self) -> Result<bool, ExtractorError> {
        Ok(self.outcome.is_ok())
    }
}

/// Resolver over a fixed set of extractors.
#[derive(Default)]
pub struct MockExtractorResolver {
    extractors: HashMap<String, Arc<dyn TextExtractor>>,
}

impl MockExtractorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, instance_id: &str, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractors.insert(instance_id.to_string(), extractor);
        self
    }
}

#[async_trait]
impl ExtractorResolver for MockExtractorResolver {
    async fn resolve(&self, instance_id: &str) -> Result<Arc<dyn TextExtractor>, ExtractorError> {
        self.extractors
            .get(instance_id)
            .cloned()
            .ok_or_else(|| {
                ExtractorError::InvalidConfig(format!("adapter instance not found: {instance_id}"))
            })
    }
}

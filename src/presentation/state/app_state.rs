use std::sync::Arc;

use crate::application::ports::{ExtractorResolver, FileStorageResolver};
use crate::application::services::{ExtractionService, VisionTableService};

#[derive(Clone)]
pub struct AppState {
    pub extraction_service: Arc<ExtractionService>,
    pub vision_service: Arc<VisionTableService>,
    pub extractors: Arc<dyn ExtractorResolver>,
    pub storage: Arc<dyn FileStorageResolver>,
}

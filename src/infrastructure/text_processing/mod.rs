mod adapter_registry;
mod azure_doc_intel_ocr_adapter;
mod llm_whisperer_adapter;
mod mock_text_extractor;
mod native_pdf_adapter;
mod pdfium_rasterizer;
mod text_sanitizer;
mod vlm_ocr_adapter;
mod whisperer_client;
mod whisperer_params;
mod whisperer_transport;

pub use adapter_registry::{AdapterDependencies, AdapterRegistry};
pub use azure_doc_intel_ocr_adapter::{AZURE_DOC_INTEL_ID, AzureDocIntelOcrAdapter};
pub use llm_whisperer_adapter::{LLM_WHISPERER_GUIDANCE, LLM_WHISPERER_ID, LlmWhispererAdapter};
pub use mock_text_extractor::{MockExtractorResolver, MockTextExtractor};
pub use native_pdf_adapter::{NATIVE_PDF_ID, NativePdfAdapter, collect_page_texts};
pub use pdfium_rasterizer::{MAX_PAGES_DUE_TO_RAM_USAGE, PdfiumRasterizer, ensure_within_page_limit};
pub use text_sanitizer::{join_pages, sanitize_page_text};
pub use vlm_ocr_adapter::{OCR_PROMPT, VLM_OCR_ID, VlmOcrAdapter};
pub use whisperer_client::{
    DEFAULT_BACKOFF_BASE, DEFAULT_MAX_ATTEMPTS, LINE_METADATA_KEY, RetryPolicy, WhispererClient,
};
pub use whisperer_params::{
    OutputMode, WhisperQuery, WhispererMode, WhispererRequestParams, WhispererSettings,
    build_whisper_query,
};
pub use whisperer_transport::{
    DEFAULT_POLL_INTERVAL, HttpWhisperTransport, UNSTRACT_KEY_HEADER, WhisperResponse,
    WhisperTransport, WhisperTransportError,
};

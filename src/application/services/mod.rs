mod extraction_error;
mod extraction_service;
mod json_block;
mod result_writer;
mod vision_table_service;

pub use extraction_error::ExtractionError;
pub use extraction_service::{
    EXTRACTION_HINT_SCANNED_PDF, ExtractionOutcome, ExtractionPolicy, ExtractionRequest,
    ExtractionService, MIN_EXTRACTED_TEXT_LENGTH, extraction_hint,
};
pub use json_block::{JsonBlockError, locate_json_block, parse_json_from_response, repair_json};
pub use result_writer::{
    CONTENT_HASH_KEY, EXECUTION_METADATA_FILE, RESULT_TEXT_KEY, write_execution_metadata,
    write_extraction_output,
};
pub use vision_table_service::{
    DEFAULT_INSTRUCTION, RENDER_DPI, SYSTEM_PROMPT, VisionPolicy, VisionTableService,
    build_vision_messages, compose_instruction, png_data_url,
};

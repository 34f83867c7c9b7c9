mod error;
mod extract;
mod health;
mod test_connection;
mod vision;

pub use error::{ApiError, ErrorResponse};
pub use extract::{ExtractRequestBody, ExtractResponse, extract_handler};
pub use health::health_handler;
pub use test_connection::{TestConnectionResponse, test_connection_handler};
pub use vision::{VisionExtractRequestBody, VisionExtractResponse, vision_table_handler};

/// Renders each page of a PDF to PNG bytes, in page order. Every page is
/// rendered or the call fails; output is never silently truncated.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, pdf: &[u8], dpi: f32) -> Result<Vec<Vec<u8>>, RasterizeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RasterizeError {
    #[error("pdf renderer unavailable: {0}")]
    Unavailable(String),
    #[error("failed to open pdf: {0}")]
    InvalidDocument(String),
    #[error("PDF has {count} pages, more than the {max} page limit")]
    TooManyPages { count: usize, max: usize },
    #[error("render page {page} failed: {message}")]
    RenderFailed { page: usize, message: String },
}

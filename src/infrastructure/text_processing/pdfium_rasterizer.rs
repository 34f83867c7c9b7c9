use image::ImageFormat;
use pdfium_render::prelude::*;

use crate::application::ports::{PageRasterizer, RasterizeError};

pub const MAX_PAGES_DUE_TO_RAM_USAGE: usize = 200;

/// Page renderer backed by the system pdfium library.
pub struct PdfiumRasterizer {
    max_pages: usize,
}

impl Default for PdfiumRasterizer {
    fn default() -> Self {
        Self::new(MAX_PAGES_DUE_TO_RAM_USAGE)
    }
}

impl PdfiumRasterizer {
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages: max_pages.max(1),
        }
    }
}

/// Refuse documents longer than `max_pages` before any page is rendered.
pub fn ensure_within_page_limit(
    page_count: usize,
    max_pages: usize,
) -> Result<(), RasterizeError> {
    if page_count > max_pages {
        tracing::warn!(page_count, max_pages, "PDF exceeds page limit");
        return Err(RasterizeError::TooManyPages {
            count: page_count,
            max: max_pages,
        });
    }
    Ok(())
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf: &[u8], dpi: f32) -> Result<Vec<Vec<u8>>, RasterizeError> {
        let bindings = Pdfium::bind_to_system_library()
            .map_err(|e| RasterizeError::Unavailable(format!("pdfium bind failed: {e}")))?;
        let pdfium = Pdfium::new(bindings);

        let doc = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| RasterizeError::InvalidDocument(e.to_string()))?;

        let page_count = doc.pages().len() as usize;
        ensure_within_page_limit(page_count, self.max_pages)?;

        let mut png_buffers: Vec<Vec<u8>> = Vec::with_capacity(page_count);

        for index in 0..page_count {
            let render_failed = |message: String| RasterizeError::RenderFailed {
                page: index,
                message,
            };

            let page = doc
                .pages()
                .get(index as u16)
                .map_err(|e| render_failed(format!("page access failed: {e}")))?;

            let width = (page.width().value * dpi / 72.0) as i32;
            let height = (page.height().value * dpi / 72.0) as i32;

            let bitmap = page
                .render_with_config(
                    &PdfRenderConfig::new()
                        .set_target_width(width)
                        .set_target_height(height),
                )
                .map_err(|e| render_failed(e.to_string()))?;

            let mut png_bytes: Vec<u8> = Vec::new();
            bitmap
                .as_image()
                .write_to(&mut std::io::Cursor::new(&mut png_bytes), ImageFormat::Png)
                .map_err(|e| render_failed(format!("PNG encode failed: {e}")))?;

            png_buffers.push(png_bytes);
        }

        tracing::debug!(pages = png_buffers.len(), dpi, "PDF rasterization complete");
        Ok(png_buffers)
    }
}

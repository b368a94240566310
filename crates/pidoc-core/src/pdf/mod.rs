//! PDF access: native text extraction and the page-rendering seam.

mod extractor;

pub use extractor::PdfTextExtractor;

use image::DynamicImage;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// External capability that renders a PDF page to an image for OCR.
///
/// The core does not ship a renderer; callers plug in whatever backend
/// they run (pdfium, mupdf, a remote service).
pub trait PageRenderer {
    /// Render one page (1-indexed) at the given DPI.
    fn render(&self, data: &[u8], page: u32, dpi: u32) -> Result<DynamicImage>;
}

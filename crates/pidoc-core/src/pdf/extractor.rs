//! Native PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::debug;

use super::Result;
use crate::error::PdfError;

/// Extracts the embedded text layer of a PDF, page by page.
pub struct PdfTextExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Load a PDF from bytes. PDFs encrypted with an empty password are
    /// decrypted transparently.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    pub fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    /// Extract the text layer of the entire PDF.
    pub fn extract_text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Extract text split per page, in page order.
    ///
    /// pdf-extract emits form feeds at page boundaries; when that count
    /// does not line up with the page tree an even line split is used.
    pub fn page_texts(&self) -> Result<Vec<String>> {
        let full = self.extract_text()?;
        let count = self.page_count() as usize;
        if count == 0 {
            return Err(PdfError::NoPages);
        }

        let by_form_feed: Vec<&str> = full.split('\u{c}').collect();
        if by_form_feed.len() == count {
            return Ok(by_form_feed
                .into_iter()
                .map(|s| s.trim().to_string())
                .collect());
        }

        let lines: Vec<&str> = full.lines().collect();
        let per_page = (lines.len() / count).max(1);

        let mut pages = Vec::with_capacity(count);
        for idx in 0..count {
            let start = (idx * per_page).min(lines.len());
            let end = if idx + 1 == count {
                lines.len()
            } else {
                ((idx + 1) * per_page).min(lines.len())
            };
            pages.push(lines[start..end].join("\n").trim().to_string());
        }
        Ok(pages)
    }
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_new_has_no_pages() {
        let extractor = PdfTextExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
    }

    #[test]
    fn test_load_garbage_fails_with_parse_error() {
        let mut extractor = PdfTextExtractor::new();
        let err = extractor.load(b"not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }
}

//! TextSource resolution: native text layer vs OCR, per page.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{OcrError, Result};
use crate::models::config::{OcrConfig, PdfConfig};
use crate::models::document::{Document, DocumentKind, Page, PageSource};
use crate::ocr::{OcrEngine, normalize_ocr_noise};
use crate::pdf::{PageRenderer, PdfTextExtractor};

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref INVOICE_NO_SHAPE: Regex = Regex::new(r"\b[A-Z]{2,}/[A-Z]/\d{2}-\d{2}/\d+\b").unwrap();
    static ref GROUPED_AMOUNT: Regex = Regex::new(r"\d{1,3}(?:,\d{2,3})+(?:\.\d+)?").unwrap();
}

/// Keywords whose presence suggests the text is a usable customs page
/// rather than OCR garbage.
const QUALITY_KEYWORDS: &[&str] = &[
    "invoice",
    "consignee",
    "description of goods",
    "quantity",
    "terms of delivery",
    "specification",
    "storage",
    "temperature",
];

/// Structural quality score for resolved page text. Length-dominated,
/// with bonuses for domain keywords, an invoice-number-shaped token,
/// and grouped-digit amounts.
pub fn quality_score(text: &str) -> u32 {
    if text.trim().is_empty() {
        return 0;
    }
    let cleaned = WHITESPACE.replace_all(text, " ");
    let cleaned = cleaned.trim();

    let mut score = cleaned.chars().count() as u32;
    let lowered = cleaned.to_lowercase();
    score += QUALITY_KEYWORDS
        .iter()
        .filter(|kw| lowered.contains(*kw))
        .count() as u32
        * 80;
    if INVOICE_NO_SHAPE.is_match(cleaned) {
        score += 120;
    }
    if GROUPED_AMOUNT.is_match(cleaned) {
        score += 40;
    }
    score
}

/// Resolves every page of a document to plain text, deciding per page
/// between the native text layer and OCR.
pub struct PageResolver<'a> {
    pdf: PdfConfig,
    ocr: OcrConfig,
    engine: Option<&'a dyn OcrEngine>,
    renderer: Option<&'a dyn PageRenderer>,
}

impl<'a> PageResolver<'a> {
    pub fn new(pdf: PdfConfig, ocr: OcrConfig) -> Self {
        Self {
            pdf,
            ocr,
            engine: None,
            renderer: None,
        }
    }

    /// Plug in the external OCR collaborator pair.
    pub fn with_ocr(mut self, engine: &'a dyn OcrEngine, renderer: &'a dyn PageRenderer) -> Self {
        self.engine = Some(engine);
        self.renderer = Some(renderer);
        self
    }

    pub fn ocr_available(&self) -> bool {
        self.engine.is_some() && self.renderer.is_some()
    }

    /// Resolve a document with the force-OCR default of its kind.
    pub fn resolve(&self, kind: DocumentKind, data: &[u8]) -> Result<Document> {
        self.resolve_preferring(kind, data, self.ocr.force_for(kind))
    }

    /// Resolve a document with an explicit OCR preference, used to
    /// produce the OCR-oriented invoice candidate.
    pub fn resolve_preferring(
        &self,
        kind: DocumentKind,
        data: &[u8],
        prefer_ocr: bool,
    ) -> Result<Document> {
        let mut extractor = PdfTextExtractor::new();
        extractor.load(data)?;

        // A broken text layer is not fatal; OCR may still produce text.
        let mut native_pages = extractor.page_texts().unwrap_or_default();
        if native_pages.is_empty() {
            native_pages = vec![String::new(); extractor.page_count() as usize];
        }
        if self.pdf.max_pages > 0 && native_pages.len() > self.pdf.max_pages {
            native_pages.truncate(self.pdf.max_pages);
        }

        let pages = native_pages
            .into_iter()
            .enumerate()
            .map(|(idx, native)| self.resolve_page(data, idx as u32 + 1, native, prefer_ocr))
            .collect();

        let doc = Document::new(kind, pages);
        debug!(
            "resolved {}: {} pages, {} via OCR",
            kind.label(),
            doc.page_count(),
            doc.pages_ocrd()
        );
        Ok(doc)
    }

    fn resolve_page(&self, data: &[u8], number: u32, native: String, prefer_ocr: bool) -> Page {
        let insufficient = native.trim().chars().count() < self.pdf.min_native_chars;
        let should_ocr = prefer_ocr || insufficient;

        if !should_ocr || !self.ocr_available() {
            return Page {
                number,
                text: native,
                source: PageSource::Native,
            };
        }

        match self.ocr_page(data, number) {
            Ok(ocr_text) => {
                let native_score = quality_score(&native);
                let ocr_score = quality_score(&ocr_text);
                let take_ocr = if prefer_ocr {
                    ocr_score as f32 >= native_score as f32 * self.ocr.prefer_margin
                        && !ocr_text.trim().is_empty()
                } else {
                    ocr_score > native_score
                };

                if take_ocr {
                    Page {
                        number,
                        text: ocr_text,
                        source: PageSource::Ocr,
                    }
                } else {
                    Page {
                        number,
                        text: native,
                        source: PageSource::Native,
                    }
                }
            }
            Err(e) => {
                // OCR failure on one page means "no OCR text for this
                // page", never an aborted document.
                warn!("OCR failed on page {}: {}", number, e);
                Page {
                    number,
                    text: native,
                    source: PageSource::Native,
                }
            }
        }
    }

    fn ocr_page(&self, data: &[u8], number: u32) -> std::result::Result<String, OcrError> {
        let renderer = self.renderer.ok_or(OcrError::Unavailable)?;
        let engine = self.engine.ok_or(OcrError::Unavailable)?;

        let image = renderer
            .render(data, number, self.pdf.render_dpi)
            .map_err(|e| OcrError::Render(e.to_string()))?;
        let raw = engine.recognize(&image, &self.ocr.languages)?;
        Ok(normalize_ocr_noise(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_score_empty() {
        assert_eq!(quality_score(""), 0);
        assert_eq!(quality_score("   \n "), 0);
    }

    #[test]
    fn test_quality_score_rewards_keywords() {
        let plain = "some unrelated words here";
        let domain = "Invoice with Terms of Delivery and Quantity";
        assert!(quality_score(domain) > quality_score(plain));
    }

    #[test]
    fn test_quality_score_rewards_invoice_number_shape() {
        let with_no = "ref MS/E/25-26/102 follows";
        let without = "ref number follows here ok";
        assert!(quality_score(with_no) > quality_score(without) + 100);
    }

    #[test]
    fn test_quality_score_rewards_grouped_amounts() {
        let with_amount = "total 1,234.56 due";
        let without = "total amount is due";
        assert!(quality_score(with_amount) > quality_score(without));
    }
}

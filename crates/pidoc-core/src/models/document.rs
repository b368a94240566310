//! Source documents with their pages resolved to plain text.

use serde::{Deserialize, Serialize};

/// Category of an uploaded customs document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Proforma invoice (PI).
    Invoice,
    /// Material safety data sheet.
    Msds,
    /// Product specification.
    Specification,
}

impl DocumentKind {
    /// Short lowercase label used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Msds => "msds",
            DocumentKind::Specification => "specification",
        }
    }
}

/// How the text of a page was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSource {
    /// Text taken from the PDF's embedded text layer.
    Native,
    /// Text recognized from a rendered page image.
    Ocr,
}

/// One resolved page of a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed).
    pub number: u32,
    /// Resolved plain text (may be empty when both paths failed).
    pub text: String,
    /// Which path produced the text.
    pub source: PageSource,
}

impl Page {
    pub fn used_ocr(&self) -> bool {
        self.source == PageSource::Ocr
    }
}

/// An uploaded document with its pages resolved to plain text.
///
/// Pages are resolved once at construction and the document is
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    kind: DocumentKind,
    pages: Vec<Page>,
}

impl Document {
    pub fn new(kind: DocumentKind, pages: Vec<Page>) -> Self {
        Self { kind, pages }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of pages whose text came from OCR.
    pub fn pages_ocrd(&self) -> usize {
        self.pages.iter().filter(|p| p.used_ocr()).count()
    }

    /// Full document text, pages joined in source order.
    pub fn text(&self) -> String {
        let parts: Vec<&str> = self
            .pages
            .iter()
            .map(|p| p.text.trim())
            .filter(|t| !t.is_empty())
            .collect();
        parts.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: u32, text: &str, source: PageSource) -> Page {
        Page {
            number,
            text: text.to_string(),
            source,
        }
    }

    #[test]
    fn test_text_preserves_page_order() {
        let doc = Document::new(
            DocumentKind::Invoice,
            vec![
                page(1, "first", PageSource::Native),
                page(2, "", PageSource::Native),
                page(3, "third", PageSource::Ocr),
            ],
        );

        assert_eq!(doc.text(), "first\n\nthird");
        assert_eq!(doc.pages_ocrd(), 1);
        assert_eq!(doc.page_count(), 3);
    }
}

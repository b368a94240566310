//! OCR collaborator seam and OCR-noise cleanup.

use image::DynamicImage;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::OcrError;

/// Result type for OCR operations.
pub type Result<T> = std::result::Result<T, OcrError>;

/// External OCR capability: rendered page image in, recognized text out.
///
/// The core never ships an engine of its own. A blocking call per page;
/// failures are recovered by the resolver as "no text from this page".
pub trait OcrEngine {
    /// Recognize text on a page image. `languages` is a hint in the
    /// engine's own convention (e.g. "eng+rus").
    fn recognize(&self, image: &DynamicImage, languages: &str) -> Result<String>;
}

lazy_static! {
    static ref SPACE_RUNS: Regex = Regex::new(r"[ \t]{2,}").unwrap();
}

/// Clean up artifacts common to OCR output before parsing: mojibake
/// apostrophes, collapsed currency markers, runs of spaces. Newlines
/// are kept so line-oriented parsing still works.
pub fn normalize_ocr_noise(text: &str) -> String {
    let text = text.replace("â€™", "'");
    let text = text.replace("(In INR)", "INR)").replace("INR)", "(In INR)");
    SPACE_RUNS.replace_all(&text, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_space_runs_but_keeps_lines() {
        let noisy = "INVOICE   NO:  123\nTotal\t\t10.00";
        assert_eq!(normalize_ocr_noise(noisy), "INVOICE NO: 123\nTotal 10.00");
    }

    #[test]
    fn test_normalize_repairs_currency_marker() {
        assert_eq!(normalize_ocr_noise("Amount INR)"), "Amount (In INR)");
        assert_eq!(normalize_ocr_noise("Amount (In INR)"), "Amount (In INR)");
    }
}

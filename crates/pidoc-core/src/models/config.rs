//! Configuration structures for the extraction pipeline.
//!
//! The score weighting and the OCR sufficiency threshold are heuristics
//! tuned against sample documents; they live here so deployments can
//! adjust them without code changes.

use serde::{Deserialize, Serialize};

use super::document::DocumentKind;

/// Main configuration for the pidoc pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PidocConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR fallback configuration.
    pub ocr: OcrConfig,

    /// Candidate scoring/selection configuration.
    pub extraction: ExtractionConfig,

    /// Output document templates.
    pub template: TemplateConfig,
}

/// Paths to output document templates. When unset the built-in plain
/// layouts are generated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Price-list template file with `{{PLACEHOLDER}}` keys.
    pub price_list: Option<std::path::PathBuf>,

    /// Transport-label template file.
    pub label: Option<std::path::PathBuf>,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering pages handed to OCR.
    pub render_dpi: u32,

    /// Maximum pages to resolve per document (0 = unlimited).
    pub max_pages: usize,

    /// Native text shorter than this (per page, trimmed) triggers the
    /// OCR fallback even when force-OCR is off.
    pub min_native_chars: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            max_pages: 0,
            min_native_chars: 60,
        }
    }
}

/// OCR fallback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Always attempt OCR on invoice pages and keep the OCR text when
    /// it scores at least `prefer_margin` of the native score.
    pub force_invoice: bool,

    /// Same policy for MSDS pages.
    pub force_msds: bool,

    /// Same policy for specification pages.
    pub force_specification: bool,

    /// When force-OCR is set, OCR text wins if its quality score is at
    /// least this fraction of the native score.
    pub prefer_margin: f32,

    /// Language hint passed to the OCR collaborator.
    pub languages: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            force_invoice: true,
            force_msds: false,
            force_specification: false,
            prefer_margin: 0.8,
            languages: "eng+rus".to_string(),
        }
    }
}

impl OcrConfig {
    /// Force-OCR flag for a document category.
    pub fn force_for(&self, kind: DocumentKind) -> bool {
        match kind {
            DocumentKind::Invoice => self.force_invoice,
            DocumentKind::Msds => self.force_msds,
            DocumentKind::Specification => self.force_specification,
        }
    }
}

/// Candidate scoring and selection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Completeness score weights.
    pub weights: ScoreWeights,

    /// Fraction of position rows whose numeric fields must parse
    /// cleanly for the position block to earn its full weight.
    pub min_clean_row_fraction: f32,

    /// Relative tolerance for quantity x unit price = total price.
    pub price_tolerance: f32,

    /// Currency assumed when none is detected (empty = leave blank).
    pub default_currency: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            min_clean_row_fraction: 0.5,
            price_tolerance: 0.02,
            default_currency: String::new(),
        }
    }
}

/// Weights of the completeness score. Values are relative; the final
/// score is normalized to [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub invoice_no: f32,
    pub invoice_date: f32,
    pub buyer_name: f32,
    pub terms_of_delivery: f32,
    pub has_positions: f32,
    pub clean_rows: f32,
    pub consistency: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            invoice_no: 3.0,
            invoice_date: 2.0,
            buyer_name: 1.0,
            terms_of_delivery: 2.0,
            has_positions: 2.0,
            clean_rows: 4.0,
            consistency: 2.0,
        }
    }
}

impl ScoreWeights {
    /// Sum of all weights, used to normalize scores to [0, 1].
    pub fn total(&self) -> f32 {
        self.invoice_no
            + self.invoice_date
            + self.buyer_name
            + self.terms_of_delivery
            + self.has_positions
            + self.clean_rows
            + self.consistency
    }
}

impl PidocConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| crate::error::PidocError::Config(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::error::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::PidocError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_force_ocr_only_for_invoice() {
        let config = OcrConfig::default();
        assert!(config.force_for(DocumentKind::Invoice));
        assert!(!config.force_for(DocumentKind::Msds));
        assert!(!config.force_for(DocumentKind::Specification));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = PidocConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: PidocConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pdf.min_native_chars, config.pdf.min_native_chars);
        assert_eq!(back.extraction.weights.total(), config.extraction.weights.total());
    }
}

//! End-to-end extraction pipeline.
//!
//! The invoice drives everything: it is resolved to text, parsed by
//! every strategy, and the best-scoring candidate wins. Specification
//! and MSDS documents are optional overlays; a failure to read either
//! degrades to a warning, never to a failed extraction.

use tracing::{info, warn};

use crate::error::Result;
use crate::extract::{
    CandidateScorer, MsdsFields, SpecificationFields, merge, normalize, parse_invoice, parse_msds,
    parse_specification,
};
use crate::models::config::PidocConfig;
use crate::models::document::DocumentKind;
use crate::models::record::{NormalizedRecord, ParseCandidate, Strategy};
use crate::ocr::OcrEngine;
use crate::pdf::PageRenderer;
use crate::resolve::PageResolver;

/// Diagnostics from one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionReport {
    /// Best score among native-strategy candidates.
    pub native_score: f32,
    /// Best score among OCR-strategy candidates.
    pub ocr_score: f32,
    pub selected_strategy: Strategy,
    pub selected_score: f32,
    /// True when no candidate scored above zero; the record is blank
    /// and meant to be filled in by hand.
    pub extraction_failed: bool,
    pub page_count: usize,
    pub pages_ocrd: usize,
    pub warnings: Vec<String>,
}

/// The normalized record plus how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome {
    pub record: NormalizedRecord,
    pub report: ExtractionReport,
}

pub struct ExtractionPipeline<'a> {
    config: PidocConfig,
    resolver: PageResolver<'a>,
}

impl<'a> ExtractionPipeline<'a> {
    pub fn new(config: PidocConfig) -> Self {
        let resolver = PageResolver::new(config.pdf.clone(), config.ocr.clone());
        Self { config, resolver }
    }

    /// Plug in the OCR collaborators. Without them every page falls
    /// back to the native text layer.
    pub fn with_ocr(mut self, engine: &'a dyn OcrEngine, renderer: &'a dyn PageRenderer) -> Self {
        self.resolver = self.resolver.with_ocr(engine, renderer);
        self
    }

    /// Run extraction on raw PDF bytes.
    pub fn run(
        &self,
        invoice: &[u8],
        msds: Option<&[u8]>,
        specification: Option<&[u8]>,
    ) -> Result<ExtractionOutcome> {
        let mut warnings = Vec::new();

        let native_doc = self.resolver.resolve_preferring(DocumentKind::Invoice, invoice, false)?;
        let mut candidates = vec![
            parse_invoice(&native_doc.text(), Strategy::Native),
            parse_invoice(&native_doc.text(), Strategy::Ocr),
        ];

        let mut page_count = native_doc.page_count();
        let mut pages_ocrd = native_doc.pages_ocrd();
        if self.config.ocr.force_for(DocumentKind::Invoice) && self.resolver.ocr_available() {
            let ocr_doc = self.resolver.resolve_preferring(DocumentKind::Invoice, invoice, true)?;
            pages_ocrd = pages_ocrd.max(ocr_doc.pages_ocrd());
            page_count = page_count.max(ocr_doc.page_count());
            candidates.push(parse_invoice(&ocr_doc.text(), Strategy::Ocr));
        }

        let spec_fields = match specification {
            Some(data) => match self.resolver.resolve(DocumentKind::Specification, data) {
                Ok(doc) => parse_specification(&doc.text()),
                Err(e) => {
                    warn!("specification unreadable: {}", e);
                    warnings.push(format!("specification unreadable: {}", e));
                    SpecificationFields::default()
                }
            },
            None => SpecificationFields::default(),
        };
        let msds_fields = match msds {
            Some(data) => match self.resolver.resolve(DocumentKind::Msds, data) {
                Ok(doc) => parse_msds(&doc.text()),
                Err(e) => {
                    warn!("MSDS unreadable: {}", e);
                    warnings.push(format!("MSDS unreadable: {}", e));
                    MsdsFields::default()
                }
            },
            None => MsdsFields::default(),
        };

        let mut outcome = self.finish(candidates, &spec_fields, &msds_fields, warnings);
        outcome.report.page_count = page_count;
        outcome.report.pages_ocrd = pages_ocrd;
        Ok(outcome)
    }

    /// Run extraction on already-resolved text, bypassing PDF and OCR.
    pub fn run_on_text(
        &self,
        invoice_text: &str,
        msds_text: Option<&str>,
        specification_text: Option<&str>,
    ) -> ExtractionOutcome {
        let candidates = vec![
            parse_invoice(invoice_text, Strategy::Native),
            parse_invoice(invoice_text, Strategy::Ocr),
        ];
        let spec_fields = specification_text
            .map(parse_specification)
            .unwrap_or_default();
        let msds_fields = msds_text.map(parse_msds).unwrap_or_default();
        self.finish(candidates, &spec_fields, &msds_fields, Vec::new())
    }

    fn finish(
        &self,
        candidates: Vec<ParseCandidate>,
        spec_fields: &SpecificationFields,
        msds_fields: &MsdsFields,
        warnings: Vec<String>,
    ) -> ExtractionOutcome {
        let scorer = CandidateScorer::new(self.config.extraction.clone());
        let (selected, scored) = scorer.select(candidates);

        let best_for = |strategy: Strategy| {
            scored
                .iter()
                .filter(|s| s.strategy == strategy)
                .map(|s| s.score)
                .fold(0.0f32, f32::max)
        };
        let selected_score = scored
            .iter()
            .filter(|s| s.strategy == selected.strategy)
            .map(|s| s.score)
            .fold(0.0f32, f32::max);

        let extraction_failed = selected.is_empty();
        let mut merged = merge(selected, spec_fields, msds_fields);
        if merged.currency.is_empty() && !self.config.extraction.default_currency.is_empty() {
            merged.currency = self.config.extraction.default_currency.clone();
            for position in &mut merged.positions {
                if position.currency.is_empty() {
                    position.currency = merged.currency.clone();
                }
            }
        }
        let record = normalize(&merged);

        let report = ExtractionReport {
            native_score: best_for(Strategy::Native),
            ocr_score: best_for(Strategy::Ocr),
            selected_strategy: merged.strategy,
            selected_score,
            extraction_failed,
            page_count: 0,
            pages_ocrd: 0,
            warnings,
        };
        info!(
            "extraction finished: strategy={:?} score={:.3} failed={}",
            report.selected_strategy, report.selected_score, report.extraction_failed
        );

        ExtractionOutcome { record, report }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::TemperatureRange;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const INVOICE: &str = "\
PROFORMA INVOICE (In USD)
Invoice No. & Date
MS/E/25-26/102 dt 26-Feb-26
Consignee:
TOO MedImport
12 Abay Avenue
Terms of Delivery: CPT Almaty
Description of Goods
Drug A  100 pcs  10.00 USD  1000.00 USD
Drug B  50 pcs  25.00 USD  1250.00 USD";

    fn pipeline() -> ExtractionPipeline<'static> {
        ExtractionPipeline::new(PidocConfig::default())
    }

    #[test]
    fn test_text_pipeline_extracts_record() {
        let outcome = pipeline().run_on_text(INVOICE, None, None);
        let record = &outcome.record;
        assert_eq!(record.invoice_no, "MS/E/25-26/102");
        assert_eq!(record.invoice_date, NaiveDate::from_ymd_opt(2026, 2, 26));
        assert_eq!(record.buyer_name, "TOO MedImport");
        assert_eq!(record.positions.len(), 2);
        assert!(!outcome.report.extraction_failed);
        assert!(outcome.report.selected_score > 0.8);
    }

    #[test]
    fn test_tie_between_strategies_selects_native() {
        let outcome = pipeline().run_on_text(INVOICE, None, None);
        assert_eq!(outcome.report.selected_strategy, Strategy::Native);
        assert_eq!(outcome.report.native_score, outcome.report.ocr_score);
    }

    #[test]
    fn test_msds_overlay_sets_storage() {
        let msds = "Section 7\nStorage: Store at 2-8°C away from light";
        let outcome = pipeline().run_on_text(INVOICE, Some(msds), None);
        assert_eq!(
            outcome.record.storage_temperature,
            TemperatureRange::Cold
        );
    }

    #[test]
    fn test_specification_overlay_fills_blanks() {
        let spec = "\
SPECIFICATION No. 7 to contract DT: 26.02.2026
Period of Validity: 12 months";
        let outcome = pipeline().run_on_text(INVOICE, None, Some(spec));
        assert_eq!(outcome.record.period_of_validity, "12 months");
        assert_eq!(
            outcome.record.specification_date,
            NaiveDate::from_ymd_opt(2026, 2, 26)
        );
    }

    #[test]
    fn test_garbage_text_yields_blank_record() {
        let outcome = pipeline().run_on_text("nothing useful here", None, None);
        assert!(outcome.report.extraction_failed);
        assert!(outcome.record.is_blank());
        assert_eq!(outcome.report.selected_score, 0.0);
    }
}

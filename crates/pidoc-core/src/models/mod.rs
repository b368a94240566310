//! Data models for documents, extraction candidates, and configuration.

pub mod config;
pub mod document;
pub mod record;

pub use config::{ExtractionConfig, OcrConfig, PdfConfig, PidocConfig, ScoreWeights, TemplateConfig};
pub use document::{Document, DocumentKind, Page, PageSource};
pub use record::{
    NormalizedRecord, ParseCandidate, Position, RawPosition, Strategy, TemperatureRange,
};

//! Extraction core for customs document preparation.
//!
//! Takes a pharmaceutical export document set (Proforma Invoice plus
//! optional MSDS and Specification PDFs) and produces a normalized
//! record of header fields and product positions, ready for review and
//! for rendering into price lists and transport labels.
//!
//! The pipeline per invoice:
//!
//! 1. resolve every page to text, choosing between the native PDF text
//!    layer and OCR by a structural quality score;
//! 2. parse the text with several rule strategies, each producing a
//!    full candidate;
//! 3. score the candidates and keep the best one;
//! 4. overlay fields contributed by the MSDS and Specification;
//! 5. normalize into typed values, flagging anything unparseable for
//!    manual review;
//! 6. group positions by storage temperature and render the output
//!    documents.
//!
//! OCR itself is a collaborator: implement [`ocr::OcrEngine`] and
//! [`pdf::PageRenderer`] and hand them to the pipeline. Without them
//! the pipeline still works from native text layers alone.

pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod render;
pub mod resolve;

pub use error::{PidocError, Result};
pub use models::config::PidocConfig;
pub use models::document::{Document, DocumentKind, Page, PageSource};
pub use models::record::{NormalizedRecord, ParseCandidate, Position, Strategy, TemperatureRange};
pub use pipeline::{ExtractionOutcome, ExtractionPipeline, ExtractionReport};

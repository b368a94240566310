//! Extraction data models: parse candidates, positions, normalized records.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Parsing strategy that produced a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Rules tuned for the clean layout of a native text layer.
    #[default]
    Native,
    /// Rules tolerant of OCR noise: broken lines, merged columns,
    /// inconsistent spacing.
    Ocr,
}

/// One product row as captured by a parsing strategy, before any
/// normalization. All fields are raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPosition {
    pub code: String,
    pub name_en: String,
    pub name_ru: String,
    pub quantity: String,
    pub unit: String,
    pub unit_price: String,
    pub total_price: String,
    pub currency: String,
    pub packing_en: String,
    pub packing_ru: String,
    /// Row-level temperature phrase, when the source states one.
    pub storage_temperature: String,
}

/// One full structured extraction attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseCandidate {
    pub strategy: Strategy,
    pub invoice_no: String,
    pub invoice_date: String,
    pub buyer_name: String,
    pub buyer_address: String,
    pub exporter_name: String,
    pub exporter_name_ru: String,
    pub exporter_address: String,
    pub terms_of_delivery: String,
    pub period_of_validity: String,
    pub specification_date: String,
    /// Raw storage temperature phrase, usually merged in from the MSDS.
    pub storage_temperature: String,
    pub currency: String,
    pub positions: Vec<RawPosition>,
}

impl ParseCandidate {
    /// Placeholder candidate returned when no structure could be found.
    pub fn empty(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// True when no header field was captured and no positions exist.
    pub fn is_empty(&self) -> bool {
        self.invoice_no.is_empty()
            && self.invoice_date.is_empty()
            && self.buyer_name.is_empty()
            && self.exporter_name.is_empty()
            && self.terms_of_delivery.is_empty()
            && self.positions.iter().all(|p| {
                p.code.is_empty() && p.name_en.is_empty() && p.quantity.is_empty()
            })
    }
}

/// Canonical storage temperature range used for label grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureRange {
    /// -25C to -15C, frozen chain.
    Frozen,
    /// +2C to +8C, cold chain.
    Cold,
    /// +8C to +15C, cool storage.
    Cool,
    /// +15C to +25C, controlled room temperature. The default.
    Ambient,
    /// "Store below +25C" style caps with no lower bound.
    BelowAmbient,
    /// Recognized temperature phrase that fits no canonical bucket.
    Other(String),
}

impl TemperatureRange {
    /// Canonical range string used as the grouping key and in labels.
    pub fn canonical(&self) -> String {
        match self {
            TemperatureRange::Frozen => "-25C to -15C frozen".to_string(),
            TemperatureRange::Cold => "+2C to +8C cold chain".to_string(),
            TemperatureRange::Cool => "+8C to +15C cool".to_string(),
            TemperatureRange::Ambient => "+15C to +25C ambient".to_string(),
            TemperatureRange::BelowAmbient => "below +25C".to_string(),
            TemperatureRange::Other(raw) => raw.clone(),
        }
    }
}

impl Default for TemperatureRange {
    fn default() -> Self {
        TemperatureRange::Ambient
    }
}

impl fmt::Display for TemperatureRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// One line item of the normalized record. Numeric fields that failed
/// to parse stay `None` and are flagged for manual review; they are
/// never defaulted to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub code: String,
    pub name_en: String,
    pub name_ru: String,
    pub quantity: Option<Decimal>,
    pub unit: String,
    pub unit_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
    /// ISO-4217 code when recognized, otherwise the raw captured token.
    pub currency: String,
    pub packing_en: String,
    pub packing_ru: String,
    /// Overrides the record-level temperature when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_temperature: Option<TemperatureRange>,
}

impl Position {
    /// Temperature used for label grouping: own value, else the
    /// record-level fallback.
    pub fn effective_temperature(&self, record_default: &TemperatureRange) -> TemperatureRange {
        self.storage_temperature
            .clone()
            .unwrap_or_else(|| record_default.clone())
    }
}

/// The selected candidate after normalization: numeric fields typed,
/// dates canonical, storage temperature always resolved.
///
/// Mutable only through the external user-review step, which may
/// overwrite any field before handoff to rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub invoice_no: String,
    pub invoice_date: Option<NaiveDate>,
    pub buyer_name: String,
    pub buyer_address: String,
    pub exporter_name: String,
    pub exporter_name_ru: String,
    pub exporter_address: String,
    pub terms_of_delivery: String,
    pub period_of_validity: String,
    pub specification_date: Option<NaiveDate>,
    pub storage_temperature: TemperatureRange,
    pub currency: String,
    pub positions: Vec<Position>,
    /// Names of fields that failed to parse and need manual review.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub review_flags: Vec<String>,
}

impl NormalizedRecord {
    /// True when nothing usable was extracted; the caller surfaces this
    /// as a fully-editable blank form.
    pub fn is_blank(&self) -> bool {
        self.invoice_no.is_empty()
            && self.invoice_date.is_none()
            && self.buyer_name.is_empty()
            && self.positions.is_empty()
    }
}

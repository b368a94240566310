//! Output document rendering: price lists and transport labels.
//!
//! Templates are plain text with `{{KEY}}` placeholders. Substitution
//! runs in two passes: explicit placeholders first, then semantic
//! labels ("Invoice No: ____") for templates that predate the
//! placeholder convention. A template where neither pass replaces
//! anything is reported as a fallback and the built-in layout is used
//! instead, so a stale template never produces an empty document.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::extract::TemperatureGroup;
use crate::extract::rules::{format_amount, format_date};
use crate::models::record::{NormalizedRecord, Position};

lazy_static! {
    static ref UNRESOLVED: Regex = Regex::new(r"\{\{[A-Z0-9_]+\}\}").unwrap();
}

/// One substitution pass over a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstitutionPass {
    /// `{{KEY}}` placeholders.
    Placeholders,
    /// Labeled blanks such as "Invoice No: ____".
    SemanticLabels,
}

/// Pass order is part of the contract: placeholders always win over
/// semantic matches on the same text.
pub const SUBSTITUTION_PASSES: [SubstitutionPass; 2] =
    [SubstitutionPass::Placeholders, SubstitutionPass::SemanticLabels];

/// Result of rendering one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// The template was used; `replaced` counts substitutions made.
    Applied { text: String, replaced: usize },
    /// The template matched nothing (or none was given) and the
    /// built-in layout was generated instead.
    Fallback { text: String },
}

impl Rendered {
    pub fn text(&self) -> &str {
        match self {
            Rendered::Applied { text, .. } => text,
            Rendered::Fallback { text } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Rendered::Fallback { .. })
    }
}

/// Labels recognized by the semantic pass, mapped to context keys.
const SEMANTIC_LABELS: &[(&str, &str)] = &[
    ("Invoice No", "INVOICE_NO"),
    ("Invoice Date", "INVOICE_DATE"),
    ("Consignee", "BUYER_NAME"),
    ("Buyer", "BUYER_NAME"),
    ("Exporter", "EXPORTER_NAME"),
    ("Terms of Delivery", "TERMS_OF_DELIVERY"),
    ("Period of Validity", "PERIOD_OF_VALIDITY"),
    ("Specification Date", "SPECIFICATION_DATE"),
    ("Storage", "STORAGE_TEMPERATURE"),
    ("Product Name", "POSITION_1_NAME_EN"),
];

/// Context for the price-list document.
pub fn price_list_context(record: &NormalizedRecord) -> BTreeMap<String, String> {
    let mut ctx = base_context(record);
    ctx.insert("POSITIONS_TABLE".to_string(), positions_table(&record.positions));
    ctx.insert("TOTAL_AMOUNT".to_string(), total_amount(&record.positions));
    for (idx, position) in record.positions.iter().enumerate() {
        insert_position(&mut ctx, idx + 1, position);
    }
    ctx
}

/// Context for one temperature group's transport label.
pub fn label_context(record: &NormalizedRecord, group: &TemperatureGroup) -> BTreeMap<String, String> {
    let mut ctx = base_context(record);
    ctx.insert(
        "STORAGE_TEMPERATURE".to_string(),
        group.temperature.canonical(),
    );
    ctx.insert("POSITIONS_TABLE".to_string(), positions_table(&group.positions));
    for (slot, (number, position)) in group.numbers.iter().zip(&group.positions).enumerate() {
        // Both numberings are exposed: slot within the label and the
        // position's number in the source record.
        insert_position(&mut ctx, slot + 1, position);
        ctx.insert(
            format!("POSITION_{}_SOURCE_NO", slot + 1),
            number.to_string(),
        );
    }
    ctx
}

/// Apply the substitution passes; fall back to `default_text` when the
/// template produced no substitutions at all.
pub fn substitute(
    template: &str,
    context: &BTreeMap<String, String>,
    default_text: String,
) -> Rendered {
    let mut text = template.to_string();
    let mut replaced = 0usize;

    for pass in SUBSTITUTION_PASSES {
        match pass {
            SubstitutionPass::Placeholders => {
                for (key, value) in context {
                    let placeholder = format!("{{{{{}}}}}", key);
                    let hits = text.matches(&placeholder).count();
                    if hits > 0 && !value.is_empty() {
                        text = text.replace(&placeholder, value);
                        replaced += hits;
                    }
                }
            }
            SubstitutionPass::SemanticLabels => {
                for (label, key) in SEMANTIC_LABELS {
                    let Some(value) = context.get(*key).filter(|v| !v.is_empty()) else {
                        continue;
                    };
                    let pattern = format!(
                        r"(?im)^(?P<label>[ \t]*{}\.?[ \t]*[:\-][ \t]*)(?:_{{2,}}|\.{{4,}})?[ \t]*$",
                        regex::escape(label)
                    );
                    // Label set is fixed; these always compile.
                    let Ok(re) = Regex::new(&pattern) else {
                        continue;
                    };
                    let hits = re.find_iter(&text).count();
                    if hits > 0 {
                        text = re
                            .replace_all(&text, format!("${{label}}{}", value))
                            .into_owned();
                        replaced += hits;
                    }
                }
            }
        }
    }

    if replaced == 0 {
        warn!("template produced no substitutions, using built-in layout");
        return Rendered::Fallback { text: default_text };
    }

    // Unmatched placeholders are cleared rather than shipped.
    text = UNRESOLVED.replace_all(&text, "").into_owned();
    debug!("template applied with {} substitutions", replaced);
    Rendered::Applied { text, replaced }
}

/// Render the price list, through the template when one is given.
pub fn render_price_list(record: &NormalizedRecord, template: Option<&str>) -> Rendered {
    let default_text = default_price_list(record);
    match template {
        Some(template) => {
            let ctx = price_list_context(record);
            substitute(template, &ctx, default_text)
        }
        None => Rendered::Fallback { text: default_text },
    }
}

/// Render one transport label, through the template when one is given.
pub fn render_label(
    record: &NormalizedRecord,
    group: &TemperatureGroup,
    template: Option<&str>,
) -> Rendered {
    let default_text = default_label(record, group);
    match template {
        Some(template) => {
            let ctx = label_context(record, group);
            substitute(template, &ctx, default_text)
        }
        None => Rendered::Fallback { text: default_text },
    }
}

fn base_context(record: &NormalizedRecord) -> BTreeMap<String, String> {
    let mut ctx = BTreeMap::new();
    ctx.insert("INVOICE_NO".to_string(), record.invoice_no.clone());
    ctx.insert(
        "INVOICE_DATE".to_string(),
        record.invoice_date.map(format_date).unwrap_or_default(),
    );
    ctx.insert("BUYER_NAME".to_string(), record.buyer_name.clone());
    ctx.insert("BUYER_ADDRESS".to_string(), record.buyer_address.clone());
    ctx.insert("EXPORTER_NAME".to_string(), record.exporter_name.clone());
    ctx.insert("EXPORTER_NAME_RU".to_string(), record.exporter_name_ru.clone());
    ctx.insert("EXPORTER_ADDRESS".to_string(), record.exporter_address.clone());
    ctx.insert(
        "TERMS_OF_DELIVERY".to_string(),
        record.terms_of_delivery.clone(),
    );
    ctx.insert(
        "PERIOD_OF_VALIDITY".to_string(),
        record.period_of_validity.clone(),
    );
    ctx.insert(
        "SPECIFICATION_DATE".to_string(),
        record.specification_date.map(format_date).unwrap_or_default(),
    );
    ctx.insert(
        "STORAGE_TEMPERATURE".to_string(),
        record.storage_temperature.canonical(),
    );
    ctx.insert("CURRENCY".to_string(), record.currency.clone());
    ctx.insert("COMPANY_INFO".to_string(), company_info(record));
    ctx
}

fn insert_position(ctx: &mut BTreeMap<String, String>, number: usize, position: &Position) {
    let mut put = |attr: &str, value: String| {
        ctx.insert(format!("POSITION_{}_{}", number, attr), value);
    };
    put("CODE", position.code.clone());
    put("NAME_EN", position.name_en.clone());
    put("NAME_RU", position.name_ru.clone());
    put("QTY", position.quantity.map(format_amount).unwrap_or_default());
    put("UNIT", position.unit.clone());
    put(
        "UNIT_PRICE",
        position.unit_price.map(format_amount).unwrap_or_default(),
    );
    put(
        "TOTAL_PRICE",
        position.total_price.map(format_amount).unwrap_or_default(),
    );
    put("CURRENCY", position.currency.clone());
    put("PACKING_EN", position.packing_en.clone());
    put("PACKING_RU", position.packing_ru.clone());
    put(
        "TEMPERATURE",
        position
            .storage_temperature
            .as_ref()
            .map(|t| t.canonical())
            .unwrap_or_default(),
    );
}

/// Pipe-joined position rows, one line per position.
fn positions_table(positions: &[Position]) -> String {
    positions
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let name = if p.name_en.is_empty() { &p.code } else { &p.name_en };
            format!(
                "{} | {} | {} {} | {} | {} | {}",
                idx + 1,
                name,
                p.quantity.map(format_amount).unwrap_or_default(),
                p.unit,
                p.unit_price.map(format_amount).unwrap_or_default(),
                p.total_price.map(format_amount).unwrap_or_default(),
                p.currency,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn total_amount(positions: &[Position]) -> String {
    let total: Decimal = positions.iter().filter_map(|p| p.total_price).sum();
    format_amount(total)
}

fn company_info(record: &NormalizedRecord) -> String {
    let mut parts = Vec::new();
    if !record.exporter_name.is_empty() {
        parts.push(record.exporter_name.clone());
    }
    if !record.exporter_name_ru.is_empty() {
        parts.push(record.exporter_name_ru.clone());
    }
    if !record.exporter_address.is_empty() {
        parts.push(record.exporter_address.clone());
    }
    parts.join("\n")
}

/// Built-in price-list layout.
pub fn default_price_list(record: &NormalizedRecord) -> String {
    let date = record.invoice_date.map(format_date).unwrap_or_default();
    let mut out = String::new();
    out.push_str("PRICE LIST\n");
    out.push_str(&format!(
        "To Proforma Invoice {} dated {}\n\n",
        record.invoice_no, date
    ));
    out.push_str(&company_info(record));
    out.push_str("\n\n");
    out.push_str(&positions_table(&record.positions));
    out.push_str(&format!(
        "\n\nTotal: {} {}\n",
        total_amount(&record.positions),
        record.currency
    ));
    if !record.terms_of_delivery.is_empty() {
        out.push_str(&format!("Terms of delivery: {}\n", record.terms_of_delivery));
    }
    if !record.period_of_validity.is_empty() {
        out.push_str(&format!("Period of validity: {}\n", record.period_of_validity));
    }
    out.push_str(&format!("Storage: {}\n", record.storage_temperature.canonical()));
    out
}

/// Built-in transport-label layout for one temperature group.
pub fn default_label(record: &NormalizedRecord, group: &TemperatureGroup) -> String {
    let mut out = String::new();
    out.push_str("TRANSPORT LABEL\n");
    out.push_str(&format!("Invoice: {}\n", record.invoice_no));
    if !record.buyer_name.is_empty() {
        out.push_str(&format!("Consignee: {}\n", record.buyer_name));
    }
    out.push_str(&format!("Storage: {}\n\n", group.temperature.canonical()));
    for (number, position) in group.numbers.iter().zip(&group.positions) {
        let name = if position.name_en.is_empty() {
            &position.code
        } else {
            &position.name_en
        };
        let qty = position.quantity.map(format_amount).unwrap_or_default();
        out.push_str(&format!("{}. {} {} {}\n", number, name, qty, position.unit));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::group_by_temperature;
    use crate::models::record::TemperatureRange;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn record() -> NormalizedRecord {
        NormalizedRecord {
            invoice_no: "MS/E/25-26/102".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2026, 2, 26),
            buyer_name: "TOO MedImport".to_string(),
            exporter_name: "Sunrise Pharma".to_string(),
            terms_of_delivery: "CPT Almaty".to_string(),
            currency: "USD".to_string(),
            positions: vec![
                Position {
                    name_en: "Drug A".to_string(),
                    quantity: Some(Decimal::from_str("100").unwrap()),
                    unit: "pcs".to_string(),
                    unit_price: Some(Decimal::from_str("10.00").unwrap()),
                    total_price: Some(Decimal::from_str("1000.00").unwrap()),
                    currency: "USD".to_string(),
                    storage_temperature: Some(TemperatureRange::Cold),
                    ..Position::default()
                },
                Position {
                    name_en: "Drug B".to_string(),
                    quantity: Some(Decimal::from_str("50").unwrap()),
                    unit: "pcs".to_string(),
                    unit_price: Some(Decimal::from_str("25.00").unwrap()),
                    total_price: Some(Decimal::from_str("1250.00").unwrap()),
                    currency: "USD".to_string(),
                    ..Position::default()
                },
            ],
            ..NormalizedRecord::default()
        }
    }

    #[test]
    fn test_placeholder_pass() {
        let template = "Invoice {{INVOICE_NO}} of {{INVOICE_DATE}} total {{TOTAL_AMOUNT}}";
        let rendered = render_price_list(&record(), Some(template));
        assert_eq!(
            rendered.text(),
            "Invoice MS/E/25-26/102 of 26.02.2026 total 2,250.00"
        );
        assert!(!rendered.is_fallback());
    }

    #[test]
    fn test_semantic_pass_fills_labeled_blanks() {
        let template = "Invoice No: ____\nStorage: ____";
        let rendered = render_price_list(&record(), Some(template));
        assert_eq!(
            rendered.text(),
            "Invoice No: MS/E/25-26/102\nStorage: +15C to +25C ambient"
        );
    }

    #[test]
    fn test_unresolved_placeholders_are_cleared() {
        let template = "{{INVOICE_NO}} / {{NO_SUCH_KEY}}";
        let rendered = render_price_list(&record(), Some(template));
        assert_eq!(rendered.text(), "MS/E/25-26/102 / ");
    }

    #[test]
    fn test_template_with_no_matches_falls_back() {
        let rendered = render_price_list(&record(), Some("static text only"));
        assert!(rendered.is_fallback());
        assert!(rendered.text().contains("PRICE LIST"));
        assert!(rendered.text().contains("Drug A"));
    }

    #[test]
    fn test_no_template_uses_builtin_layout() {
        let rendered = render_price_list(&record(), None);
        assert!(rendered.is_fallback());
        assert!(rendered.text().contains("MS/E/25-26/102"));
        assert!(rendered.text().contains("Total: 2,250.00 USD"));
    }

    #[test]
    fn test_position_placeholders() {
        let template = "{{POSITION_2_NAME_EN}} x {{POSITION_2_QTY}}";
        let rendered = render_price_list(&record(), Some(template));
        assert_eq!(rendered.text(), "Drug B x 50.00");
    }

    #[test]
    fn test_label_rendering_per_group() {
        let record = record();
        let groups = group_by_temperature(&record);
        assert_eq!(groups.len(), 2);

        let cold = render_label(&record, &groups[0], None);
        assert!(cold.text().contains("+2C to +8C cold chain"));
        assert!(cold.text().contains("1. Drug A"));
        assert!(!cold.text().contains("Drug B"));

        let ambient = render_label(&record, &groups[1], None);
        assert!(ambient.text().contains("+15C to +25C ambient"));
        assert!(ambient.text().contains("2. Drug B"));
    }

    #[test]
    fn test_label_template_overrides_storage() {
        let record = record();
        let groups = group_by_temperature(&record);
        let rendered = render_label(&record, &groups[0], Some("Keep at {{STORAGE_TEMPERATURE}}"));
        assert_eq!(rendered.text(), "Keep at +2C to +8C cold chain");
    }
}

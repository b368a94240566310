//! Structured parsing of resolved document text into candidates.
//!
//! One [`ParseCandidate`] per strategy: the native-layer rules assume
//! columns survived extraction, the OCR rules tolerate shredded lines.
//! Specification and MSDS documents contribute overlay fields that are
//! merged into the invoice candidate afterwards.

use tracing::debug;

use crate::models::record::{ParseCandidate, Strategy};

use super::rules::patterns::{
    EXPORTER_LABELED, EXPORTER_WITH_REF, INCOTERM, INVOICE_NO_LABELED,
    INVOICE_NO_LABELED_NEXT_LINE, INVOICE_NO_STRUCTURED, ROW_SKIP, SPEC_DATE_LABELS, SPEC_DT,
    TERMS_LABELS, VALIDITY_LABELS,
};
use super::rules::{detect_currency, extract_date_token, extract_rows, extract_storage_phrase};

/// Fields contributed by the Specification document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecificationFields {
    pub terms_of_delivery: String,
    pub period_of_validity: String,
    pub specification_date: String,
    pub storage_temperature: String,
}

impl SpecificationFields {
    pub fn is_empty(&self) -> bool {
        self.terms_of_delivery.is_empty()
            && self.period_of_validity.is_empty()
            && self.specification_date.is_empty()
            && self.storage_temperature.is_empty()
    }
}

/// Fields contributed by the MSDS document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsdsFields {
    pub storage_temperature: String,
}

/// Parse one invoice text with the rules of the given strategy.
pub fn parse_invoice(text: &str, strategy: Strategy) -> ParseCandidate {
    let currency = detect_currency(text).unwrap_or_default();

    let mut candidate = ParseCandidate {
        strategy,
        currency: currency.clone(),
        ..ParseCandidate::default()
    };

    candidate.invoice_no = extract_invoice_no(text);
    candidate.invoice_date = extract_invoice_date(text, &candidate.invoice_no);

    if let Some((name, address)) = extract_exporter(text) {
        candidate.exporter_name = name;
        candidate.exporter_address = address;
    }
    if let Some((name, address)) = extract_party_block(text, &["consignee", "buyer"]) {
        candidate.buyer_name = name;
        candidate.buyer_address = address;
    }

    candidate.terms_of_delivery = extract_terms(text);
    candidate.positions = extract_rows(text, strategy, &currency);

    debug!(
        "{:?} parse: invoice_no={:?}, {} positions",
        strategy,
        candidate.invoice_no,
        candidate.positions.len()
    );
    candidate
}

/// Parse the Specification document for its overlay fields.
pub fn parse_specification(text: &str) -> SpecificationFields {
    let mut fields = SpecificationFields {
        terms_of_delivery: find_first(text, &TERMS_LABELS),
        period_of_validity: find_first(text, &VALIDITY_LABELS),
        ..SpecificationFields::default()
    };

    fields.specification_date = SPEC_DT
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .or_else(|| {
            let labeled = find_first(text, &SPEC_DATE_LABELS);
            extract_date_token(&labeled)
        })
        .unwrap_or_default();

    fields.storage_temperature = extract_storage_phrase(text).unwrap_or_default();
    fields
}

/// Parse the MSDS document: only the storage condition matters here.
pub fn parse_msds(text: &str) -> MsdsFields {
    MsdsFields {
        storage_temperature: extract_storage_phrase(text).unwrap_or_default(),
    }
}

/// Overlay specification and MSDS fields onto the invoice candidate.
///
/// The Specification is the contractual source for terms, validity and
/// its own date: a non-empty Specification value replaces whatever the
/// invoice extracted, and the invoice value only survives where the
/// Specification is silent. The MSDS storage phrase is authoritative
/// and wins over both the invoice and the specification. Positions
/// without a row currency inherit the document currency last.
pub fn merge(
    mut candidate: ParseCandidate,
    spec: &SpecificationFields,
    msds: &MsdsFields,
) -> ParseCandidate {
    overlay(&mut candidate.terms_of_delivery, &spec.terms_of_delivery);
    overlay(&mut candidate.period_of_validity, &spec.period_of_validity);
    overlay(&mut candidate.specification_date, &spec.specification_date);

    if !msds.storage_temperature.is_empty() {
        candidate.storage_temperature = msds.storage_temperature.clone();
    } else {
        overlay(&mut candidate.storage_temperature, &spec.storage_temperature);
    }

    for position in &mut candidate.positions {
        if position.currency.is_empty() {
            position.currency = candidate.currency.clone();
        }
        if position.storage_temperature.is_empty() {
            position.storage_temperature = candidate.storage_temperature.clone();
        }
    }
    candidate
}

fn overlay(slot: &mut String, value: &str) {
    if !value.is_empty() {
        *slot = value.to_string();
    }
}

fn find_first(text: &str, labels: &[regex::Regex]) -> String {
    for re in labels {
        if let Some(caps) = re.captures(text) {
            let value = caps[1].trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    String::new()
}

fn extract_invoice_no(text: &str) -> String {
    if let Some(caps) = INVOICE_NO_STRUCTURED.captures(text) {
        return caps[1].to_string();
    }
    if let Some(caps) = INVOICE_NO_LABELED_NEXT_LINE.captures(text) {
        return caps[1].to_string();
    }
    if let Some(caps) = INVOICE_NO_LABELED.captures(text) {
        let value = caps[1].trim().trim_end_matches('.');
        // A labeled capture that is a bare date is the date column
        // bleeding into the number column.
        if extract_date_token(value).as_deref() != Some(value) {
            return value.to_string();
        }
    }
    String::new()
}

fn extract_invoice_date(text: &str, invoice_no: &str) -> String {
    // The date usually rides on the same line as the invoice number.
    if !invoice_no.is_empty() {
        for line in text.lines() {
            if line.contains(invoice_no) {
                let after = &line[line.find(invoice_no).unwrap_or(0) + invoice_no.len()..];
                if let Some(token) = extract_date_token(after) {
                    return token;
                }
            }
        }
    }
    // Otherwise the first date in the header area.
    let header: String = text.lines().take(15).collect::<Vec<_>>().join("\n");
    extract_date_token(&header).unwrap_or_default()
}

fn extract_exporter(text: &str) -> Option<(String, String)> {
    if let Some(caps) = EXPORTER_WITH_REF.captures(text) {
        return Some((caps[1].trim().to_string(), String::new()));
    }
    if let Some(caps) = EXPORTER_LABELED.captures(text) {
        let value = caps[1].trim();
        if !value.is_empty() {
            return Some((value.to_string(), String::new()));
        }
    }
    extract_party_block(text, &["exporter", "shipper", "seller"])
}

/// Block under a party label: the first following non-empty line is the
/// name, subsequent lines up to the next label or blank line are the
/// address.
fn extract_party_block(text: &str, labels: &[&str]) -> Option<(String, String)> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.iter().position(|line| {
        let lowered = line.trim().to_lowercase();
        labels
            .iter()
            .any(|label| lowered.starts_with(label) && lowered.len() < label.len() + 4)
    })?;

    let mut name = String::new();
    let mut address = Vec::new();
    for line in lines.iter().skip(start + 1).take(6) {
        let line = line.trim();
        // A blank line or any other section header ends the block.
        if line.is_empty() || ROW_SKIP.is_match(line) {
            break;
        }
        if name.is_empty() {
            name = line.to_string();
        } else {
            address.push(line.to_string());
        }
    }

    if name.is_empty() {
        None
    } else {
        Some((name, address.join(", ")))
    }
}

fn extract_terms(text: &str) -> String {
    let labeled = find_first(text, &TERMS_LABELS);
    if !labeled.is_empty() {
        return labeled;
    }

    // Label with the value on the following line.
    let lines: Vec<&str> = text.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        let lowered = line.trim().to_lowercase();
        if lowered.starts_with("terms of delivery") || lowered.starts_with("delivery terms") {
            if let Some(next) = lines.get(idx + 1) {
                let next = next.trim();
                if !next.is_empty() {
                    return next.to_string();
                }
            }
        }
    }

    // Last resort: a line carrying an incoterm.
    for line in &lines {
        if INCOTERM.is_match(line) {
            return line.trim().to_string();
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INVOICE: &str = "\
PROFORMA INVOICE (In USD)
Invoice No. & Date
MS/E/25-26/102 dt 26-Feb-26
Exporter:
M/S. Sunrise Pharma Pvt. Ltd.
Plot 14, GIDC Estate
Ankleshwar, Gujarat
Consignee:
TOO MedImport
12 Abay Avenue
Almaty, Kazakhstan
Terms of Delivery: CPT Almaty
Description of Goods
Drug A  100 pcs  10.00 USD  1000.00 USD
Drug B  50 pcs  25.00 USD  1250.00 USD
Total  2250.00 USD";

    #[test]
    fn test_parse_invoice_header_fields() {
        let candidate = parse_invoice(INVOICE, Strategy::Native);
        assert_eq!(candidate.invoice_no, "MS/E/25-26/102");
        assert_eq!(candidate.invoice_date, "26-Feb-26");
        assert_eq!(candidate.currency, "USD");
        assert_eq!(candidate.buyer_name, "TOO MedImport");
        assert_eq!(candidate.buyer_address, "12 Abay Avenue, Almaty, Kazakhstan");
        assert_eq!(candidate.terms_of_delivery, "CPT Almaty");
    }

    #[test]
    fn test_parse_invoice_exporter_block() {
        let candidate = parse_invoice(INVOICE, Strategy::Native);
        assert_eq!(candidate.exporter_name, "M/S. Sunrise Pharma Pvt. Ltd.");
        assert_eq!(
            candidate.exporter_address,
            "Plot 14, GIDC Estate, Ankleshwar, Gujarat"
        );
    }

    #[test]
    fn test_parse_invoice_positions() {
        let candidate = parse_invoice(INVOICE, Strategy::Native);
        assert_eq!(candidate.positions.len(), 2);
        assert_eq!(candidate.positions[0].name_en, "Drug A");
        assert_eq!(candidate.positions[1].total_price, "1250.00");
    }

    #[test]
    fn test_labeled_invoice_number() {
        let text = "PROFORMA INVOICE\nINVOICE NO: 12345\nDate: 01.03.2024\n";
        let candidate = parse_invoice(text, Strategy::Native);
        assert_eq!(candidate.invoice_no, "12345");
        assert_eq!(candidate.invoice_date, "01.03.2024");
    }

    #[test]
    fn test_labeled_invoice_number_rejects_bare_date() {
        let candidate = parse_invoice("Invoice No: 26.02.2026\n", Strategy::Native);
        assert_eq!(candidate.invoice_no, "");
    }

    #[test]
    fn test_parse_specification() {
        let text = "\
SPECIFICATION No. 7 to contract DT: 26.02.2026
Terms of Delivery: CPT Almaty
Period of Validity: 12 months
Storage: Store below 25°C";
        let fields = parse_specification(text);
        assert_eq!(fields.specification_date, "26.02.2026");
        assert_eq!(fields.terms_of_delivery, "CPT Almaty");
        assert_eq!(fields.period_of_validity, "12 months");
        assert_eq!(fields.storage_temperature, "Store below 25°C");
    }

    #[test]
    fn test_parse_msds_storage() {
        let text = "Section 7\nStorage: Store at 2-8°C away from light";
        let fields = parse_msds(text);
        assert_eq!(fields.storage_temperature, "Store at 2-8°C away from light");
    }

    #[test]
    fn test_merge_spec_replaces_invoice_and_msds_storage_wins() {
        let candidate = ParseCandidate {
            terms_of_delivery: "CPT Almaty".to_string(),
            currency: "USD".to_string(),
            positions: vec![crate::models::record::RawPosition::default()],
            ..ParseCandidate::default()
        };
        let spec = SpecificationFields {
            terms_of_delivery: "FOB Mumbai".to_string(),
            period_of_validity: "12 months".to_string(),
            storage_temperature: "room temperature".to_string(),
            ..SpecificationFields::default()
        };
        let msds = MsdsFields {
            storage_temperature: "Store at 2-8°C".to_string(),
        };

        let merged = merge(candidate, &spec, &msds);
        // The specification overrides the invoice's terms.
        assert_eq!(merged.terms_of_delivery, "FOB Mumbai");
        assert_eq!(merged.period_of_validity, "12 months");
        // MSDS storage beats the specification's.
        assert_eq!(merged.storage_temperature, "Store at 2-8°C");
        // Positions inherit currency and storage.
        assert_eq!(merged.positions[0].currency, "USD");
        assert_eq!(merged.positions[0].storage_temperature, "Store at 2-8°C");
    }

    #[test]
    fn test_merge_keeps_invoice_values_where_spec_is_silent() {
        let candidate = ParseCandidate {
            terms_of_delivery: "CPT Almaty".to_string(),
            storage_temperature: "Store below 25°C".to_string(),
            ..ParseCandidate::default()
        };

        let merged = merge(
            candidate,
            &SpecificationFields::default(),
            &MsdsFields::default(),
        );
        assert_eq!(merged.terms_of_delivery, "CPT Almaty");
        assert_eq!(merged.storage_temperature, "Store below 25°C");
    }
}

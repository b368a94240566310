//! Product row extraction from invoice body text.
//!
//! Three row shapes are tried per line, strictest first: a named row
//! ("Drug A  100 pcs  10.00 USD  1000.00 USD"), a code-keyed row
//! ("AMX-500/B 200 12.50 2,500.00"), and for OCR text a loose code row
//! whose price columns may contain stray spaces. When no priced row
//! matches anywhere, a code+quantity skeleton is taken as a last
//! resort so review starts from something rather than nothing.

use std::collections::HashSet;

use crate::models::record::{RawPosition, Strategy};

use super::patterns::{
    PACKING, ROW_CODE_LOOSE, ROW_CODE_QTY, ROW_CODE_STRICT, ROW_NAMED, ROW_SKIP,
};

/// Extract all position rows from one body of text. `currency` is the
/// document-level currency, inherited by rows that carry none.
pub fn extract_rows(text: &str, strategy: Strategy, currency: &str) -> Vec<RawPosition> {
    let mut rows = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || ROW_SKIP.is_match(line) {
            continue;
        }

        if let Some(row) = match_named(line, currency) {
            push_unique(&mut rows, &mut seen, row);
            continue;
        }
        if let Some(row) = match_code(line, strategy, currency) {
            push_unique(&mut rows, &mut seen, row);
        }
    }

    // Skeleton fallback: code and quantity only, prices left blank for
    // review.
    if rows.is_empty() {
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || ROW_SKIP.is_match(line) {
                continue;
            }
            if let Some(caps) = ROW_CODE_QTY.captures(line) {
                let row = RawPosition {
                    code: caps["code"].to_string(),
                    quantity: caps["qty"].to_string(),
                    currency: currency.to_string(),
                    ..RawPosition::default()
                };
                push_unique(&mut rows, &mut seen, row);
            }
        }
    }

    enrich_from_description(&mut rows, text, strategy);
    rows
}

fn match_named(line: &str, currency: &str) -> Option<RawPosition> {
    let caps = ROW_NAMED.captures(line)?;
    let name = caps.name("name")?.as_str().trim();
    if !looks_like_name(name) {
        return None;
    }
    let row_currency = caps
        .name("cur1")
        .or_else(|| caps.name("cur2"))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| currency.to_string());
    Some(RawPosition {
        name_en: name.to_string(),
        quantity: caps["qty"].to_string(),
        unit: caps.name("unit").map(|m| m.as_str().to_string()).unwrap_or_default(),
        unit_price: caps["unit_price"].trim().to_string(),
        total_price: caps["total"].trim().to_string(),
        currency: row_currency,
        ..RawPosition::default()
    })
}

fn match_code(line: &str, strategy: Strategy, currency: &str) -> Option<RawPosition> {
    let caps = ROW_CODE_STRICT.captures(line).or_else(|| {
        if strategy == Strategy::Ocr {
            ROW_CODE_LOOSE.captures(line)
        } else {
            None
        }
    })?;
    let code = caps["code"].to_string();
    if !code.chars().any(|c| c.is_ascii_alphabetic()) && code.len() < 4 {
        return None;
    }
    Some(RawPosition {
        code,
        quantity: caps["qty"].to_string(),
        unit_price: caps["unit_price"].trim().to_string(),
        total_price: caps["total"].trim().to_string(),
        currency: currency.to_string(),
        ..RawPosition::default()
    })
}

fn push_unique(
    rows: &mut Vec<RawPosition>,
    seen: &mut HashSet<(String, String)>,
    row: RawPosition,
) {
    let key = if row.code.is_empty() {
        (row.name_en.clone(), row.quantity.clone())
    } else {
        (row.code.clone(), row.quantity.clone())
    };
    if seen.insert(key) {
        rows.push(row);
    }
}

/// A product name is mostly letters, with enough of them to be a word.
fn looks_like_name(s: &str) -> bool {
    let letters = s.chars().filter(|c| c.is_alphabetic()).count();
    letters >= 3 && letters * 2 >= s.chars().count()
}

/// Mine the goods-description block for packing phrases and, on OCR
/// text, product names for code-keyed rows that captured none.
fn enrich_from_description(rows: &mut [RawPosition], text: &str, strategy: Strategy) {
    let packings = mine_packing(text);
    for (row, packing) in rows.iter_mut().zip(packings) {
        if row.packing_en.is_empty() {
            row.packing_en = packing;
        }
    }

    if strategy == Strategy::Ocr {
        let names = scavenge_names(text);
        let mut names = names.into_iter();
        for row in rows.iter_mut() {
            if row.name_en.is_empty() {
                match names.next() {
                    Some(name) => row.name_en = name,
                    None => break,
                }
            }
        }
    }
}

/// Packing phrases in source order: "10 x 10 Tablets", "500 mg", "5 ml".
fn mine_packing(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !ROW_SKIP.is_match(line))
        .filter_map(|line| PACKING.find(line))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Alpha-heavy lines that read as product names in OCR output, where
/// the name column often lands on its own shredded line.
fn scavenge_names(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| {
            let letters = line.chars().filter(|c| c.is_alphabetic()).count();
            let digits = line.chars().filter(|c| c.is_ascii_digit()).count();
            let words = line.split_whitespace().count();
            letters >= 12 && words <= 8 && digits * 3 < letters && !ROW_SKIP.is_match(line)
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_rows() {
        let text = "Description of Goods\nDrug A  100 pcs  10.00 USD  1000.00 USD\nDrug B  50 vials  25.00 USD  1250.00 USD\nTotal  2250.00 USD";
        let rows = extract_rows(text, Strategy::Native, "USD");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name_en, "Drug A");
        assert_eq!(rows[0].quantity, "100");
        assert_eq!(rows[0].unit, "pcs");
        assert_eq!(rows[0].unit_price, "10.00");
        assert_eq!(rows[0].total_price, "1000.00");
        assert_eq!(rows[0].currency, "USD");
        assert_eq!(rows[1].name_en, "Drug B");
    }

    #[test]
    fn test_code_rows_inherit_document_currency() {
        let text = "AMX-500/B 200 12.50 2,500.00\nPCM-650/T 100 5.00 500.00";
        let rows = extract_rows(text, Strategy::Native, "EUR");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].code, "AMX-500/B");
        assert_eq!(rows[0].currency, "EUR");
        assert_eq!(rows[1].total_price, "500.00");
    }

    #[test]
    fn test_loose_rows_only_for_ocr() {
        let text = "AMX-500/B 200 12 .50 2,5 00.00";
        assert!(extract_rows(text, Strategy::Native, "USD").is_empty() ||
            extract_rows(text, Strategy::Native, "USD")[0].unit_price.is_empty());
        let rows = extract_rows(text, Strategy::Ocr, "USD");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code, "AMX-500/B");
    }

    #[test]
    fn test_skeleton_fallback_when_no_priced_rows() {
        let text = "goods listed below\nAMX-500/B 200\nsigned by exporter";
        let rows = extract_rows(text, Strategy::Native, "USD");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].code, "AMX-500/B");
        assert_eq!(rows[0].quantity, "200");
        assert!(rows[0].unit_price.is_empty());
    }

    #[test]
    fn test_duplicate_rows_collapse() {
        let text = "AMX-500/B 200 12.50 2,500.00\nAMX-500/B 200 12.50 2,500.00";
        let rows = extract_rows(text, Strategy::Native, "USD");
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_header_lines_never_become_rows() {
        let text = "Quantity 100 10.00 1000.00\nTotal 1 1.00 1.00";
        assert!(extract_rows(text, Strategy::Native, "USD").is_empty());
    }

    #[test]
    fn test_packing_mined_from_description() {
        let text = "AMX-500/B 200 12.50 2,500.00\nAmoxicillin Capsules 10 x 10 Tablets";
        let rows = extract_rows(text, Strategy::Native, "USD");
        assert_eq!(rows[0].packing_en, "10 x 10 Tablets");
    }

    #[test]
    fn test_ocr_name_scavenging_fills_missing_names() {
        let text = "AMX-500/B 200 12.50 2,500.00\nAmoxicillin Trihydrate Capsules BP";
        let rows = extract_rows(text, Strategy::Ocr, "USD");
        assert_eq!(rows[0].name_en, "Amoxicillin Trihydrate Capsules BP");
    }
}

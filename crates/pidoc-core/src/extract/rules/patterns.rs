//! Common regex patterns for customs/pharma document extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Invoice number patterns. Structured export references look like
    // "MS/E/25-26/102"; labeled forms carry the value on the same or
    // the following line.
    pub static ref INVOICE_NO_STRUCTURED: Regex = Regex::new(
        r"\b([A-Z]{2,}[/-][A-Z][/-]\d{2}-\d{2}[/-]\d+)\b"
    ).unwrap();

    pub static ref INVOICE_NO_LABELED_NEXT_LINE: Regex = Regex::new(
        r"(?i)Invoice\s*No\.?\s*&?\s*Date\s*\n\s*([A-Za-z0-9/-]+)"
    ).unwrap();

    pub static ref INVOICE_NO_LABELED: Regex = Regex::new(
        r"(?i)Invoice[ \t]*No\.?[ \t]*[:\-]?[ \t]*([A-Za-z0-9./-]+)"
    ).unwrap();

    // Date patterns: 26-Feb-26, 26.02.2026, 26/02/2026.
    pub static ref DATE_TEXTUAL: Regex = Regex::new(
        r"\b(\d{1,2})[-/. ]([A-Za-z]{3,9})[-/. ,]+(\d{2,4})\b"
    ).unwrap();

    // One pattern per separator; mixed separators ("25-26/102") are
    // reference numbers, not dates.
    pub static ref DATE_NUMERIC_SEPS: Vec<Regex> = vec![
        Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{2,4})\b").unwrap(),
        Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{2,4})\b").unwrap(),
        Regex::new(r"\b(\d{1,2})-(\d{1,2})-(\d{2,4})\b").unwrap(),
    ];

    // Currency in header, e.g. "(In USD)".
    pub static ref CURRENCY_PAREN: Regex = Regex::new(
        r"\(In\s+([A-Z]{3})\)"
    ).unwrap();

    // Position rows. The named form covers "Drug A  100 pcs  10.00 USD
    // 1000.00 USD" layouts; the code forms cover export tables keyed by
    // a product code; the loose variant tolerates OCR-shredded prices.
    pub static ref ROW_NAMED: Regex = Regex::new(
        r"^(?P<name>[A-Za-z][A-Za-z .,()/&'-]*?)\s+(?P<qty>\d+(?:[.,]\d+)?)\s*(?P<unit>[A-Za-z]{1,12})?\s+(?P<unit_price>\d[\d ,.]*?)\s*(?P<cur1>[A-Z]{3})?\s+(?P<total>\d[\d ,.]*?)\s*(?P<cur2>[A-Z]{3})?\s*$"
    ).unwrap();

    pub static ref ROW_CODE_STRICT: Regex = Regex::new(
        r"^(?P<code>[A-Za-z0-9/-]{3,})\s+(?P<qty>\d+(?:[.,]\d+)?)\s+(?P<unit_price>[\d,]+(?:\.\d{2})?)\s+(?P<total>[\d,]+(?:\.\d{2})?)$"
    ).unwrap();

    pub static ref ROW_CODE_LOOSE: Regex = Regex::new(
        r"^(?P<code>[A-Za-z0-9/-]{3,})\s+(?P<qty>\d+(?:[.,]\d+)?)\s+(?P<unit_price>[0-9,.\s]{4,20})\s+(?P<total>[0-9,.\s]{4,20})$"
    ).unwrap();

    pub static ref ROW_CODE_QTY: Regex = Regex::new(
        r"^(?P<code>[A-Za-z0-9/-]{3,})\s+(?P<qty>\d+(?:[.,]\d+)?)\b"
    ).unwrap();

    // Lines that are table headers or boilerplate, never position rows.
    pub static ref ROW_SKIP: Regex = Regex::new(
        r"(?i)invoice|exporter|consignee|buyer|quantity|description|declaration|authorised|signatory|amount in words|terms|total|page\s+\d"
    ).unwrap();

    // Packing phrases: "10 x 10 Tablets", "500 mg", "5 ml".
    pub static ref PACKING: Regex = Regex::new(
        r"(?i)\b\d+\s*x\s*\d+\s*[A-Za-z]+\b|\b\d+\s*(?:mg|g|kg|ml|l|mcg|iu)\b"
    ).unwrap();

    // Incoterms for terms-of-delivery lines.
    pub static ref INCOTERM: Regex = Regex::new(
        r"(?i)\b(CPT|FOB|CIF|EXW|DAP|DDP|FCA)\b"
    ).unwrap();

    // "Specification No ... DT: 26.02.2026" date rider.
    pub static ref SPEC_DT: Regex = Regex::new(
        r"(?i)Specification\s*No[^\n]*DT:\s*([0-9./-]+)"
    ).unwrap();

    // Temperature expressions: "2-8°C", "-25 to -15 C", "below 25°C".
    pub static ref TEMP_RANGE: Regex = Regex::new(
        r"(?i)\+?(-?\d+)\s*°?\s*[CF]?\s*(?:to|and|–|—|~|-)\s*\+?(-?\d+)\s*(?:°\s*|degrees?\s*)?([CF])\b"
    ).unwrap();

    pub static ref TEMP_BELOW: Regex = Regex::new(
        r"(?i)(?:below|not\s+above|do(?:es)?\s+not\s+exceed)\s*\+?(\d+)\s*(?:°\s*|degrees?\s*)?C\b"
    ).unwrap();

    // Header label synonyms, tried in order. First capture wins. The
    // value gaps are space/tab only so a label at end of line never
    // captures the following line.
    pub static ref TERMS_LABELS: Vec<Regex> = vec![
        Regex::new(r"(?i)Terms[ \t]*of[ \t]*Delivery(?:[ \t]*(?:and|&)[ \t]*Payment)?[ \t]*[:\-]?[ \t]*([^\n]+)").unwrap(),
        Regex::new(r"(?i)Delivery[ \t]*Terms[ \t]*[:\-]?[ \t]*([^\n]+)").unwrap(),
    ];

    pub static ref VALIDITY_LABELS: Vec<Regex> = vec![
        Regex::new(r"(?i)Period[ \t]*of[ \t]*Validity[ \t]*[:\-]?[ \t]*([^\n]+)").unwrap(),
        Regex::new(r"(?i)Validity[ \t]*Period[ \t]*[:\-]?[ \t]*([^\n]+)").unwrap(),
        Regex::new(r"(?i)Valid[ \t]*(?:for|until)[ \t]*[:\-]?[ \t]*([^\n]+)").unwrap(),
    ];

    pub static ref SPEC_DATE_LABELS: Vec<Regex> = vec![
        Regex::new(r"(?i)Specification[ \t]*Date[ \t]*[:\-]?[ \t]*([^\n]+)").unwrap(),
        Regex::new(r"(?i)Date[ \t]*of[ \t]*Specification[ \t]*[:\-]?[ \t]*([^\n]+)").unwrap(),
        Regex::new(r"(?i)Spec\.?[ \t]*Date[ \t]*[:\-]?[ \t]*([^\n]+)").unwrap(),
    ];

    pub static ref STORAGE_LABELS: Vec<Regex> = vec![
        Regex::new(r"(?i)Storage[ \t]*(?:conditions?|temperature)?[ \t]*[:\-]?[ \t]*([^\n]+)").unwrap(),
        Regex::new(r"(?i)Recommended[ \t]*storage[ \t]*[:\-]?[ \t]*([^\n]+)").unwrap(),
    ];

    pub static ref EXPORTER_WITH_REF: Regex = Regex::new(
        r"\b(M/S\.[^\n]+?)\s+[A-Z]{2,}[/-][A-Z][/-]\d{2}-\d{2}[/-]\d+\b"
    ).unwrap();

    pub static ref EXPORTER_LABELED: Regex = Regex::new(
        r"(?i)Exporter[ \t]*[:\-][ \t]*([^\n]+)"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_no_structured() {
        let caps = INVOICE_NO_STRUCTURED.captures("ref MS/E/25-26/102 dt").unwrap();
        assert_eq!(&caps[1], "MS/E/25-26/102");
    }

    #[test]
    fn test_named_row_with_currency_tokens() {
        let caps = ROW_NAMED.captures("Drug A  100 pcs  10.00 USD  1000.00 USD").unwrap();
        assert_eq!(caps.name("name").unwrap().as_str().trim(), "Drug A");
        assert_eq!(&caps["qty"], "100");
        assert_eq!(caps.name("unit").unwrap().as_str(), "pcs");
        assert_eq!(caps.name("unit_price").unwrap().as_str(), "10.00");
        assert_eq!(caps.name("total").unwrap().as_str(), "1000.00");
        assert_eq!(caps.name("cur1").unwrap().as_str(), "USD");
    }

    #[test]
    fn test_code_row_strict() {
        let caps = ROW_CODE_STRICT.captures("AMX-500/B 200 12.50 2,500.00").unwrap();
        assert_eq!(&caps["code"], "AMX-500/B");
        assert_eq!(&caps["qty"], "200");
        assert_eq!(&caps["total"], "2,500.00");
    }

    #[test]
    fn test_date_patterns() {
        assert!(DATE_TEXTUAL.is_match("26-Feb-26"));
        assert!(DATE_NUMERIC_SEPS.iter().any(|re| re.is_match("26.02.2026")));
        assert!(DATE_NUMERIC_SEPS.iter().any(|re| re.is_match("01/03/2024")));
        // Mixed separators are reference numbers, not dates.
        assert!(!DATE_NUMERIC_SEPS.iter().any(|re| re.is_match("25-26/102")));
    }

    #[test]
    fn test_temperature_range() {
        let caps = TEMP_RANGE.captures("Store at 2-8°C in a dry place").unwrap();
        assert_eq!(&caps[1], "2");
        assert_eq!(&caps[2], "8");

        let caps = TEMP_RANGE.captures("between -25 to -15 C").unwrap();
        assert_eq!(&caps[1], "-25");
        assert_eq!(&caps[2], "-15");
    }

    #[test]
    fn test_temperature_below() {
        let caps = TEMP_BELOW.captures("Store below 25°C").unwrap();
        assert_eq!(&caps[1], "25");
    }

    #[test]
    fn test_packing_phrases() {
        assert!(PACKING.is_match("10 x 10 Tablets"));
        assert!(PACKING.is_match("Vial 500 mg"));
        assert!(!PACKING.is_match("plain product name"));
    }
}

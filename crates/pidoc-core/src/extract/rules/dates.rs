//! Date extraction and normalization.
//!
//! Input forms seen in the wild: "26-Feb-26", "26.02.2026",
//! "26/02/2026", "26 February 2026". Canonical output is DD.MM.YYYY.

use chrono::{Datelike, NaiveDate};

use super::patterns::{DATE_NUMERIC_SEPS, DATE_TEXTUAL};

/// Parse one date string in any accepted format.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Some(caps) = DATE_TEXTUAL.captures(s) {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_from_name(&caps[2])?;
        let year = parse_year(&caps[3]);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    for re in DATE_NUMERIC_SEPS.iter() {
        if let Some(caps) = re.captures(s) {
            let day: u32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let year = parse_year(&caps[3]);
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
    }

    None
}

/// First date-looking token in free text, returned raw. The textual
/// month form is tried first because numeric patterns also match
/// reference numbers.
pub fn extract_date_token(text: &str) -> Option<String> {
    if let Some(m) = DATE_TEXTUAL.find(text) {
        return Some(m.as_str().to_string());
    }
    DATE_NUMERIC_SEPS
        .iter()
        .filter_map(|re| re.find(text))
        .min_by_key(|m| m.start())
        .map(|m| m.as_str().to_string())
}

/// Canonical date format used in generated documents.
pub fn format_date(date: NaiveDate) -> String {
    format!("{:02}.{:02}.{:04}", date.day(), date.month(), date.year())
}

fn parse_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if year < 100 {
        // Two-digit year: 00-50 are 2000s, 51-99 are 1900s.
        if year <= 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let lowered = name.to_lowercase();
    let month = match lowered.as_str() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(parse_date("01.03.2024"), Some(expected));
        assert_eq!(parse_date("01/03/2024"), Some(expected));
        assert_eq!(parse_date("01-03-2024"), Some(expected));
    }

    #[test]
    fn test_parse_textual_month() {
        assert_eq!(
            parse_date("26-Feb-26"),
            NaiveDate::from_ymd_opt(2026, 2, 26)
        );
        assert_eq!(
            parse_date("15 January 2025"),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
    }

    #[test]
    fn test_two_digit_year_pivot() {
        assert_eq!(
            parse_date("01.03.24"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(
            parse_date("01.03.99"),
            NaiveDate::from_ymd_opt(1999, 3, 1)
        );
    }

    #[test]
    fn test_invalid_dates_are_rejected() {
        assert_eq!(parse_date("32.13.2024"), None);
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_extract_token_prefers_textual() {
        let text = "Invoice No. 12-345 dt 26-Feb-26";
        assert_eq!(extract_date_token(text).as_deref(), Some("26-Feb-26"));
    }

    #[test]
    fn test_format_is_canonical_and_reparses() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let formatted = format_date(date);
        assert_eq!(formatted, "01.03.2024");
        assert_eq!(parse_date(&formatted), Some(date));
    }
}

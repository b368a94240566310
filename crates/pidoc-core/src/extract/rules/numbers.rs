//! Locale-tolerant numeric parsing for amounts and quantities.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a loosely formatted amount: "1 234,56", "1,234.56", "1.000,00",
/// "1000". Currency symbols and junk characters are stripped first.
///
/// Returns `None` when nothing numeric remains; callers flag the field
/// for manual review instead of defaulting to zero.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // Both separators present: the later one is the decimal point.
        (Some(comma), Some(dot)) if comma > dot => {
            cleaned.replace('.', "").replace(',', ".")
        }
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        // Commas only: 3-digit tail groups are thousands separators,
        // anything else marks the decimal part.
        (Some(comma), None) => {
            let grouped = cleaned
                .split(',')
                .skip(1)
                .all(|group| group.len() == 3 && group.chars().all(|c| c.is_ascii_digit()));
            if grouped && cleaned.len() - comma == 4 {
                cleaned.replace(',', "")
            } else if cleaned.matches(',').count() == 1 {
                cleaned.replace(',', ".")
            } else {
                return None;
            }
        }
        // Dots only: multiple dots means dotted thousands groups.
        (None, Some(dot)) => {
            if cleaned.matches('.').count() > 1 {
                let (int_part, dec_part) = cleaned.split_at(dot);
                format!("{}{}", int_part.replace('.', ""), dec_part)
            } else {
                cleaned
            }
        }
        (None, None) => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}

/// Format an amount in the customs document style: dot decimals with
/// comma thousands groups and two decimal places.
pub fn format_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount);
    let (int_part, dec_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part),
    };

    let chars: Vec<char> = digits.chars().collect();
    let mut grouped = String::new();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    format!("{}{}.{}", sign, grouped, dec_part)
}

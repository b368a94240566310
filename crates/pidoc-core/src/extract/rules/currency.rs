//! Currency detection and normalization to ISO 4217 codes.

use super::patterns::CURRENCY_PAREN;

/// Map a currency symbol or name to its ISO 4217 code. Unknown inputs
/// come back unchanged so nothing is silently dropped.
pub fn normalize_currency(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if is_iso_code(trimmed) {
        return trimmed.to_uppercase();
    }

    match trimmed {
        "$" => return "USD".into(),
        "€" => return "EUR".into(),
        "₹" => return "INR".into(),
        "₸" => return "KZT".into(),
        "£" => return "GBP".into(),
        _ => {}
    }

    let lowered = trimmed.to_lowercase();
    let code = match lowered.as_str() {
        "dollar" | "dollars" | "us dollar" | "us dollars" => "USD",
        "euro" | "euros" => "EUR",
        "rupee" | "rupees" | "indian rupee" | "indian rupees" => "INR",
        "tenge" => "KZT",
        "pound" | "pounds" | "pound sterling" => "GBP",
        "ruble" | "rubles" | "rouble" | "roubles" => "RUB",
        _ => return trimmed.to_string(),
    };
    code.to_string()
}

/// Three uppercase-convertible ASCII letters.
pub fn is_iso_code(s: &str) -> bool {
    s.len() == 3 && s.chars().all(|c| c.is_ascii_alphabetic())
}

/// Find the document currency in header text. The "(In XXX)" marker is
/// the strongest signal; otherwise the first symbol or known name wins.
pub fn detect_currency(text: &str) -> Option<String> {
    if let Some(caps) = CURRENCY_PAREN.captures(text) {
        return Some(caps[1].to_string());
    }

    for (symbol, code) in [
        ("$", "USD"),
        ("€", "EUR"),
        ("₹", "INR"),
        ("₸", "KZT"),
        ("£", "GBP"),
    ] {
        if text.contains(symbol) {
            return Some(code.to_string());
        }
    }

    let upper = text.to_uppercase();
    for code in ["USD", "EUR", "INR", "KZT", "GBP", "RUB"] {
        let found = upper
            .match_indices(code)
            .any(|(idx, _)| stands_alone(&upper, idx, code.len()));
        if found {
            return Some(code.to_string());
        }
    }
    None
}

fn stands_alone(text: &str, start: usize, len: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[start + len..].chars().next();
    !before.is_some_and(|c| c.is_ascii_alphanumeric())
        && !after.is_some_and(|c| c.is_ascii_alphanumeric())
}

//! Storage temperature parsing and MSDS storage-line selection.

use crate::models::record::TemperatureRange;

use super::patterns::{STORAGE_LABELS, TEMP_BELOW, TEMP_RANGE};

/// Parse a free-text storage phrase into a canonical range. Numeric
/// ranges win over keywords; keywords cover phrases like "store at room
/// temperature" that carry no digits.
pub fn parse_temperature(raw: &str) -> Option<TemperatureRange> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = TEMP_RANGE.captures(trimmed) {
        let low: i32 = caps[1].parse().ok()?;
        let high: i32 = caps[2].parse().ok()?;
        if low <= high {
            return Some(classify(low, high));
        }
    }

    if let Some(caps) = TEMP_BELOW.captures(trimmed) {
        let limit: i32 = caps[1].parse().ok()?;
        return Some(if limit <= 25 {
            TemperatureRange::BelowAmbient
        } else {
            TemperatureRange::Ambient
        });
    }

    let lowered = trimmed.to_lowercase();
    if lowered.contains("frozen") || lowered.contains("freezer") {
        return Some(TemperatureRange::Frozen);
    }
    if lowered.contains("refrigerat") || lowered.contains("cold chain") {
        return Some(TemperatureRange::Cold);
    }
    if lowered.contains("room temperature") || lowered.contains("ambient") {
        return Some(TemperatureRange::Ambient);
    }
    None
}

/// Bucket a numeric low/high range into the canonical set.
pub fn classify(low: i32, high: i32) -> TemperatureRange {
    match (low, high) {
        (l, h) if h <= 0 || (l <= -15 && h <= 5) => TemperatureRange::Frozen,
        (l, h) if l >= 0 && h <= 10 => TemperatureRange::Cold,
        (l, h) if l >= 8 && h <= 16 => TemperatureRange::Cool,
        (l, h) if l >= 12 && h <= 30 => TemperatureRange::Ambient,
        (l, h) if l >= 0 && h <= 25 => TemperatureRange::BelowAmbient,
        (l, h) => TemperatureRange::Other(format!("{:+}C to {:+}C", l, h)),
    }
}

/// Pick the single line of an MSDS that states the storage condition.
///
/// Preference order: a storage/store line that actually carries a
/// temperature indicator, then handling verbs ("keep", "maintain",
/// "shipping") next to a numeric range, then any bare numeric range
/// rewritten as a storage sentence, then a labeled storage line even
/// without an indicator.
pub fn extract_storage_phrase(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    for line in &lines {
        let lowered = line.to_lowercase();
        if (lowered.contains("storage") || lowered.contains("store"))
            && has_temperature_indicator(&lowered)
        {
            return Some(strip_label(line));
        }
    }

    for line in &lines {
        let lowered = line.to_lowercase();
        let handling = lowered.contains("shipping")
            || lowered.contains("keep")
            || lowered.contains("maintain");
        if handling && TEMP_RANGE.is_match(line) {
            return Some(strip_label(line));
        }
    }

    for line in &lines {
        if let Some(m) = TEMP_RANGE.find(line) {
            return Some(format!("Store at {}", m.as_str().trim()));
        }
    }

    for re in STORAGE_LABELS.iter() {
        if let Some(caps) = re.captures(text) {
            let value = caps[1].trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}

fn has_temperature_indicator(lowered: &str) -> bool {
    TEMP_RANGE.is_match(lowered)
        || TEMP_BELOW.is_match(lowered)
        || lowered.contains("°c")
        || lowered.contains("room temperature")
        || lowered.contains("ambient")
        || lowered.contains("refrigerat")
        || lowered.contains("frozen")
        || lowered.contains("cool")
}

fn strip_label(line: &str) -> String {
    for re in STORAGE_LABELS.iter() {
        if let Some(caps) = re.captures(line) {
            let value = caps[1].trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    line.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_ranges() {
        assert_eq!(parse_temperature("2-8°C"), Some(TemperatureRange::Cold));
        assert_eq!(
            parse_temperature("-25 to -15 C"),
            Some(TemperatureRange::Frozen)
        );
        assert_eq!(
            parse_temperature("+15C to +25C"),
            Some(TemperatureRange::Ambient)
        );
        assert_eq!(parse_temperature("8-15°C"), Some(TemperatureRange::Cool));
    }

    #[test]
    fn test_parse_below_limit() {
        assert_eq!(
            parse_temperature("Store below 25°C"),
            Some(TemperatureRange::BelowAmbient)
        );
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(
            parse_temperature("Store at room temperature"),
            Some(TemperatureRange::Ambient)
        );
        assert_eq!(
            parse_temperature("Keep refrigerated"),
            Some(TemperatureRange::Cold)
        );
        assert_eq!(parse_temperature("Keep frozen"), Some(TemperatureRange::Frozen));
        assert_eq!(parse_temperature("dry place"), None);
    }

    #[test]
    fn test_classify_odd_range_is_preserved() {
        assert_eq!(
            classify(30, 60),
            TemperatureRange::Other("+30C to +60C".into())
        );
    }

    #[test]
    fn test_storage_phrase_prefers_storage_line_with_indicator() {
        let text = "Section 7: Handling\nStorage: Store at 2-8°C protected from light\nKeep away from children";
        assert_eq!(
            extract_storage_phrase(text).as_deref(),
            Some("Store at 2-8°C protected from light")
        );
    }

    #[test]
    fn test_storage_phrase_falls_back_to_bare_range() {
        let text = "Transport conditions\n2 to 8 °C during transit";
        assert_eq!(
            extract_storage_phrase(text).as_deref(),
            Some("Store at 2 to 8 °C")
        );
    }

    #[test]
    fn test_storage_phrase_labeled_without_indicator() {
        let text = "Storage: in the original package";
        assert_eq!(
            extract_storage_phrase(text).as_deref(),
            Some("in the original package")
        );
    }
}

//! Turning the selected raw candidate into a typed record.
//!
//! Every numeric and date field either parses or is reported in
//! `review_flags`; nothing is defaulted to zero. The one exception is
//! the storage temperature, which falls back to controlled room
//! temperature because a generated label must always state one.

use tracing::debug;

use crate::models::record::{NormalizedRecord, ParseCandidate, Position, RawPosition};

use super::rules::{
    format_amount, format_date, normalize_currency, parse_amount, parse_date, parse_temperature,
};

/// Normalize the selected candidate.
pub fn normalize(candidate: &ParseCandidate) -> NormalizedRecord {
    let mut flags = Vec::new();

    let invoice_date = parse_or_flag_date(&candidate.invoice_date, "invoice_date", &mut flags);
    let specification_date =
        parse_or_flag_date(&candidate.specification_date, "specification_date", &mut flags);

    let storage_temperature = match parse_temperature(&candidate.storage_temperature) {
        Some(range) => range,
        None => {
            if !candidate.storage_temperature.trim().is_empty() {
                flags.push("storage_temperature".to_string());
            }
            Default::default()
        }
    };

    let positions = candidate
        .positions
        .iter()
        .enumerate()
        .map(|(idx, raw)| normalize_position(raw, idx, &candidate.currency, &mut flags))
        .collect();

    let record = NormalizedRecord {
        invoice_no: candidate.invoice_no.trim().to_string(),
        invoice_date,
        buyer_name: candidate.buyer_name.trim().to_string(),
        buyer_address: candidate.buyer_address.trim().to_string(),
        exporter_name: candidate.exporter_name.trim().to_string(),
        exporter_name_ru: candidate.exporter_name_ru.trim().to_string(),
        exporter_address: candidate.exporter_address.trim().to_string(),
        terms_of_delivery: candidate.terms_of_delivery.trim().to_string(),
        period_of_validity: candidate.period_of_validity.trim().to_string(),
        specification_date,
        storage_temperature,
        currency: normalize_currency(&candidate.currency),
        positions,
        review_flags: flags,
    };

    if !record.review_flags.is_empty() {
        debug!("normalization flagged {:?}", record.review_flags);
    }
    record
}

fn normalize_position(
    raw: &RawPosition,
    idx: usize,
    record_currency: &str,
    flags: &mut Vec<String>,
) -> Position {
    let mut flag_field = |field: &str| flags.push(format!("positions[{}].{}", idx, field));

    let quantity = parse_amount(&raw.quantity);
    if quantity.is_none() {
        flag_field("quantity");
    }
    let unit_price = parse_amount(&raw.unit_price);
    if unit_price.is_none() {
        flag_field("unit_price");
    }
    let total_price = parse_amount(&raw.total_price);
    if total_price.is_none() {
        flag_field("total_price");
    }

    let storage_temperature = if raw.storage_temperature.trim().is_empty() {
        None
    } else {
        let parsed = parse_temperature(&raw.storage_temperature);
        if parsed.is_none() {
            flag_field("storage_temperature");
        }
        parsed
    };

    let currency = if raw.currency.is_empty() {
        normalize_currency(record_currency)
    } else {
        normalize_currency(&raw.currency)
    };

    Position {
        code: raw.code.trim().to_string(),
        name_en: raw.name_en.trim().to_string(),
        name_ru: raw.name_ru.trim().to_string(),
        quantity,
        unit: raw.unit.trim().to_string(),
        unit_price,
        total_price,
        currency,
        packing_en: raw.packing_en.trim().to_string(),
        packing_ru: raw.packing_ru.trim().to_string(),
        storage_temperature,
    }
}

fn parse_or_flag_date(
    raw: &str,
    field: &str,
    flags: &mut Vec<String>,
) -> Option<chrono::NaiveDate> {
    if raw.trim().is_empty() {
        return None;
    }
    let parsed = parse_date(raw);
    if parsed.is_none() {
        flags.push(field.to_string());
    }
    parsed
}

impl NormalizedRecord {
    /// Render the record back into raw-candidate form, the shape the
    /// review step edits. Normalizing the result of this round trip
    /// reproduces the record, so edits land in one known format.
    pub fn to_candidate(&self) -> ParseCandidate {
        ParseCandidate {
            strategy: Default::default(),
            invoice_no: self.invoice_no.clone(),
            invoice_date: self.invoice_date.map(format_date).unwrap_or_default(),
            buyer_name: self.buyer_name.clone(),
            buyer_address: self.buyer_address.clone(),
            exporter_name: self.exporter_name.clone(),
            exporter_name_ru: self.exporter_name_ru.clone(),
            exporter_address: self.exporter_address.clone(),
            terms_of_delivery: self.terms_of_delivery.clone(),
            period_of_validity: self.period_of_validity.clone(),
            specification_date: self.specification_date.map(format_date).unwrap_or_default(),
            storage_temperature: self.storage_temperature.canonical(),
            currency: self.currency.clone(),
            positions: self
                .positions
                .iter()
                .map(|p| RawPosition {
                    code: p.code.clone(),
                    name_en: p.name_en.clone(),
                    name_ru: p.name_ru.clone(),
                    quantity: p.quantity.map(format_amount).unwrap_or_default(),
                    unit: p.unit.clone(),
                    unit_price: p.unit_price.map(format_amount).unwrap_or_default(),
                    total_price: p.total_price.map(format_amount).unwrap_or_default(),
                    currency: p.currency.clone(),
                    packing_en: p.packing_en.clone(),
                    packing_ru: p.packing_ru.clone(),
                    storage_temperature: p
                        .storage_temperature
                        .as_ref()
                        .map(|t| t.canonical())
                        .unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::TemperatureRange;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn candidate() -> ParseCandidate {
        ParseCandidate {
            invoice_no: "MS/E/25-26/102".to_string(),
            invoice_date: "26-Feb-26".to_string(),
            buyer_name: " TOO MedImport ".to_string(),
            terms_of_delivery: "CPT Almaty".to_string(),
            storage_temperature: "Store at 2-8°C".to_string(),
            currency: "USD".to_string(),
            positions: vec![RawPosition {
                name_en: "Drug A".to_string(),
                quantity: "100".to_string(),
                unit: "pcs".to_string(),
                unit_price: "10.00".to_string(),
                total_price: "1,000.00".to_string(),
                currency: "USD".to_string(),
                ..RawPosition::default()
            }],
            ..ParseCandidate::default()
        }
    }

    #[test]
    fn test_normalize_clean_candidate() {
        let record = normalize(&candidate());
        assert_eq!(record.invoice_date, NaiveDate::from_ymd_opt(2026, 2, 26));
        assert_eq!(record.buyer_name, "TOO MedImport");
        assert_eq!(record.storage_temperature, TemperatureRange::Cold);
        assert_eq!(
            record.positions[0].total_price,
            Some(Decimal::from_str("1000.00").unwrap())
        );
        assert!(record.review_flags.is_empty());
    }

    #[test]
    fn test_unparseable_amount_is_flagged_not_zeroed() {
        let mut c = candidate();
        c.positions[0].unit_price = "ten".to_string();
        let record = normalize(&c);
        assert_eq!(record.positions[0].unit_price, None);
        assert!(
            record
                .review_flags
                .contains(&"positions[0].unit_price".to_string())
        );
    }

    #[test]
    fn test_unparseable_date_is_flagged() {
        let mut c = candidate();
        c.invoice_date = "someday".to_string();
        let record = normalize(&c);
        assert_eq!(record.invoice_date, None);
        assert!(record.review_flags.contains(&"invoice_date".to_string()));
    }

    #[test]
    fn test_missing_storage_defaults_to_ambient_without_flag() {
        let mut c = candidate();
        c.storage_temperature = String::new();
        let record = normalize(&c);
        assert_eq!(record.storage_temperature, TemperatureRange::Ambient);
        assert!(record.review_flags.is_empty());
    }

    #[test]
    fn test_unrecognized_storage_defaults_to_ambient_with_flag() {
        let mut c = candidate();
        c.storage_temperature = "keep somewhere nice".to_string();
        let record = normalize(&c);
        assert_eq!(record.storage_temperature, TemperatureRange::Ambient);
        assert!(
            record
                .review_flags
                .contains(&"storage_temperature".to_string())
        );
    }

    #[test]
    fn test_review_round_trip_is_stable() {
        let record = normalize(&candidate());
        let reparsed = normalize(&record.to_candidate());
        assert_eq!(reparsed, record);
    }
}

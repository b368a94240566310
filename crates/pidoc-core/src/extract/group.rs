//! Grouping positions by effective storage temperature.
//!
//! Each group becomes one label document. Group order follows first
//! appearance in the record and positions keep their source order, so
//! generated labels are stable across runs.

use crate::models::record::{NormalizedRecord, Position, TemperatureRange};

/// Positions sharing one storage temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureGroup {
    pub temperature: TemperatureRange,
    /// 1-based position numbers in record order.
    pub numbers: Vec<usize>,
    pub positions: Vec<Position>,
}

/// Split the record's positions into temperature groups. Positions
/// without their own temperature inherit the record-level one.
pub fn group_by_temperature(record: &NormalizedRecord) -> Vec<TemperatureGroup> {
    let mut groups: Vec<TemperatureGroup> = Vec::new();

    for (idx, position) in record.positions.iter().enumerate() {
        let temperature = position.effective_temperature(&record.storage_temperature);
        match groups.iter_mut().find(|g| g.temperature == temperature) {
            Some(group) => {
                group.numbers.push(idx + 1);
                group.positions.push(position.clone());
            }
            None => groups.push(TemperatureGroup {
                temperature,
                numbers: vec![idx + 1],
                positions: vec![position.clone()],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, temperature: Option<TemperatureRange>) -> Position {
        Position {
            name_en: name.to_string(),
            storage_temperature: temperature,
            ..Position::default()
        }
    }

    #[test]
    fn test_groups_follow_first_appearance() {
        let record = NormalizedRecord {
            storage_temperature: TemperatureRange::Ambient,
            positions: vec![
                named("A", Some(TemperatureRange::Cold)),
                named("B", None),
                named("C", Some(TemperatureRange::Cold)),
                named("D", Some(TemperatureRange::Frozen)),
            ],
            ..NormalizedRecord::default()
        };

        let groups = group_by_temperature(&record);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].temperature, TemperatureRange::Cold);
        assert_eq!(groups[0].numbers, vec![1, 3]);
        assert_eq!(groups[1].temperature, TemperatureRange::Ambient);
        assert_eq!(groups[1].numbers, vec![2]);
        assert_eq!(groups[2].temperature, TemperatureRange::Frozen);
        assert_eq!(groups[2].numbers, vec![4]);
    }

    #[test]
    fn test_single_group_when_uniform() {
        let record = NormalizedRecord {
            positions: vec![named("A", None), named("B", None)],
            ..NormalizedRecord::default()
        };
        let groups = group_by_temperature(&record);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].temperature, TemperatureRange::Ambient);
        assert_eq!(groups[0].positions.len(), 2);
    }

    #[test]
    fn test_no_positions_no_groups() {
        assert!(group_by_temperature(&NormalizedRecord::default()).is_empty());
    }
}

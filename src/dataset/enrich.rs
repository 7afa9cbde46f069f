//! Derived per-row fields for the chart view.

use hashbrown::HashMap;
use tracing::debug;

use crate::error::QueryError;
use crate::models::{maps_link, EnrichedRecord, TransactionRecord};

/// Drop rows without a district, a positive price and area, or a finite
/// unit price, then derive
/// unit price, maps link and the per-district count of the remaining rows.
///
/// Returns `NoValidData` when nothing survives validation.
pub fn enrich(records: &[TransactionRecord]) -> Result<Vec<EnrichedRecord>, QueryError> {
    let valid: Vec<(&TransactionRecord, &str, f64, f64)> = records
        .iter()
        .filter_map(|r| {
            let district = r.district.as_deref()?;
            let price = r.total_price.filter(|p| *p > 0.0)?;
            let area = r.floor_area.filter(|a| *a > 0.0)?;
            // A vanishing area overflows the quotient
            if !(price / area).is_finite() {
                return None;
            }
            Some((r, district, price, area))
        })
        .collect();

    debug!(
        "{} of {} records valid for derivation",
        valid.len(),
        records.len()
    );

    if valid.is_empty() {
        return Err(QueryError::NoValidData);
    }

    // Counted after validation so the weight reflects the current selection only
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (_, district, _, _) in &valid {
        *counts.entry(*district).or_default() += 1;
    }

    Ok(valid
        .into_iter()
        .map(|(record, district, price, area)| {
            let district_count = counts.get(district).copied().unwrap_or(0);
            EnrichedRecord {
                row: record.row,
                district: district.to_string(),
                address: record.address.clone(),
                total_price: price,
                floor_area: area,
                unit_price: price / area,
                maps_link: record.address.as_deref().map(maps_link),
                district_count,
                bubble_weight: district_count,
            }
        })
        .collect())
}

/// Distinct districts in order of first appearance
pub fn districts_in_order(records: &[EnrichedRecord]) -> Vec<&str> {
    let mut seen = hashbrown::HashSet::new();
    records
        .iter()
        .map(|r| r.district.as_str())
        .filter(|d| seen.insert(*d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(district: Option<&str>, price: Option<f64>, area: Option<f64>) -> TransactionRecord {
        TransactionRecord {
            row: 0,
            district: district.map(str::to_string),
            address: Some("某路1號".into()),
            total_price: price,
            floor_area: area,
            listed_unit_price: None,
        }
    }

    #[test]
    fn test_district_count_is_self_consistent() {
        let records = vec![
            record(Some("A"), Some(1e6), Some(10.0)),
            record(Some("B"), Some(2e6), Some(20.0)),
            record(Some("A"), Some(3e6), Some(30.0)),
            record(Some("A"), Some(4e6), Some(40.0)),
            record(Some("C"), Some(5e6), Some(0.0)),
        ];
        let enriched = enrich(&records).unwrap();
        assert_eq!(enriched.len(), 4);

        for r in &enriched {
            let same = enriched.iter().filter(|o| o.district == r.district).count();
            assert_eq!(r.district_count, same);
            assert_eq!(r.bubble_weight, r.district_count);
        }
    }

    #[test]
    fn test_unit_price_and_link_derived() {
        let enriched = enrich(&[record(Some("A"), Some(5_000_000.0), Some(40.0))]).unwrap();
        assert_eq!(enriched[0].unit_price, 125_000.0);
        assert!(enriched[0]
            .maps_link
            .as_deref()
            .unwrap()
            .starts_with("https://www.google.com/maps/search/"));
    }

    #[test]
    fn test_invalid_rows_dropped_not_defaulted() {
        let records = vec![
            record(None, Some(1e6), Some(10.0)),
            record(Some("A"), None, Some(10.0)),
            record(Some("A"), Some(1e6), None),
            record(Some("A"), Some(-1.0), Some(10.0)),
            record(Some("B"), Some(2e6), Some(20.0)),
        ];
        let enriched = enrich(&records).unwrap();
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].district, "B");
        assert_eq!(enriched[0].district_count, 1);
    }

    #[test]
    fn test_overflowing_unit_price_dropped() {
        let records = vec![
            record(Some("X"), Some(5_000_000.0), Some(1e-320)),
            record(Some("X"), Some(5_000_000.0), Some(40.0)),
        ];
        let enriched = enrich(&records).unwrap();
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].unit_price, 125_000.0);
        assert_eq!(enriched[0].district_count, 1);

        let only = enrich(&[record(Some("X"), Some(5_000_000.0), Some(1e-320))]);
        assert!(matches!(only, Err(QueryError::NoValidData)));
    }

    #[test]
    fn test_no_valid_rows_is_signalled() {
        let err = enrich(&[record(Some("A"), Some(1e6), Some(0.0))]).unwrap_err();
        assert!(matches!(err, QueryError::NoValidData));
        assert!(matches!(enrich(&[]), Err(QueryError::NoValidData)));
    }

    #[test]
    fn test_districts_in_first_appearance_order() {
        let records = vec![
            record(Some("B"), Some(1e6), Some(10.0)),
            record(Some("A"), Some(1e6), Some(10.0)),
            record(Some("B"), Some(1e6), Some(10.0)),
        ];
        let enriched = enrich(&records).unwrap();
        assert_eq!(districts_in_order(&enriched), vec!["B", "A"]);
    }
}

use tracing::debug;

use crate::models::{PriceRange, TransactionRecord};

/// Keep the records whose total price lies inside `range`, bounds included.
///
/// Records without a price never match. An inverted range selects nothing.
pub fn filter_by_price(records: Vec<TransactionRecord>, range: &PriceRange) -> Vec<TransactionRecord> {
    let total = records.len();
    let selected: Vec<TransactionRecord> = records
        .into_iter()
        .filter(|r| r.total_price.is_some_and(|price| range.contains(price)))
        .collect();

    debug!(
        "Price filter {} kept {} of {} records",
        range,
        selected.len(),
        total
    );
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priced(row: usize, price: Option<f64>) -> TransactionRecord {
        TransactionRecord {
            row,
            district: Some("X".into()),
            address: None,
            total_price: price,
            floor_area: Some(30.0),
            listed_unit_price: None,
        }
    }

    #[test]
    fn test_every_kept_record_is_in_range() {
        let records: Vec<_> = (0..200)
            .map(|i| priced(i, Some(i as f64 * 100_000.0)))
            .collect();

        for (min, max) in [(0.0, 0.0), (1.0, 5.0), (3.0, 8.0), (10.0, 19.9), (0.5, 0.5)] {
            let range = PriceRange::from_millions(min, max);
            let kept = filter_by_price(records.clone(), &range);
            let expected = records
                .iter()
                .filter(|r| {
                    let p = r.total_price.unwrap();
                    p >= min * 1e6 && p <= max * 1e6
                })
                .count();

            assert_eq!(kept.len(), expected);
            assert!(kept.iter().all(|r| {
                let p = r.total_price.unwrap();
                p >= min * 1e6 && p <= max * 1e6
            }));
        }
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let records = vec![
            priced(0, Some(3_000_000.0)),
            priced(1, Some(8_000_000.0)),
            priced(2, Some(2_999_999.0)),
            priced(3, Some(8_000_001.0)),
        ];
        let kept = filter_by_price(records, &PriceRange::from_millions(3.0, 8.0));
        let rows: Vec<usize> = kept.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![0, 1]);
    }

    #[test]
    fn test_missing_price_never_matches() {
        let kept = filter_by_price(vec![priced(0, None)], &PriceRange::from_millions(0.0, 1e9));
        assert!(kept.is_empty());
    }

    #[test]
    fn test_inverted_range_selects_nothing() {
        let kept = filter_by_price(
            vec![priced(0, Some(5_000_000.0))],
            &PriceRange::from_millions(8.0, 3.0),
        );
        assert!(kept.is_empty());
    }
}

#![allow(missing_docs)]

use std::collections::BTreeSet;

use epi_model::{AgeBucket, CategoryValue, MergedSeriesRow};
use epi_report::merge_series;
use proptest::prelude::*;

#[test]
fn age_rows_merge_against_all_buckets() {
    let main = vec![CategoryValue::count("0-4", 3)];
    let compare = vec![CategoryValue::count("5-9", 7)];
    let rows = merge_series(&main, &compare, &AgeBucket::labels());

    assert_eq!(rows.len(), 8);
    assert_eq!(
        rows[0],
        MergedSeriesRow {
            category: "0-4".to_string(),
            main_value: 3.0,
            compare_value: 0.0,
        }
    );
    assert_eq!(
        rows[1],
        MergedSeriesRow {
            category: "5-9".to_string(),
            main_value: 0.0,
            compare_value: 7.0,
        }
    );
    assert!(
        rows[2..]
            .iter()
            .all(|row| row.main_value == 0.0 && row.compare_value == 0.0)
    );
    let categories: Vec<&str> = rows.iter().map(|row| row.category.as_str()).collect();
    assert_eq!(categories, AgeBucket::ALL.map(AgeBucket::label).to_vec());
}

fn category() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(AgeBucket::labels()),
        "[a-z0-9+ -]{1,6}",
    ]
}

fn series() -> impl Strategy<Value = Vec<CategoryValue>> {
    prop::collection::vec(
        (category(), prop_oneof![0.0..1000.0f64, Just(f64::NAN), Just(-1.0)])
            .prop_map(|(category, value)| CategoryValue::new(category, value)),
        0..12,
    )
}

proptest! {
    #[test]
    fn every_category_appears_once(main in series(), compare in series()) {
        let canonical = AgeBucket::labels();
        let rows = merge_series(&main, &compare, &canonical);

        let extras: BTreeSet<&str> = main
            .iter()
            .chain(&compare)
            .map(|row| row.category.as_str())
            .filter(|category| !canonical.iter().any(|c| c == category))
            .collect();
        prop_assert_eq!(rows.len(), canonical.len() + extras.len());

        let distinct: BTreeSet<&str> = rows.iter().map(|row| row.category.as_str()).collect();
        prop_assert_eq!(distinct.len(), rows.len());

        for (row, expected) in rows.iter().zip(&canonical) {
            prop_assert_eq!(&row.category, expected);
        }
        for row in &rows {
            prop_assert!(row.main_value.is_finite() && row.main_value >= 0.0);
            prop_assert!(row.compare_value.is_finite() && row.compare_value >= 0.0);
        }
    }

    #[test]
    fn extra_order_ignores_input_order(
        (main, shuffled) in series()
            .prop_flat_map(|rows| (Just(rows.clone()), Just(rows).prop_shuffle()))
    ) {
        let canonical = AgeBucket::labels();
        let a = merge_series(&main, &[], &canonical);
        let b = merge_series(&shuffled, &[], &canonical);
        let order = |rows: &[MergedSeriesRow]| {
            rows.iter().map(|row| row.category.clone()).collect::<Vec<_>>()
        };
        prop_assert_eq!(order(&a), order(&b));

        // Swapping sides swaps values but not the order.
        let swapped = merge_series(&[], &main, &canonical);
        prop_assert_eq!(order(&a), order(&swapped));
    }
}

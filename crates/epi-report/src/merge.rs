//! Two-sided series merge with canonical category ordering.

use std::collections::{BTreeSet, HashMap};

use epi_model::{CategoryValue, MergedSeriesRow};

/// Sort key for extras that match no canonical category at all.
const UNRECOGNIZED: usize = usize::MAX;

/// Combine a main and a compare series into one row per category.
///
/// Every canonical category appears exactly once, in canonical order, with
/// absent values as 0. Categories outside `canonical` follow, ordered by the
/// canonical slot they resemble and then lexically. Values that are negative
/// or not finite become 0. Duplicate categories within one side are summed.
pub fn merge_series(
    main: &[CategoryValue],
    compare: &[CategoryValue],
    canonical: &[String],
) -> Vec<MergedSeriesRow> {
    let main_values = value_map(main);
    let compare_values = value_map(compare);

    let known: BTreeSet<&str> = canonical.iter().map(String::as_str).collect();
    let mut extras: Vec<&str> = main_values
        .keys()
        .chain(compare_values.keys())
        .copied()
        .filter(|category| !known.contains(category))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    extras.sort_by_key(|category| (fallback_index(category, canonical), *category));

    let mut rows = Vec::with_capacity(canonical.len() + extras.len());
    for category in canonical.iter().map(String::as_str).chain(extras) {
        rows.push(MergedSeriesRow {
            category: category.to_string(),
            main_value: value_of(&main_values, category),
            compare_value: value_of(&compare_values, category),
        });
    }
    rows
}

fn value_map(rows: &[CategoryValue]) -> HashMap<&str, f64> {
    let mut values = HashMap::with_capacity(rows.len());
    for row in rows {
        let total = values.entry(row.category.as_str()).or_insert(0.0);
        *total = saturating_add(*total, sanitize(row.value));
    }
    values
}

fn value_of(values: &HashMap<&str, f64>, category: &str) -> f64 {
    values.get(category).copied().unwrap_or(0.0)
}

/// Sum of two sanitized values, capped so it stays finite.
fn saturating_add(left: f64, right: f64) -> f64 {
    let sum = left + right;
    if sum.is_finite() {
        sum
    } else {
        f64::MAX
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Canonical slot an unknown category resembles.
///
/// `" 0-4 "` or `"0-4 ปี"` sit next to `0-4`: a match on the normalized
/// label wins, then a match on the leading number.
fn fallback_index(category: &str, canonical: &[String]) -> usize {
    let normalized = normalize(category);
    if let Some(index) = canonical.iter().position(|c| normalize(c) == normalized) {
        return index;
    }
    leading_number(&normalized)
        .and_then(|number| {
            canonical
                .iter()
                .position(|c| leading_number(&normalize(c)) == Some(number))
        })
        .unwrap_or(UNRECOGNIZED)
}

fn normalize(label: &str) -> String {
    label
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn leading_number(label: &str) -> Option<u64> {
    let digits: String = label.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|l| (*l).to_string()).collect()
    }

    #[test]
    fn bad_values_become_zero() {
        let main = vec![
            CategoryValue::new("a", f64::NAN),
            CategoryValue::new("b", -4.0),
            CategoryValue::new("c", f64::INFINITY),
        ];
        let rows = merge_series(&main, &[], &canonical(&["a", "b", "c"]));
        assert!(rows.iter().all(|row| row.main_value == 0.0));
    }

    #[test]
    fn duplicate_categories_are_summed() {
        let main = vec![CategoryValue::count("a", 2), CategoryValue::count("a", 3)];
        let rows = merge_series(&main, &[], &canonical(&["a"]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].main_value, 5.0);
    }

    #[test]
    fn summed_duplicates_stay_finite() {
        let main = vec![
            CategoryValue::new("a", f64::MAX),
            CategoryValue::new("a", f64::MAX),
        ];
        let compare = vec![CategoryValue::new("a", 1.0), CategoryValue::new("a", 2.0)];
        let rows = merge_series(&main, &compare, &canonical(&["a"]));
        assert!(rows[0].main_value.is_finite());
        assert_eq!(rows[0].main_value, f64::MAX);
        assert_eq!(rows[0].compare_value, 3.0);
    }

    #[test]
    fn extras_follow_the_slot_they_resemble() {
        let order = canonical(&["0-4", "5-9", "60+"]);
        let compare = vec![
            CategoryValue::count("zzz", 1),
            CategoryValue::count("60-69", 1),
            CategoryValue::count("5 - 9", 1),
            CategoryValue::count("abc", 1),
        ];
        let categories: Vec<String> = merge_series(&[], &compare, &order)
            .into_iter()
            .map(|row| row.category)
            .collect();
        assert_eq!(
            categories,
            vec!["0-4", "5-9", "60+", "5 - 9", "60-69", "abc", "zzz"]
        );
    }
}

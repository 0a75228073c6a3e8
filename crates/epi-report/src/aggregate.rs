//! Grouped statistics for one selection over one fact table.
//!
//! The store does the grouping; this module folds raw groups into the fixed
//! category sets (age buckets, three genders, every month in range) so each
//! breakdown is complete even when the store returns nothing.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{trace, warn};

use epi_model::{
    AgeBucket, AgeCountRow, Area, CategoryValue, DateRange, FactTable, Gender, GenderBreakdown,
    GenderCountRow, Measure, MonthCountRow, Result, Totals,
};
use epi_store::{CaseFilter, CaseStore};

/// What one side of a report looks at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    /// `None` when a supplied province or region did not resolve; every
    /// aggregate is then zero-valued.
    pub area: Option<Area>,
    /// Canonical disease code; `None` spans the whole table.
    pub disease_code: Option<String>,
    pub table: FactTable,
}

impl Selection {
    pub fn label(&self) -> String {
        self.area
            .as_ref()
            .map_or_else(|| "(unresolved)".to_string(), Area::label)
    }

    fn filter(&self, range: DateRange, measure: Measure) -> Option<CaseFilter<'_>> {
        self.area.as_ref().map(|area| CaseFilter {
            measure,
            range,
            area,
            disease_code: self.disease_code.as_deref(),
        })
    }
}

/// Aggregation functions over a [`CaseStore`].
#[derive(Clone, Copy)]
pub struct Aggregator<'a> {
    cases: &'a dyn CaseStore,
}

impl<'a> Aggregator<'a> {
    pub fn new(cases: &'a dyn CaseStore) -> Self {
        Self { cases }
    }

    /// Counts per age bucket, in bucket order.
    pub fn age_breakdown(
        &self,
        selection: &Selection,
        range: DateRange,
        measure: Measure,
    ) -> Result<Vec<CategoryValue>> {
        let rows = match selection.filter(range, measure) {
            Some(filter) => self.cases.age_counts(&selection.table, &filter)?,
            None => Vec::new(),
        };
        Ok(fold_ages(&rows))
    }

    pub fn gender_breakdown(
        &self,
        selection: &Selection,
        range: DateRange,
        measure: Measure,
    ) -> Result<GenderBreakdown> {
        let rows = match selection.filter(range, measure) {
            Some(filter) => self.cases.gender_counts(&selection.table, &filter)?,
            None => Vec::new(),
        };
        Ok(fold_genders(&rows))
    }

    /// One row per month between the range bounds, ascending.
    pub fn monthly_trend(
        &self,
        selection: &Selection,
        range: DateRange,
        measure: Measure,
    ) -> Result<Vec<CategoryValue>> {
        let rows = match selection.filter(range, measure) {
            Some(filter) => self.cases.monthly_counts(&selection.table, &filter)?,
            None => Vec::new(),
        };
        Ok(fold_months(&rows, range))
    }

    /// Patients by onset date and deaths by death date over the same range.
    pub fn totals(&self, selection: &Selection, range: DateRange) -> Result<Totals> {
        let count = |measure| match selection.filter(range, measure) {
            Some(filter) => self.cases.count(&selection.table, &filter),
            None => Ok(0),
        };
        Ok(Totals {
            patients: count(Measure::Patients)?,
            deaths: count(Measure::Deaths)?,
        })
    }
}

/// Zero-filled age bucket counts. Null ages are skipped; ages outside every
/// bucket are skipped with a warning.
pub fn fold_ages(rows: &[AgeCountRow]) -> Vec<CategoryValue> {
    let mut counts: BTreeMap<AgeBucket, u64> = BTreeMap::new();
    for row in rows {
        let Some(age) = row.age_years else {
            trace!(count = row.count, "skipping cases without age");
            continue;
        };
        match AgeBucket::for_age(age) {
            Some(bucket) => *counts.entry(bucket).or_default() += row.count,
            None => warn!(age, count = row.count, "age outside every bucket; dropped"),
        }
    }
    AgeBucket::ALL
        .iter()
        .map(|bucket| {
            let count = counts.get(bucket).copied().unwrap_or(0);
            CategoryValue::count(bucket.label(), count)
        })
        .collect()
}

/// Classify raw gender groups into the three fixed categories.
pub fn fold_genders(rows: &[GenderCountRow]) -> GenderBreakdown {
    let mut breakdown = GenderBreakdown::default();
    for row in rows {
        let gender = row.gender.as_deref().map_or(Gender::Unknown, Gender::classify);
        breakdown.add(gender, row.count);
    }
    breakdown
}

/// Every month of `range` with its count; months without rows are 0.
pub fn fold_months(rows: &[MonthCountRow], range: DateRange) -> Vec<CategoryValue> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for row in rows {
        *counts.entry(row.month.as_str()).or_default() += row.count;
    }
    let months = range.months();
    for month in counts.keys() {
        if !months.iter().any(|known| known.as_str() == *month) {
            warn!(month = *month, "monthly row outside the requested range; dropped");
        }
    }
    months
        .into_iter()
        .map(|month| {
            let count = counts.get(month.as_str()).copied().unwrap_or(0);
            CategoryValue::count(month, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn gender_row(gender: Option<&str>, count: u64) -> GenderCountRow {
        GenderCountRow {
            gender: gender.map(str::to_string),
            count,
        }
    }

    #[test]
    fn gender_synonyms_fold_together() {
        let rows = vec![
            gender_row(Some("M"), 5),
            gender_row(Some("ชาย"), 2),
            gender_row(Some("X"), 1),
        ];
        let breakdown = fold_genders(&rows);
        assert_eq!(
            breakdown,
            GenderBreakdown {
                male: 7,
                female: 0,
                unknown: 1
            }
        );
    }

    #[test]
    fn null_gender_is_unknown() {
        let breakdown = fold_genders(&[gender_row(None, 4), gender_row(Some(" Female "), 1)]);
        assert_eq!(breakdown.unknown, 4);
        assert_eq!(breakdown.female, 1);
    }

    #[test]
    fn ages_fill_every_bucket() {
        let rows = vec![
            AgeCountRow {
                age_years: Some(3),
                count: 2,
            },
            AgeCountRow {
                age_years: Some(4),
                count: 1,
            },
            AgeCountRow {
                age_years: Some(95),
                count: 1,
            },
            AgeCountRow {
                age_years: None,
                count: 9,
            },
            AgeCountRow {
                age_years: Some(-1),
                count: 3,
            },
            AgeCountRow {
                age_years: Some(250),
                count: 3,
            },
        ];
        let series = fold_ages(&rows);
        assert_eq!(series.len(), 8);
        assert_eq!(series[0], CategoryValue::count("0-4", 3));
        assert_eq!(series[7], CategoryValue::count("60+", 1));
        let total: f64 = series.iter().map(|row| row.value).sum();
        assert_eq!(total, 4.0);
    }

    #[test]
    fn months_are_gap_filled() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
        )
        .unwrap();
        let rows = vec![MonthCountRow {
            month: "2024-03".to_string(),
            count: 6,
        }];
        let series = fold_months(&rows, range);
        let pairs: Vec<(&str, f64)> = series
            .iter()
            .map(|row| (row.category.as_str(), row.value))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("2024-01", 0.0),
                ("2024-02", 0.0),
                ("2024-03", 6.0),
                ("2024-04", 0.0)
            ]
        );
    }
}

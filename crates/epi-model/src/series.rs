//! Result rows produced by the aggregation layer and the raw grouped rows
//! the stores hand back.

use serde::{Deserialize, Serialize};

use crate::Gender;

/// One `{category, value}` pair of a breakdown or time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryValue {
    pub category: String,
    pub value: f64,
}

impl CategoryValue {
    pub fn new(category: impl Into<String>, value: f64) -> Self {
        Self {
            category: category.into(),
            value,
        }
    }

    pub fn count(category: impl Into<String>, count: u64) -> Self {
        Self::new(category, count as f64)
    }
}

/// One row of a main-vs-compare series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedSeriesRow {
    pub category: String,
    pub main_value: f64,
    pub compare_value: f64,
}

/// Male/female/unknown counts; always sums to the number of records in scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderBreakdown {
    pub male: u64,
    pub female: u64,
    pub unknown: u64,
}

impl GenderBreakdown {
    pub fn add(&mut self, gender: Gender, count: u64) {
        match gender {
            Gender::Male => self.male += count,
            Gender::Female => self.female += count,
            Gender::Unknown => self.unknown += count,
        }
    }

    pub fn get(&self, gender: Gender) -> u64 {
        match gender {
            Gender::Male => self.male,
            Gender::Female => self.female,
            Gender::Unknown => self.unknown,
        }
    }

    pub fn total(&self) -> u64 {
        self.male + self.female + self.unknown
    }

    pub fn to_series(self) -> Vec<CategoryValue> {
        Gender::ALL
            .iter()
            .map(|gender| CategoryValue::count(gender.as_str(), self.get(*gender)))
            .collect()
    }
}

/// Scalar patient and death counts for one scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub patients: u64,
    pub deaths: u64,
}

/// Cases grouped by raw age in years (`None` for a null age).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeCountRow {
    pub age_years: Option<i64>,
    pub count: u64,
}

/// Cases grouped by the raw, unnormalized gender value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenderCountRow {
    pub gender: Option<String>,
    pub count: u64,
}

/// Cases grouped by `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthCountRow {
    pub month: String,
    pub count: u64,
}

//! Aggregation, series merging and comparison reports.

pub mod aggregate;
pub mod merge;
pub mod params;
pub mod report;

pub use aggregate::{Aggregator, Selection, fold_ages, fold_genders, fold_months};
pub use merge::merge_series;
pub use params::QueryParams;
pub use report::{ComparisonReport, Reporter, SideSummary};

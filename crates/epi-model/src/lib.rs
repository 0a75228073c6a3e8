//! Data model for the disease surveillance aggregation core.

pub mod case;
pub mod error;
pub mod ids;
pub mod range;
pub mod reference;
pub mod series;

pub use case::{AGE_SENTINEL_MAX, AgeBucket, CaseRecord, Gender, Measure};
pub use error::{EpiError, ErrorKind, Result};
pub use ids::{FactTable, SqlIdent, is_safe_identifier};
pub use range::{DateRange, END_DATE_FIELD, START_DATE_FIELD, month_key, parse_date_bound};
pub use reference::{Area, CanonicalDisease, CanonicalProvince, CanonicalRegion, FactTableMapping};
pub use series::{
    AgeCountRow, CategoryValue, GenderBreakdown, GenderCountRow, MergedSeriesRow, MonthCountRow,
    Totals,
};

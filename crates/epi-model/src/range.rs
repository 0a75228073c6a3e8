//! Inclusive calendar date ranges and the parsing rules for `start_date` /
//! `end_date` parameters.
//!
//! A bound that is absent (or blank) falls back to the calendar year window:
//! January 1 for the start and December 31 for the end, taking the year from
//! the other bound when it is present. A bound that is present but does not
//! parse is always an error naming its field.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{EpiError, Result};

pub const START_DATE_FIELD: &str = "start_date";
pub const END_DATE_FIELD: &str = "end_date";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(EpiError::invalid_argument(
                START_DATE_FIELD,
                start.to_string(),
                format!("must not be after {END_DATE_FIELD} {end}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// Build a range from raw request parameters.
    ///
    /// `today` only matters when both bounds are absent.
    pub fn from_params(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> Result<Self> {
        let start = present(start)
            .map(|raw| parse_date_bound(START_DATE_FIELD, raw))
            .transpose()?;
        let end = present(end)
            .map(|raw| parse_date_bound(END_DATE_FIELD, raw))
            .transpose()?;

        let start = match start {
            Some(date) => date,
            None => year_start(end.map_or(today.year(), |d| d.year()))?,
        };
        let end = match end {
            Some(date) => date,
            None => year_end(start.year())?,
        };
        Self::new(start, end)
    }

    /// Whole calendar year.
    pub fn year(year: i32) -> Result<Self> {
        Self::new(year_start(year)?, year_end(year)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every `YYYY-MM` key touched by the range, ascending.
    pub fn months(&self) -> Vec<String> {
        let mut months = Vec::new();
        let (mut year, mut month) = (self.start.year(), self.start.month());
        let (end_year, end_month) = (self.end.year(), self.end.month());
        while (year, month) <= (end_year, end_month) {
            months.push(format!("{year:04}-{month:02}"));
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }
        months
    }
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn year_start(year: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| {
        EpiError::invalid_argument(START_DATE_FIELD, year.to_string(), "year out of range")
    })
}

fn year_end(year: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(|| {
        EpiError::invalid_argument(END_DATE_FIELD, year.to_string(), "year out of range")
    })
}

/// Parse one date bound, naming `field` in the error.
pub fn parse_date_bound(field: &str, raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(datetime.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(datetime.date());
        }
    }
    Err(EpiError::invalid_argument(
        field,
        trimmed,
        "expected a calendar date such as 2024-01-31",
    ))
}

/// `YYYY-MM` key of a date. Lexical order equals chronological order.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn unparseable_end_names_the_field() {
        let error = DateRange::from_params(Some("2024-01-01"), Some("not-a-date"), date(2024, 6, 1))
            .unwrap_err();
        assert_eq!(error.field(), Some("end_date"));
        assert!(error.to_string().contains("not-a-date"));
    }

    #[test]
    fn unparseable_start_is_never_replaced_by_default() {
        let error = DateRange::from_params(Some("2024-13-01"), None, date(2024, 6, 1)).unwrap_err();
        assert_eq!(error.field(), Some("start_date"));
    }

    #[test]
    fn absent_bounds_fall_back_to_calendar_year() {
        let range = DateRange::from_params(None, None, date(2023, 6, 1)).unwrap();
        assert_eq!(range.start, date(2023, 1, 1));
        assert_eq!(range.end, date(2023, 12, 31));

        let range = DateRange::from_params(Some("2022-03-05"), Some("  "), date(2024, 6, 1)).unwrap();
        assert_eq!(range.start, date(2022, 3, 5));
        assert_eq!(range.end, date(2022, 12, 31));

        let range = DateRange::from_params(None, Some("2021-02-01"), date(2024, 6, 1)).unwrap();
        assert_eq!(range.start, date(2021, 1, 1));
    }

    #[test]
    fn accepts_timestamps_and_slashes() {
        assert_eq!(parse_date_bound("x", "2024/02/29").unwrap(), date(2024, 2, 29));
        assert_eq!(
            parse_date_bound("x", "2024-02-29T23:10:00+07:00").unwrap(),
            date(2024, 2, 29)
        );
        assert_eq!(parse_date_bound("x", "2024-02-29 08:00:00").unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let error = DateRange::from_params(Some("2024-05-01"), Some("2024-04-01"), date(2024, 1, 1))
            .unwrap_err();
        assert_eq!(error.field(), Some("start_date"));
    }

    #[test]
    fn months_span_year_boundaries() {
        let range = DateRange::new(date(2023, 11, 15), date(2024, 2, 1)).unwrap();
        assert_eq!(range.months(), vec!["2023-11", "2023-12", "2024-01", "2024-02"]);
        assert_eq!(month_key(date(2024, 3, 9)), "2024-03");
    }
}

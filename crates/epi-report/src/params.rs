//! Raw request parameters and their accepted aliases.

use chrono::NaiveDate;

use epi_model::{DateRange, EpiError, Measure, Result};
use epi_resolve::DiseaseParam;

const PROVINCE_KEYS: &[&str] = &["province", "mainProvince", "main_province"];
const COMPARE_PROVINCE_KEYS: &[&str] = &["compareProvince", "compare_province"];
const REGION_KEYS: &[&str] = &["region", "mainRegion", "main_region"];
const COMPARE_REGION_KEYS: &[&str] = &["compareRegion", "compare_region"];
const DISEASE_KEYS: &[&str] = &["disease", "disease_code", "code"];
const DISEASE_ID_KEYS: &[&str] = &["disease_id", "diseaseId"];
const START_KEYS: &[&str] = &["start_date", "startDate"];
const END_KEYS: &[&str] = &["end_date", "endDate"];
const MEASURE_KEYS: &[&str] = &["measure"];

/// Parameters of a comparison request, keyed by meaning rather than name.
///
/// Blank values are treated as absent. When an alias appears more than once
/// the first non-blank value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub province: Option<String>,
    pub compare_province: Option<String>,
    pub region: Option<String>,
    pub compare_region: Option<String>,
    pub disease: Option<DiseaseParam>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub measure: Measure,
}

impl QueryParams {
    /// Build from `(name, value)` pairs such as a decoded query string.
    ///
    /// `disease_id` takes precedence over every other disease alias and must
    /// be an integer.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_string(), v.as_ref().trim().to_string()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        let pick = |keys: &[&str]| {
            pairs
                .iter()
                .find(|(k, _)| keys.contains(&k.as_str()))
                .map(|(_, v)| v.clone())
        };

        let disease = match pick(DISEASE_ID_KEYS) {
            Some(raw) => Some(DiseaseParam::Id(raw.parse().map_err(|_| {
                EpiError::invalid_argument("disease_id", raw.as_str(), "expected an integer id")
            })?)),
            None => pick(DISEASE_KEYS).map(DiseaseParam::Code),
        };
        let measure = match pick(MEASURE_KEYS) {
            Some(raw) => raw
                .parse::<Measure>()
                .map_err(|reason| EpiError::invalid_argument("measure", raw.as_str(), reason))?,
            None => Measure::default(),
        };

        Ok(Self {
            province: pick(PROVINCE_KEYS),
            compare_province: pick(COMPARE_PROVINCE_KEYS),
            region: pick(REGION_KEYS),
            compare_region: pick(COMPARE_REGION_KEYS),
            disease,
            start_date: pick(START_KEYS),
            end_date: pick(END_KEYS),
            measure,
        })
    }

    /// Inclusive range, defaulting absent bounds to a calendar year.
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange> {
        DateRange::from_params(self.start_date.as_deref(), self.end_date.as_deref(), today)
    }
}

//! Collaborator contracts consumed by the resolution and aggregation layers.
//!
//! Lookups return `Ok(None)` for "no such row"; errors are reserved for
//! store failures.

use epi_model::{
    AgeCountRow, Area, CanonicalDisease, CanonicalProvince, CanonicalRegion, DateRange, FactTable,
    FactTableMapping, GenderCountRow, Measure, MonthCountRow, Result,
};

/// Province and region reference data.
pub trait ReferenceStore: Send + Sync {
    fn province_by_id(&self, province_id: i64) -> Result<Option<CanonicalProvince>>;

    /// Exact equality on the Thai name.
    fn province_by_name(&self, name_th: &str) -> Result<Option<CanonicalProvince>>;

    fn region_by_id(&self, region_id: i64) -> Result<Option<CanonicalRegion>>;

    fn region_by_name(&self, name_th: &str) -> Result<Option<CanonicalRegion>>;

    /// All regions ordered by `display_order`.
    fn regions(&self) -> Result<Vec<CanonicalRegion>>;
}

/// Disease metadata and fact-table mappings.
pub trait DiseaseStore: Send + Sync {
    fn disease_by_id(&self, disease_id: i64) -> Result<Option<CanonicalDisease>>;

    /// First disease whose `code` equals one of `candidates`, preferring
    /// earlier candidates.
    fn disease_by_codes(&self, candidates: &[String]) -> Result<Option<CanonicalDisease>>;

    /// First disease whose `name_th` or `name_en` equals one of `candidates`.
    fn disease_by_names(&self, candidates: &[String]) -> Result<Option<CanonicalDisease>>;

    /// An active mapping whose disease code is one of `candidates`.
    /// Inactive rows are never returned.
    fn active_mapping(&self, candidates: &[String]) -> Result<Option<FactTableMapping>>;
}

/// Selection shared by every fact-table aggregate.
#[derive(Debug, Clone)]
pub struct CaseFilter<'a> {
    pub measure: Measure,
    pub range: DateRange,
    pub area: &'a Area,
    /// Canonical disease code; `None` spans every disease in the table.
    pub disease_code: Option<&'a str>,
}

/// Grouped reads against one fact table.
pub trait CaseStore: Send + Sync {
    fn age_counts(&self, table: &FactTable, filter: &CaseFilter<'_>) -> Result<Vec<AgeCountRow>>;

    fn gender_counts(
        &self,
        table: &FactTable,
        filter: &CaseFilter<'_>,
    ) -> Result<Vec<GenderCountRow>>;

    /// Rows ordered ascending by month key.
    fn monthly_counts(
        &self,
        table: &FactTable,
        filter: &CaseFilter<'_>,
    ) -> Result<Vec<MonthCountRow>>;

    fn count(&self, table: &FactTable, filter: &CaseFilter<'_>) -> Result<u64>;
}

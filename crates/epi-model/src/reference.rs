//! Reference data rows: provinces, regions, diseases and fact-table mappings.
//!
//! These are read-only from the point of view of the aggregation core. They
//! are loaded by the store and handed around by value.

use serde::{Deserialize, Serialize};

/// One administrative province.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalProvince {
    pub province_id: i64,
    /// Unique Thai name.
    pub name_th: String,
    pub region_id: Option<i64>,
    /// Health-ministry region label, distinct from `region_id`.
    pub region_name_moph: Option<String>,
}

/// One geographic region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRegion {
    pub region_id: i64,
    pub name_th: String,
    /// Unique, defines report ordering.
    pub display_order: i64,
}

/// One disease definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalDisease {
    pub disease_id: i64,
    /// Canonical code, e.g. `D01`.
    pub code: String,
    pub name_th: String,
    pub name_en: Option<String>,
}

/// Binding of a disease code to the table holding its cases.
///
/// Values are untrusted until turned into a [`crate::FactTable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactTableMapping {
    pub disease_code: String,
    pub schema_name: String,
    pub table_name: String,
    pub is_active: bool,
}

/// The geographic scope of an aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Area {
    Province(CanonicalProvince),
    Region(CanonicalRegion),
    Nationwide,
}

impl Area {
    pub fn label(&self) -> String {
        match self {
            Area::Province(province) => province.name_th.clone(),
            Area::Region(region) => region.name_th.clone(),
            Area::Nationwide => "nationwide".to_string(),
        }
    }
}

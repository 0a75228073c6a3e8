//! Physical table and column names used by the SQL store.
//!
//! Every name is a validated [`SqlIdent`], so a layout read from a config
//! file can be spliced into statements without further checks.

use serde::{Deserialize, Serialize};

use epi_model::{FactTable, SqlIdent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreLayout {
    pub provinces: SqlIdent,
    pub regions: SqlIdent,
    pub diseases: SqlIdent,
    pub fact_mappings: SqlIdent,
    /// Fact table queried when no disease filter is resolved.
    pub default_fact_schema: SqlIdent,
    pub default_fact_table: SqlIdent,
    pub columns: FactColumns,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            provinces: SqlIdent::from_static("ref_province"),
            regions: SqlIdent::from_static("ref_region"),
            diseases: SqlIdent::from_static("ref_disease"),
            fact_mappings: SqlIdent::from_static("disease_fact_table"),
            default_fact_schema: SqlIdent::from_static("main"),
            default_fact_table: SqlIdent::from_static("case_fact"),
            columns: FactColumns::default(),
        }
    }
}

impl StoreLayout {
    pub fn default_fact_table(&self) -> FactTable {
        FactTable {
            schema: self.default_fact_schema.clone(),
            table: self.default_fact_table.clone(),
        }
    }
}

/// Column names shared by every fact table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactColumns {
    pub gender: SqlIdent,
    pub age: SqlIdent,
    pub province_id: SqlIdent,
    pub onset_date: SqlIdent,
    pub death_date: SqlIdent,
    /// `None` when each fact table holds exactly one disease.
    pub disease_code: Option<SqlIdent>,
}

impl Default for FactColumns {
    fn default() -> Self {
        Self {
            gender: SqlIdent::from_static("gender"),
            age: SqlIdent::from_static("age_years"),
            province_id: SqlIdent::from_static("province_id"),
            onset_date: SqlIdent::from_static("onset_date"),
            death_date: SqlIdent::from_static("death_date"),
            disease_code: Some(SqlIdent::from_static("disease_code")),
        }
    }
}

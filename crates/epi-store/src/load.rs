//! CSV seeding for a SQLite store.
//!
//! A seed directory holds the reference files `regions.csv`,
//! `provinces.csv`, `diseases.csv` and `fact_tables.csv`. Every other
//! `<name>.csv` is read as case records and loaded into `main.<name>`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use epi_model::{
    CanonicalDisease, CanonicalProvince, CanonicalRegion, CaseRecord, EpiError, FactTable,
    FactTableMapping, Result,
};

use crate::sqlite::SqliteStore;

pub const REGIONS_FILE: &str = "regions.csv";
pub const PROVINCES_FILE: &str = "provinces.csv";
pub const DISEASES_FILE: &str = "diseases.csv";
pub const MAPPINGS_FILE: &str = "fact_tables.csv";

const REFERENCE_FILES: &[&str] = &[REGIONS_FILE, PROVINCES_FILE, DISEASES_FILE, MAPPINGS_FILE];

/// Row counts written by [`load_seed_dir`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub regions: usize,
    pub provinces: usize,
    pub diseases: usize,
    pub mappings: usize,
    /// `(table, rows)` per case file, in file-name order.
    pub cases: Vec<(FactTable, usize)>,
}

#[derive(Debug, Deserialize)]
struct MappingCsvRow {
    disease_code: String,
    schema_name: String,
    table_name: String,
    #[serde(default)]
    is_active: Option<String>,
}

impl MappingCsvRow {
    fn into_mapping(self) -> FactTableMapping {
        let is_active = self.is_active.as_deref().is_none_or(parse_flag);
        FactTableMapping {
            disease_code: self.disease_code.trim().to_string(),
            schema_name: self.schema_name.trim().to_string(),
            table_name: self.table_name.trim().to_string(),
            is_active,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "1" | "y" | "yes" | "t" | "true"
    )
}

pub fn read_csv_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let context = || format!("read {}", path.display());
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| EpiError::store(context(), e))?;
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| EpiError::store(context(), e))
}

/// Load every seed file found in `dir`. Missing reference files are skipped.
pub fn load_seed_dir(store: &SqliteStore, dir: &Path) -> Result<LoadSummary> {
    store.bootstrap_reference_schema()?;
    let mut summary = LoadSummary::default();

    if let Some(path) = existing(dir, REGIONS_FILE) {
        summary.regions = store.insert_regions(&read_csv_rows::<CanonicalRegion>(&path)?)?;
    }
    if let Some(path) = existing(dir, PROVINCES_FILE) {
        summary.provinces = store.insert_provinces(&read_csv_rows::<CanonicalProvince>(&path)?)?;
    }
    if let Some(path) = existing(dir, DISEASES_FILE) {
        summary.diseases = store.insert_diseases(&read_csv_rows::<CanonicalDisease>(&path)?)?;
    }
    if let Some(path) = existing(dir, MAPPINGS_FILE) {
        let mappings: Vec<FactTableMapping> = read_csv_rows::<MappingCsvRow>(&path)?
            .into_iter()
            .map(MappingCsvRow::into_mapping)
            .collect();
        summary.mappings = store.insert_mappings(&mappings)?;
    }

    for path in case_files(dir)? {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let table = FactTable::new("main", stem)?;
        let cases = read_csv_rows::<CaseRecord>(&path)?;
        store.create_fact_table(&table)?;
        let written = store.insert_cases(&table, &cases)?;
        debug!(table = %table, rows = written, "loaded case file");
        summary.cases.push((table, written));
    }

    info!(
        regions = summary.regions,
        provinces = summary.provinces,
        diseases = summary.diseases,
        mappings = summary.mappings,
        case_tables = summary.cases.len(),
        "seed directory loaded"
    );
    Ok(summary)
}

fn existing(dir: &Path, name: &str) -> Option<PathBuf> {
    let path = dir.join(name);
    if path.is_file() {
        Some(path)
    } else {
        debug!(file = name, "seed file not present");
        None
    }
}

fn case_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).map_err(|e| EpiError::store(format!("read {}", dir.display()), e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| EpiError::store(format!("read {}", dir.display()), e))?
            .path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        let is_reference = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| REFERENCE_FILES.contains(&name));
        if path.is_file() && is_csv && !is_reference {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

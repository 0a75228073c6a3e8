//! SQLite implementation of the store contracts.
//!
//! One connection guarded by a mutex; reads issued from several threads are
//! serialized by the lock, which keeps `SqliteStore` `Send + Sync`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params, params_from_iter};
use tracing::{debug, trace, warn};

use epi_model::{
    AgeCountRow, CanonicalDisease, CanonicalProvince, CanonicalRegion, CaseRecord, EpiError,
    FactTable, FactTableMapping, GenderCountRow, MonthCountRow, Result, SqlIdent,
};

use crate::layout::StoreLayout;
use crate::sql::{FactQuery, Grouping, build_fact_query, placeholders};
use crate::traits::{CaseFilter, CaseStore, DiseaseStore, ReferenceStore};

pub struct SqliteStore {
    conn: Mutex<Connection>,
    layout: StoreLayout,
}

impl SqliteStore {
    pub fn open(path: &Path, layout: StoreLayout) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| EpiError::store(format!("open {}", path.display()), e))?;
        Ok(Self::from_connection(conn, layout))
    }

    pub fn open_in_memory(layout: StoreLayout) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| EpiError::store("open memory", e))?;
        Ok(Self::from_connection(conn, layout))
    }

    pub fn from_connection(conn: Connection, layout: StoreLayout) -> Self {
        Self {
            conn: Mutex::new(conn),
            layout,
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| EpiError::Internal("sqlite connection lock poisoned".to_string()))
    }

    fn with_conn<T>(
        &self,
        context: &str,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let conn = self.lock()?;
        f(&conn).map_err(|e| EpiError::store(context, e))
    }

    /// Make another database file reachable under `schema`.
    pub fn attach(&self, path: &Path, schema: &SqlIdent) -> Result<()> {
        let sql = format!("ATTACH DATABASE ? AS {}", schema.quoted());
        let location = path.to_string_lossy().into_owned();
        self.with_conn("attach database", |conn| {
            conn.execute(&sql, params![location]).map(|_| ())
        })
    }

    /// Create the reference tables if they do not exist yet.
    pub fn bootstrap_reference_schema(&self) -> Result<()> {
        let layout = &self.layout;
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {regions} (
                region_id INTEGER PRIMARY KEY,
                name_th TEXT NOT NULL UNIQUE,
                display_order INTEGER NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS {provinces} (
                province_id INTEGER PRIMARY KEY,
                name_th TEXT NOT NULL UNIQUE,
                region_id INTEGER,
                region_name_moph TEXT
            );
            CREATE TABLE IF NOT EXISTS {diseases} (
                disease_id INTEGER PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                name_th TEXT NOT NULL,
                name_en TEXT
            );
            CREATE TABLE IF NOT EXISTS {mappings} (
                disease_code TEXT NOT NULL,
                schema_name TEXT NOT NULL,
                table_name TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            );",
            regions = layout.regions.quoted(),
            provinces = layout.provinces.quoted(),
            diseases = layout.diseases.quoted(),
            mappings = layout.fact_mappings.quoted(),
        );
        self.with_conn("bootstrap reference schema", |conn| conn.execute_batch(&ddl))
    }

    /// Create a fact table with the configured column names.
    pub fn create_fact_table(&self, table: &FactTable) -> Result<()> {
        let columns = &self.layout.columns;
        let disease_column = columns
            .disease_code
            .as_ref()
            .map(|column| format!("{} TEXT,", column.quoted()))
            .unwrap_or_default();
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                {disease_column}
                {province} INTEGER NOT NULL,
                {gender} TEXT,
                {age} INTEGER,
                {onset} TEXT NOT NULL,
                {death} TEXT
            )",
            table = table.qualified_name(),
            province = columns.province_id.quoted(),
            gender = columns.gender.quoted(),
            age = columns.age.quoted(),
            onset = columns.onset_date.quoted(),
            death = columns.death_date.quoted(),
        );
        debug!(table = %table, "creating fact table");
        self.with_conn("create fact table", |conn| conn.execute_batch(&ddl))
    }

    pub fn insert_regions(&self, regions: &[CanonicalRegion]) -> Result<usize> {
        let sql = format!(
            "INSERT OR REPLACE INTO {} (region_id, name_th, display_order) VALUES (?1, ?2, ?3)",
            self.layout.regions.quoted()
        );
        self.insert_all("insert regions", &sql, regions, |stmt, region| {
            stmt.execute(params![region.region_id, region.name_th, region.display_order])
        })
    }

    pub fn insert_provinces(&self, provinces: &[CanonicalProvince]) -> Result<usize> {
        let sql = format!(
            "INSERT OR REPLACE INTO {} (province_id, name_th, region_id, region_name_moph) \
             VALUES (?1, ?2, ?3, ?4)",
            self.layout.provinces.quoted()
        );
        self.insert_all("insert provinces", &sql, provinces, |stmt, province| {
            stmt.execute(params![
                province.province_id,
                province.name_th,
                province.region_id,
                province.region_name_moph
            ])
        })
    }

    pub fn insert_diseases(&self, diseases: &[CanonicalDisease]) -> Result<usize> {
        let sql = format!(
            "INSERT OR REPLACE INTO {} (disease_id, code, name_th, name_en) \
             VALUES (?1, ?2, ?3, ?4)",
            self.layout.diseases.quoted()
        );
        self.insert_all("insert diseases", &sql, diseases, |stmt, disease| {
            stmt.execute(params![
                disease.disease_id,
                disease.code,
                disease.name_th,
                disease.name_en
            ])
        })
    }

    pub fn insert_mappings(&self, mappings: &[FactTableMapping]) -> Result<usize> {
        let sql = format!(
            "INSERT INTO {} (disease_code, schema_name, table_name, is_active) \
             VALUES (?1, ?2, ?3, ?4)",
            self.layout.fact_mappings.quoted()
        );
        self.insert_all("insert mappings", &sql, mappings, |stmt, mapping| {
            stmt.execute(params![
                mapping.disease_code,
                mapping.schema_name,
                mapping.table_name,
                mapping.is_active
            ])
        })
    }

    pub fn insert_cases(&self, table: &FactTable, cases: &[CaseRecord]) -> Result<usize> {
        let columns = &self.layout.columns;
        let sql = match &columns.disease_code {
            Some(disease) => format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                table.qualified_name(),
                columns.province_id.quoted(),
                columns.gender.quoted(),
                columns.age.quoted(),
                columns.onset_date.quoted(),
                columns.death_date.quoted(),
                disease.quoted(),
            ),
            None => format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4, ?5)",
                table.qualified_name(),
                columns.province_id.quoted(),
                columns.gender.quoted(),
                columns.age.quoted(),
                columns.onset_date.quoted(),
                columns.death_date.quoted(),
            ),
        };
        let with_disease = columns.disease_code.is_some();
        self.insert_all("insert cases", &sql, cases, |stmt, case| {
            let onset = case.onset_date.format("%Y-%m-%d").to_string();
            let death = case.death_date.map(|d| d.format("%Y-%m-%d").to_string());
            if with_disease {
                stmt.execute(params![
                    case.province_id,
                    case.gender,
                    case.age_years,
                    onset,
                    death,
                    case.disease_code
                ])
            } else {
                stmt.execute(params![
                    case.province_id,
                    case.gender,
                    case.age_years,
                    onset,
                    death
                ])
            }
        })
    }

    fn insert_all<T>(
        &self,
        context: &str,
        sql: &str,
        rows: &[T],
        mut insert: impl FnMut(&mut rusqlite::Statement<'_>, &T) -> rusqlite::Result<usize>,
    ) -> Result<usize> {
        let mut conn = self.lock()?;
        write_rows(&mut conn, sql, rows, &mut insert).map_err(|e| EpiError::store(context, e))
    }

    fn run_fact_query<T>(
        &self,
        context: &str,
        query: &FactQuery,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        trace!(sql = %query.sql, "fact query");
        self.with_conn(context, |conn| {
            let mut stmt = conn.prepare(&query.sql)?;
            let rows = stmt.query_map(params_from_iter(query.params.iter()), map)?;
            rows.collect()
        })
    }

    fn find_province(
        &self,
        column: &str,
        value: &dyn ToSql,
    ) -> Result<Option<CanonicalProvince>> {
        let sql = format!(
            "SELECT province_id, name_th, region_id, region_name_moph FROM {} WHERE {column} = ?1",
            self.layout.provinces.quoted()
        );
        self.with_conn("province lookup", |conn| {
            conn.query_row(&sql, [value], province_from_row).optional()
        })
    }

    fn find_region(&self, column: &str, value: &dyn ToSql) -> Result<Option<CanonicalRegion>> {
        let sql = format!(
            "SELECT region_id, name_th, display_order FROM {} WHERE {column} = ?1",
            self.layout.regions.quoted()
        );
        self.with_conn("region lookup", |conn| {
            conn.query_row(&sql, [value], region_from_row).optional()
        })
    }

    fn diseases_where(&self, predicate: &str, values: &[String]) -> Result<Vec<CanonicalDisease>> {
        let sql = format!(
            "SELECT disease_id, code, name_th, name_en FROM {} WHERE {predicate}",
            self.layout.diseases.quoted()
        );
        self.with_conn("disease lookup", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), disease_from_row)?;
            rows.collect()
        })
    }
}

fn write_rows<T>(
    conn: &mut Connection,
    sql: &str,
    rows: &[T],
    insert: &mut impl FnMut(&mut rusqlite::Statement<'_>, &T) -> rusqlite::Result<usize>,
) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    let mut written = 0;
    {
        let mut stmt = tx.prepare(sql)?;
        for row in rows {
            written += insert(&mut stmt, row)?;
        }
    }
    tx.commit()?;
    Ok(written)
}

fn province_from_row(row: &Row<'_>) -> rusqlite::Result<CanonicalProvince> {
    Ok(CanonicalProvince {
        province_id: row.get(0)?,
        name_th: row.get(1)?,
        region_id: row.get(2)?,
        region_name_moph: row.get(3)?,
    })
}

fn region_from_row(row: &Row<'_>) -> rusqlite::Result<CanonicalRegion> {
    Ok(CanonicalRegion {
        region_id: row.get(0)?,
        name_th: row.get(1)?,
        display_order: row.get(2)?,
    })
}

fn disease_from_row(row: &Row<'_>) -> rusqlite::Result<CanonicalDisease> {
    Ok(CanonicalDisease {
        disease_id: row.get(0)?,
        code: row.get(1)?,
        name_th: row.get(2)?,
        name_en: row.get(3)?,
    })
}

/// Age in whole years from whatever the column holds. Blank and null are
/// missing; anything else that is not a number is missing and logged.
fn age_from(value: ValueRef<'_>) -> Option<i64> {
    let parsed = match value {
        ValueRef::Null => return None,
        ValueRef::Integer(age) => Some(age),
        ValueRef::Real(age) => whole_years(age),
        ValueRef::Text(raw) => {
            let text = String::from_utf8_lossy(raw);
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(whole_years))
        }
        ValueRef::Blob(_) => None,
    };
    if parsed.is_none() {
        warn!(value = ?value, "non-numeric age left out of age counts");
    }
    parsed
}

fn whole_years(age: f64) -> Option<i64> {
    // Saturating cast; out-of-range ages are dropped later by bucket lookup.
    age.is_finite().then(|| age.trunc() as i64)
}

/// Gender codes may be stored as text or as numbers such as `1` and `2`.
fn text_from(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => None,
        ValueRef::Integer(code) => Some(code.to_string()),
        ValueRef::Real(code) => Some(code.to_string()),
        ValueRef::Text(raw) => Some(String::from_utf8_lossy(raw).into_owned()),
    }
}

fn count_from(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Pick the row matching the earliest candidate.
fn first_by_candidate<T>(
    rows: Vec<T>,
    candidates: &[String],
    keys: impl Fn(&T) -> Vec<&str>,
) -> Option<T> {
    rows.into_iter()
        .filter_map(|row| {
            let rank = candidates
                .iter()
                .position(|candidate| keys(&row).contains(&candidate.as_str()))?;
            Some((rank, row))
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, row)| row)
}

impl ReferenceStore for SqliteStore {
    fn province_by_id(&self, province_id: i64) -> Result<Option<CanonicalProvince>> {
        self.find_province("province_id", &province_id)
    }

    fn province_by_name(&self, name_th: &str) -> Result<Option<CanonicalProvince>> {
        self.find_province("name_th", &name_th)
    }

    fn region_by_id(&self, region_id: i64) -> Result<Option<CanonicalRegion>> {
        self.find_region("region_id", &region_id)
    }

    fn region_by_name(&self, name_th: &str) -> Result<Option<CanonicalRegion>> {
        self.find_region("name_th", &name_th)
    }

    fn regions(&self) -> Result<Vec<CanonicalRegion>> {
        let sql = format!(
            "SELECT region_id, name_th, display_order FROM {} ORDER BY display_order",
            self.layout.regions.quoted()
        );
        self.with_conn("list regions", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], region_from_row)?;
            rows.collect()
        })
    }
}

impl DiseaseStore for SqliteStore {
    fn disease_by_id(&self, disease_id: i64) -> Result<Option<CanonicalDisease>> {
        let sql = format!(
            "SELECT disease_id, code, name_th, name_en FROM {} WHERE disease_id = ?1",
            self.layout.diseases.quoted()
        );
        self.with_conn("disease by id", |conn| {
            conn.query_row(&sql, [disease_id], disease_from_row).optional()
        })
    }

    fn disease_by_codes(&self, candidates: &[String]) -> Result<Option<CanonicalDisease>> {
        if candidates.is_empty() {
            return Ok(None);
        }
        let predicate = format!("code IN ({})", placeholders(candidates.len()));
        let rows = self.diseases_where(&predicate, candidates)?;
        Ok(first_by_candidate(rows, candidates, |d| vec![d.code.as_str()]))
    }

    fn disease_by_names(&self, candidates: &[String]) -> Result<Option<CanonicalDisease>> {
        if candidates.is_empty() {
            return Ok(None);
        }
        let list = placeholders(candidates.len());
        let predicate = format!("name_th IN ({list}) OR name_en IN ({list})");
        let values: Vec<String> = candidates.iter().chain(candidates.iter()).cloned().collect();
        let rows = self.diseases_where(&predicate, &values)?;
        Ok(first_by_candidate(rows, candidates, |d| {
            let mut keys = vec![d.name_th.as_str()];
            if let Some(name_en) = &d.name_en {
                keys.push(name_en.as_str());
            }
            keys
        }))
    }

    fn active_mapping(&self, candidates: &[String]) -> Result<Option<FactTableMapping>> {
        if candidates.is_empty() {
            return Ok(None);
        }
        let sql = format!(
            "SELECT disease_code, schema_name, table_name, is_active FROM {} \
             WHERE is_active = 1 AND disease_code IN ({})",
            self.layout.fact_mappings.quoted(),
            placeholders(candidates.len())
        );
        let rows = self.with_conn("active mapping", |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(candidates.iter()), |row| {
                Ok(FactTableMapping {
                    disease_code: row.get(0)?,
                    schema_name: row.get(1)?,
                    table_name: row.get(2)?,
                    is_active: row.get(3)?,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;
        Ok(first_by_candidate(rows, candidates, |m| vec![m.disease_code.as_str()]))
    }
}

impl CaseStore for SqliteStore {
    fn age_counts(&self, table: &FactTable, filter: &CaseFilter<'_>) -> Result<Vec<AgeCountRow>> {
        let query = build_fact_query(&self.layout, table, filter, Grouping::Age);
        self.run_fact_query("age counts", &query, |row| {
            Ok(AgeCountRow {
                age_years: age_from(row.get_ref(0)?),
                count: count_from(row.get(1)?),
            })
        })
    }

    fn gender_counts(
        &self,
        table: &FactTable,
        filter: &CaseFilter<'_>,
    ) -> Result<Vec<GenderCountRow>> {
        let query = build_fact_query(&self.layout, table, filter, Grouping::Gender);
        self.run_fact_query("gender counts", &query, |row| {
            Ok(GenderCountRow {
                gender: text_from(row.get_ref(0)?),
                count: count_from(row.get(1)?),
            })
        })
    }

    fn monthly_counts(
        &self,
        table: &FactTable,
        filter: &CaseFilter<'_>,
    ) -> Result<Vec<MonthCountRow>> {
        let query = build_fact_query(&self.layout, table, filter, Grouping::Month);
        self.run_fact_query("monthly counts", &query, |row| {
            Ok(MonthCountRow {
                month: row.get(0)?,
                count: count_from(row.get(1)?),
            })
        })
    }

    fn count(&self, table: &FactTable, filter: &CaseFilter<'_>) -> Result<u64> {
        let query = build_fact_query(&self.layout, table, filter, Grouping::Total);
        let counts = self.run_fact_query("case count", &query, |row| row.get::<_, i64>(0))?;
        Ok(counts.into_iter().next().map_or(0, count_from))
    }
}

//! Statement text for fact-table aggregates.
//!
//! Only validated identifiers from [`StoreLayout`] and [`FactTable`] are
//! interpolated; every value travels as a bound parameter.

use rusqlite::types::{ToSql, ToSqlOutput};

use epi_model::{Area, FactTable, Measure};

use crate::layout::StoreLayout;
use crate::traits::CaseFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            SqlParam::Int(value) => value.to_sql(),
            SqlParam::Text(value) => value.to_sql(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Age,
    Gender,
    Month,
    Total,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

pub fn build_fact_query(
    layout: &StoreLayout,
    table: &FactTable,
    filter: &CaseFilter<'_>,
    grouping: Grouping,
) -> FactQuery {
    let columns = &layout.columns;
    let date_column = match filter.measure {
        Measure::Patients => columns.onset_date.quoted(),
        Measure::Deaths => columns.death_date.quoted(),
    };

    let mut clauses = vec![
        format!("{date_column} IS NOT NULL"),
        format!("date({date_column}) BETWEEN ? AND ?"),
    ];
    let mut params = vec![
        SqlParam::Text(filter.range.start.format("%Y-%m-%d").to_string()),
        SqlParam::Text(filter.range.end.format("%Y-%m-%d").to_string()),
    ];

    match filter.area {
        Area::Province(province) => {
            clauses.push(format!("{} = ?", columns.province_id.quoted()));
            params.push(SqlParam::Int(province.province_id));
        }
        Area::Region(region) => {
            clauses.push(format!(
                "{} IN (SELECT province_id FROM {} WHERE region_id = ?)",
                columns.province_id.quoted(),
                layout.provinces.quoted()
            ));
            params.push(SqlParam::Int(region.region_id));
        }
        Area::Nationwide => {}
    }

    if let (Some(code), Some(column)) = (filter.disease_code, &columns.disease_code) {
        clauses.push(format!("{} = ?", column.quoted()));
        params.push(SqlParam::Text(code.to_string()));
    }

    let from = table.qualified_name();
    let predicate = clauses.join(" AND ");
    let sql = match grouping {
        Grouping::Age => {
            let age = columns.age.quoted();
            format!("SELECT {age}, COUNT(*) FROM {from} WHERE {predicate} GROUP BY {age}")
        }
        Grouping::Gender => {
            let gender = columns.gender.quoted();
            format!(
                "SELECT {gender} AS gender, COUNT(*) FROM {from} WHERE {predicate} \
                 GROUP BY {gender}"
            )
        }
        Grouping::Month => format!(
            "SELECT strftime('%Y-%m', {date_column}) AS month, COUNT(*) FROM {from} \
             WHERE {predicate} GROUP BY month ORDER BY month"
        ),
        Grouping::Total => format!("SELECT COUNT(*) FROM {from} WHERE {predicate}"),
    };

    FactQuery { sql, params }
}

/// `?, ?, ?` for an `IN (...)` list of `count` values.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

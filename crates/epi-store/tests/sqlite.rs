#![allow(missing_docs)]

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use epi_model::{
    Area, CanonicalProvince, CanonicalRegion, CaseRecord, DateRange, FactTable, Measure, SqlIdent,
};
use epi_store::{
    CaseFilter, CaseStore, DiseaseStore, ReferenceStore, SqliteStore, StoreLayout, load_seed_dir,
};

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write seed file");
}

fn seeded_store() -> (SqliteStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    write(
        dir.path(),
        "regions.csv",
        "region_id,name_th,display_order\n2,ภาคเหนือ,2\n1,ภาคกลาง,1\n",
    );
    write(
        dir.path(),
        "provinces.csv",
        "province_id,name_th,region_id,region_name_moph\n\
         10,กรุงเทพมหานคร,1,เขตสุขภาพที่ 13\n\
         50,เชียงใหม่,2,เขตสุขภาพที่ 1\n\
         57,เชียงราย,2,\n",
    );
    write(
        dir.path(),
        "diseases.csv",
        "disease_id,code,name_th,name_en\n1,D01,ไข้เลือดออก,Dengue fever\n2,D02,ไข้หวัดใหญ่,Influenza\n",
    );
    write(
        dir.path(),
        "fact_tables.csv",
        "disease_code,schema_name,table_name,is_active\n\
         D01,main,old_dengue,0\n\
         D01,main,case_fact,1\n",
    );
    write(
        dir.path(),
        "case_fact.csv",
        "disease_code,province_id,gender,age_years,onset_date,death_date\n\
         D01,10,M,3,2024-01-05,\n\
         D01,10,ชาย,7,2024-01-20,2024-02-02\n\
         D01,10,F,,2024-03-01,\n\
         D01,50,f,30,2024-03-15,2025-01-03\n\
         D02,57,X,65,2024-02-11,2024-02-20\n\
         D01,10,M,40,2023-12-30,2024-01-02\n",
    );
    let store = SqliteStore::open_in_memory(StoreLayout::default()).expect("open store");
    let summary = load_seed_dir(&store, dir.path()).expect("load seeds");
    assert_eq!(summary.regions, 2);
    assert_eq!(summary.provinces, 3);
    assert_eq!(summary.diseases, 2);
    assert_eq!(summary.mappings, 2);
    assert_eq!(summary.cases.len(), 1);
    assert_eq!(summary.cases[0].1, 6);
    (store, dir)
}

fn year_2024() -> DateRange {
    DateRange::year(2024).expect("range")
}

fn bangkok() -> Area {
    Area::Province(CanonicalProvince {
        province_id: 10,
        name_th: "กรุงเทพมหานคร".to_string(),
        region_id: Some(1),
        region_name_moph: None,
    })
}

#[test]
fn province_lookups_are_exact() {
    let (store, _dir) = seeded_store();
    let by_id = store.province_by_id(50).unwrap().expect("province 50");
    assert_eq!(by_id.name_th, "เชียงใหม่");
    assert_eq!(by_id.region_id, Some(2));

    let by_name = store.province_by_name("เชียงราย").unwrap().expect("by name");
    assert_eq!(by_name.province_id, 57);
    assert_eq!(by_name.region_name_moph, None);

    assert!(store.province_by_name("เชียง").unwrap().is_none());
    assert!(store.province_by_id(99).unwrap().is_none());
}

#[test]
fn regions_follow_display_order() {
    let (store, _dir) = seeded_store();
    let names: Vec<String> = store
        .regions()
        .unwrap()
        .into_iter()
        .map(|r| r.name_th)
        .collect();
    assert_eq!(names, vec!["ภาคกลาง", "ภาคเหนือ"]);
    assert_eq!(store.region_by_name("ภาคเหนือ").unwrap().unwrap().region_id, 2);
}

#[test]
fn disease_lookups_prefer_earlier_candidates() {
    let (store, _dir) = seeded_store();
    let candidates = vec!["d02".to_string(), "D02".to_string(), "D01".to_string()];
    let disease = store.disease_by_codes(&candidates).unwrap().expect("match");
    assert_eq!(disease.code, "D02");

    let by_name = store
        .disease_by_names(&["Dengue fever".to_string()])
        .unwrap()
        .expect("english name");
    assert_eq!(by_name.code, "D01");
    assert!(store.disease_by_codes(&[]).unwrap().is_none());
}

#[test]
fn inactive_mappings_are_ignored() {
    let (store, _dir) = seeded_store();
    let mapping = store
        .active_mapping(&["D01".to_string()])
        .unwrap()
        .expect("active mapping");
    assert_eq!(mapping.table_name, "case_fact");
    assert!(mapping.is_active);
    assert!(store.active_mapping(&["D02".to_string()]).unwrap().is_none());
}

#[test]
fn age_and_gender_groups_for_a_province() {
    let (store, _dir) = seeded_store();
    let table = FactTable::new("main", "case_fact").unwrap();
    let area = bangkok();
    let filter = CaseFilter {
        measure: Measure::Patients,
        range: year_2024(),
        area: &area,
        disease_code: Some("D01"),
    };

    let mut ages = store.age_counts(&table, &filter).unwrap();
    ages.sort_by_key(|row| row.age_years);
    let ages: Vec<(Option<i64>, u64)> = ages.into_iter().map(|r| (r.age_years, r.count)).collect();
    assert_eq!(ages, vec![(None, 1), (Some(3), 1), (Some(7), 1)]);

    let genders = store.gender_counts(&table, &filter).unwrap();
    let total: u64 = genders.iter().map(|row| row.count).sum();
    assert_eq!(total, 3);
    assert_eq!(store.count(&table, &filter).unwrap(), 3);
}

#[test]
fn deaths_use_the_death_date_window() {
    let (store, _dir) = seeded_store();
    let table = FactTable::new("main", "case_fact").unwrap();
    let area = Area::Nationwide;
    let filter = CaseFilter {
        measure: Measure::Deaths,
        range: year_2024(),
        area: &area,
        disease_code: None,
    };
    // The 2023 onset dying on 2024-01-02 counts; the 2025 death does not.
    assert_eq!(store.count(&table, &filter).unwrap(), 3);
}

#[test]
fn region_scope_and_monthly_order() {
    let (store, _dir) = seeded_store();
    let table = FactTable::new("main", "case_fact").unwrap();
    let area = Area::Region(CanonicalRegion {
        region_id: 2,
        name_th: "ภาคเหนือ".to_string(),
        display_order: 2,
    });
    let filter = CaseFilter {
        measure: Measure::Patients,
        range: DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        )
        .unwrap(),
        area: &area,
        disease_code: None,
    };
    let months: Vec<(String, u64)> = store
        .monthly_counts(&table, &filter)
        .unwrap()
        .into_iter()
        .map(|row| (row.month, row.count))
        .collect();
    assert_eq!(
        months,
        vec![("2024-02".to_string(), 1), ("2024-03".to_string(), 1)]
    );
}

#[test]
fn attached_schema_is_queryable() {
    let dir = tempfile::tempdir().expect("temp dir");
    let archive_path = dir.path().join("archive.db");
    let archive = SqliteStore::open(&archive_path, StoreLayout::default()).expect("open archive");
    let local = FactTable::new("main", "misc_cases").unwrap();
    archive.create_fact_table(&local).unwrap();
    let case = CaseRecord {
        disease_code: Some("d03".to_string()),
        province_id: 10,
        gender: Some("F".to_string()),
        age_years: Some(12),
        onset_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        death_date: None,
    };
    assert_eq!(archive.insert_cases(&local, &[case]).unwrap(), 1);
    drop(archive);

    let store = SqliteStore::open_in_memory(StoreLayout::default()).expect("open store");
    store
        .attach(&archive_path, &SqlIdent::new("archive").unwrap())
        .unwrap();
    let table = FactTable::new("archive", "misc_cases").unwrap();
    let area = Area::Nationwide;
    let filter = CaseFilter {
        measure: Measure::Patients,
        range: year_2024(),
        area: &area,
        disease_code: Some("d03"),
    };
    assert_eq!(store.count(&table, &filter).unwrap(), 1);
}

fn loosely_typed_store() -> SqliteStore {
    let conn = rusqlite::Connection::open_in_memory().expect("open connection");
    conn.execute_batch(
        "CREATE TABLE case_fact (
            disease_code TEXT,
            province_id INTEGER NOT NULL,
            gender INTEGER,
            age_years TEXT,
            onset_date TEXT NOT NULL,
            death_date TEXT
        );
        INSERT INTO case_fact VALUES ('D01', 10, 1, 'unknown', '2024-01-05', NULL);
        INSERT INTO case_fact VALUES ('D01', 10, 2, ' 12 ', '2024-02-01', NULL);
        INSERT INTO case_fact VALUES ('D01', 10, 1, 'N/A', '2024-02-03', NULL);
        INSERT INTO case_fact VALUES ('D01', 10, NULL, '', '2024-03-01', NULL);
        INSERT INTO case_fact VALUES ('D01', 10, 1, '61.0', '2024-03-09', NULL);",
    )
    .expect("create loosely typed table");
    SqliteStore::from_connection(conn, StoreLayout::default())
}

fn all_of_2024(area: &Area) -> CaseFilter<'_> {
    CaseFilter {
        measure: Measure::Patients,
        range: year_2024(),
        area,
        disease_code: Some("D01"),
    }
}

#[test]
fn non_numeric_ages_are_missing_not_zero() {
    let store = loosely_typed_store();
    let table = FactTable::new("main", "case_fact").unwrap();
    let area = Area::Nationwide;
    let rows = store.age_counts(&table, &all_of_2024(&area)).unwrap();

    let missing: u64 = rows
        .iter()
        .filter(|row| row.age_years.is_none())
        .map(|row| row.count)
        .sum();
    assert_eq!(missing, 3);
    assert!(rows.iter().all(|row| row.age_years != Some(0)));
    let mut known: Vec<(i64, u64)> = rows
        .iter()
        .filter_map(|row| row.age_years.map(|age| (age, row.count)))
        .collect();
    known.sort_unstable();
    assert_eq!(known, vec![(12, 1), (61, 1)]);
}

#[test]
fn integer_gender_codes_are_read_as_text() {
    let store = loosely_typed_store();
    let table = FactTable::new("main", "case_fact").unwrap();
    let area = Area::Nationwide;
    let mut rows: Vec<(Option<String>, u64)> = store
        .gender_counts(&table, &all_of_2024(&area))
        .unwrap()
        .into_iter()
        .map(|row| (row.gender, row.count))
        .collect();
    rows.sort();
    assert_eq!(
        rows,
        vec![
            (None, 1),
            (Some("1".to_string()), 3),
            (Some("2".to_string()), 1)
        ]
    );
}

#[test]
fn death_trend_is_keyed_on_death_month() {
    let (store, _dir) = seeded_store();
    let table = FactTable::new("main", "case_fact").unwrap();
    let area = Area::Nationwide;
    let filter = CaseFilter {
        measure: Measure::Deaths,
        range: year_2024(),
        area: &area,
        disease_code: None,
    };
    let months: Vec<(String, u64)> = store
        .monthly_counts(&table, &filter)
        .unwrap()
        .into_iter()
        .map(|row| (row.month, row.count))
        .collect();
    // Onsets in 2023-12 and 2024-01 die in 2024-01 and 2024-02.
    assert_eq!(
        months,
        vec![("2024-01".to_string(), 1), ("2024-02".to_string(), 2)]
    );
}

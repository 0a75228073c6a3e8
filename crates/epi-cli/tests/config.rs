use std::fs;

use epi_cli::config::AppConfig;
use epi_model::FactTable;

#[test]
fn file_overrides_layout_and_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("epi.toml");
    fs::write(
        &path,
        r#"
database = "data/surveillance.db"

[cache]
capacity = 16
ttl_secs = 5

[layout]
default_fact_table = "all_cases"

[layout.columns]
age = "age_at_onset"

[locator]
allowed_tables = ["main.dengue_cases"]
"#,
    )
    .unwrap();

    let config = AppConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(
        config.database_path(None).unwrap(),
        dir.path().join("data/surveillance.db")
    );
    assert_eq!(config.cache.capacity, 16);
    assert_eq!(config.cache.ttl_secs, 5);
    assert_eq!(config.layout.default_fact_table().key(), "main.all_cases");
    assert_eq!(config.layout.columns.age.as_str(), "age_at_onset");
    assert_eq!(config.layout.columns.gender.as_str(), "gender");

    let allowed = FactTable::new("main", "dengue_cases").unwrap();
    let other = FactTable::new("main", "flu_cases").unwrap();
    assert!(config.locator.allows(&allowed));
    assert!(!config.locator.allows(&other));
}

#[test]
fn absolute_database_path_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("elsewhere.db");
    let path = dir.path().join("epi.toml");
    fs::write(&path, format!("database = {:?}\n", db.display().to_string())).unwrap();

    let config = AppConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(config.database, Some(db));
}

#[test]
fn unsafe_column_name_is_rejected() {
    let err = AppConfig::from_toml_str("[layout.columns]\nage = \"age; DROP TABLE x\"\n")
        .unwrap_err();
    assert!(format!("{err:#}").contains("parse configuration"));
}

#[test]
fn unknown_top_level_key_is_rejected() {
    assert!(AppConfig::from_toml_str("databse = \"typo.db\"\n").is_err());
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = AppConfig::load_or_default(Some(&path)).unwrap_err();
    assert!(format!("{err:#}").contains("absent.toml"));
}

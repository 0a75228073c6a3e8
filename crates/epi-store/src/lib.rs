//! Stores for reference data, fact-table mappings and case facts.
//!
//! The aggregation core only talks to the traits in [`traits`]; the SQLite
//! implementation is what the CLI and the integration tests run against.

pub mod layout;
pub mod load;
pub mod sql;
pub mod sqlite;
pub mod traits;

pub use layout::{FactColumns, StoreLayout};
pub use load::{LoadSummary, load_seed_dir, read_csv_rows};
pub use sqlite::SqliteStore;
pub use traits::{CaseFilter, CaseStore, DiseaseStore, ReferenceStore};

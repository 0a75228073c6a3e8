//! TOML configuration file.
//!
//! ```toml
//! database = "surveillance.db"
//!
//! [cache]
//! capacity = 256
//! ttl_secs = 60
//!
//! [layout]
//! provinces = "ref_province"
//! default_fact_table = "case_fact"
//!
//! [layout.columns]
//! age = "age_years"
//!
//! [locator]
//! allowed_tables = ["main.case_fact"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use epi_resolve::{CacheConfig, LocatorPolicy};
use epi_store::StoreLayout;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: Option<PathBuf>,
    pub cache: CacheConfig,
    pub layout: StoreLayout,
    pub locator: LocatorPolicy,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("parse configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("read configuration {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Defaults when no file is given. Relative database paths are taken
    /// relative to the configuration file.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let mut config = Self::load(path)?;
        if let (Some(database), Some(dir)) = (&config.database, path.parent())
            && database.is_relative()
        {
            config.database = Some(dir.join(database));
        }
        Ok(config)
    }

    /// The database to open: the command-line value wins over the file.
    pub fn database_path(&self, cli_override: Option<&Path>) -> Result<PathBuf> {
        match (cli_override, &self.database) {
            (Some(path), _) => Ok(path.to_path_buf()),
            (None, Some(path)) => Ok(path.clone()),
            (None, None) => bail!("no database configured; pass --database or set `database`"),
        }
    }
}

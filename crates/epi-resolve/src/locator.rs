//! Disease code to physical fact table.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use epi_model::{EpiError, FactTable, Result};
use epi_store::DiseaseStore;

use crate::cache::LookupCache;
use crate::candidates::disease_code_candidates;

/// Restrictions on which tables a mapping may point at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorPolicy {
    /// `schema.table` keys. `None` accepts any table with safe identifiers.
    pub allowed_tables: Option<BTreeSet<String>>,
}

impl LocatorPolicy {
    pub fn allows(&self, table: &FactTable) -> bool {
        self.allowed_tables
            .as_ref()
            .is_none_or(|allowed| allowed.contains(&table.key()))
    }
}

pub struct FactTableLocator<'a> {
    diseases: &'a dyn DiseaseStore,
    default_table: FactTable,
    policy: LocatorPolicy,
    cache: Option<&'a LookupCache>,
}

impl<'a> FactTableLocator<'a> {
    pub fn new(diseases: &'a dyn DiseaseStore, default_table: FactTable) -> Self {
        Self {
            diseases,
            default_table,
            policy: LocatorPolicy::default(),
            cache: None,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: LocatorPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: &'a LookupCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn default_table(&self) -> &FactTable {
        &self.default_table
    }

    /// The active table holding records for `disease_code`.
    ///
    /// Accepts any surface form of the code. Fails with `NotFound` when no
    /// active mapping exists, and with `InvalidIdentifier` when the mapping
    /// names a schema or table that is unsafe to splice into SQL.
    pub fn resolve_fact_table(&self, disease_code: &str) -> Result<FactTable> {
        let code = disease_code.trim();
        if let Some(hit) = self.cache.and_then(|c| c.fact_tables.get(&code.to_string())) {
            return Ok(hit);
        }

        let candidates = disease_code_candidates(code);
        let mapping = self
            .diseases
            .active_mapping(&candidates)?
            .ok_or_else(|| EpiError::not_found("active fact table mapping", code))?;

        let table = FactTable::new(&mapping.schema_name, &mapping.table_name).inspect_err(|_| {
            warn!(
                disease_code = %mapping.disease_code,
                schema = %mapping.schema_name,
                table = %mapping.table_name,
                "fact table mapping rejected: unsafe identifier"
            );
        })?;
        if !self.policy.allows(&table) {
            warn!(disease_code = code, table = %table, "fact table outside allow-list");
            return Err(EpiError::TableNotAllowed {
                table: table.key(),
            });
        }

        debug!(disease_code = code, table = %table, "fact table located");
        if let Some(cache) = self.cache {
            cache.fact_tables.insert(code.to_string(), table.clone());
        }
        Ok(table)
    }

    /// Table for an optional disease filter; no filter means the default table.
    pub fn locate(&self, disease_code: Option<&str>) -> Result<FactTable> {
        match disease_code {
            Some(code) if !code.trim().is_empty() => self.resolve_fact_table(code),
            _ => Ok(self.default_table.clone()),
        }
    }
}

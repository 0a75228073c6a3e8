//! Identifier resolution: provinces, regions and disease codes.
//!
//! Resolution never fails for "not found". Provinces and regions come back
//! as `None`; disease codes fall back to the trimmed input so callers holding
//! a code the reference table does not know yet can still query.

use tracing::{debug, warn};

use epi_model::{Area, CanonicalProvince, CanonicalRegion, Result};
use epi_store::{DiseaseStore, ReferenceStore};

use crate::cache::LookupCache;
use crate::candidates::disease_code_candidates;

/// How a request identified its disease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiseaseParam {
    /// Surrogate key; skips code and name matching entirely.
    Id(i64),
    /// Code or name in any accepted surface form.
    Code(String),
}

pub struct Resolver<'a> {
    reference: &'a dyn ReferenceStore,
    diseases: &'a dyn DiseaseStore,
    cache: Option<&'a LookupCache>,
}

impl<'a> Resolver<'a> {
    pub fn new(reference: &'a dyn ReferenceStore, diseases: &'a dyn DiseaseStore) -> Self {
        Self {
            reference,
            diseases,
            cache: None,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: &'a LookupCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Digits are a province id; anything else must equal a Thai name.
    pub fn resolve_province(&self, input: &str) -> Result<Option<CanonicalProvince>> {
        let key = input.trim();
        if key.is_empty() {
            return Ok(None);
        }
        if let Some(hit) = self.cache.and_then(|c| c.provinces.get(&key.to_string())) {
            return Ok(Some(hit));
        }
        let found = match numeric_id(key) {
            Some(id) => self.reference.province_by_id(id)?,
            None if is_all_digits(key) => None,
            None => self.reference.province_by_name(key)?,
        };
        debug!(input = key, found = found.is_some(), "province resolution");
        if let (Some(cache), Some(province)) = (self.cache, &found) {
            cache.provinces.insert(key.to_string(), province.clone());
        }
        Ok(found)
    }

    pub fn resolve_region(&self, input: &str) -> Result<Option<CanonicalRegion>> {
        let key = input.trim();
        if key.is_empty() {
            return Ok(None);
        }
        if let Some(hit) = self.cache.and_then(|c| c.regions.get(&key.to_string())) {
            return Ok(Some(hit));
        }
        let found = match numeric_id(key) {
            Some(id) => self.reference.region_by_id(id)?,
            None if is_all_digits(key) => None,
            None => self.reference.region_by_name(key)?,
        };
        debug!(input = key, found = found.is_some(), "region resolution");
        if let (Some(cache), Some(region)) = (self.cache, &found) {
            cache.regions.insert(key.to_string(), region.clone());
        }
        Ok(found)
    }

    /// Canonical code for `input`, or the trimmed input when nothing matches.
    ///
    /// Returns `None` only for blank input.
    pub fn resolve_disease_code(&self, input: &str) -> Result<Option<String>> {
        let raw = input.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        if let Some(hit) = self.cache.and_then(|c| c.disease_codes.get(&raw.to_string())) {
            return Ok(Some(hit));
        }

        let candidates = disease_code_candidates(raw);
        let matched = match self.diseases.disease_by_codes(&candidates)? {
            Some(disease) => Some(disease.code),
            None => self.diseases.disease_by_names(&candidates)?.map(|d| d.code),
        };

        match matched {
            Some(code) => {
                debug!(input = raw, code = %code, "disease code resolved");
                if let Some(cache) = self.cache {
                    cache.disease_codes.insert(raw.to_string(), code.clone());
                }
                Ok(Some(code))
            }
            None => {
                debug!(input = raw, "disease code not in reference table; using input as-is");
                Ok(Some(raw.to_string()))
            }
        }
    }

    /// Resolve a disease parameter. An id short-circuits code resolution; an
    /// unknown id means no disease filter.
    pub fn resolve_disease(&self, param: &DiseaseParam) -> Result<Option<String>> {
        match param {
            DiseaseParam::Id(id) => {
                let disease = self.diseases.disease_by_id(*id)?;
                if disease.is_none() {
                    warn!(disease_id = id, "unknown disease id; no disease filter applied");
                }
                Ok(disease.map(|d| d.code))
            }
            DiseaseParam::Code(raw) => self.resolve_disease_code(raw),
        }
    }

    /// Geographic scope for a request.
    ///
    /// A supplied province wins over a supplied region; neither means
    /// nationwide. `None` means an identifier was supplied but did not
    /// resolve, which callers turn into zero-valued results.
    pub fn resolve_area(
        &self,
        province: Option<&str>,
        region: Option<&str>,
    ) -> Result<Option<Area>> {
        if let Some(province) = province.filter(|p| !p.trim().is_empty()) {
            return Ok(self.resolve_province(province)?.map(Area::Province));
        }
        if let Some(region) = region.filter(|r| !r.trim().is_empty()) {
            return Ok(self.resolve_region(region)?.map(Area::Region));
        }
        Ok(Some(Area::Nationwide))
    }
}

fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
}

/// All-digit input as an id. Too-large numbers are all digits but no id.
fn numeric_id(value: &str) -> Option<i64> {
    if is_all_digits(value) {
        value.parse().ok()
    } else {
        None
    }
}

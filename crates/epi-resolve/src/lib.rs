//! Resolution of raw request identifiers into canonical keys and tables.

pub mod cache;
pub mod candidates;
pub mod locator;
pub mod resolver;

pub use cache::{CacheConfig, LookupCache, TtlCache};
pub use candidates::disease_code_candidates;
pub use locator::{FactTableLocator, LocatorPolicy};
pub use resolver::{DiseaseParam, Resolver};

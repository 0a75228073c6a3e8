use anyhow::{Context, Result, anyhow};
use chrono::Local;
use serde::Serialize;
use tracing::{error, info, info_span};

use epi_cli::config::AppConfig;
use epi_model::{Area, CanonicalRegion, EpiError, ErrorKind, FactTable};
use epi_report::{Aggregator, ComparisonReport, QueryParams, Reporter};
use epi_resolve::{DiseaseParam, FactTableLocator, LookupCache, Resolver};
use epi_store::{LoadSummary, ReferenceStore, SqliteStore, load_seed_dir};

use crate::cli::{CompareArgs, LoadArgs, LocateArgs, MeasureArg, ResolveArgs};

/// Everything a command needs: the opened store plus per-run cache.
pub struct AppContext {
    pub config: AppConfig,
    pub store: SqliteStore,
    pub cache: LookupCache,
}

impl AppContext {
    pub fn new(config: AppConfig, store: SqliteStore) -> Self {
        let cache = LookupCache::new(&config.cache);
        Self {
            config,
            store,
            cache,
        }
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.store, &self.store).with_cache(&self.cache)
    }

    fn locator(&self) -> FactTableLocator<'_> {
        FactTableLocator::new(&self.store, self.store.layout().default_fact_table())
            .with_policy(self.config.locator.clone())
            .with_cache(&self.cache)
    }
}

/// Resolution of every identifier given to `resolve`.
#[derive(Debug, Serialize)]
pub struct ResolveOutput {
    pub area: Option<Area>,
    pub disease_code: Option<String>,
}

pub fn run_load(ctx: &AppContext, args: &LoadArgs) -> Result<LoadSummary> {
    let span = info_span!("load", dir = %args.seed_dir.display());
    let _guard = span.enter();
    let summary = load_seed_dir(&ctx.store, &args.seed_dir)
        .map_err(public_error)
        .with_context(|| format!("load {}", args.seed_dir.display()))?;
    info!(
        regions = summary.regions,
        provinces = summary.provinces,
        diseases = summary.diseases,
        fact_tables = summary.cases.len(),
        "seed data loaded"
    );
    Ok(summary)
}

pub fn run_regions(ctx: &AppContext) -> Result<Vec<CanonicalRegion>> {
    ctx.store.regions().map_err(public_error)
}

pub fn run_resolve(ctx: &AppContext, args: &ResolveArgs) -> Result<ResolveOutput> {
    let resolver = ctx.resolver();
    let area = resolver
        .resolve_area(args.province.as_deref(), args.region.as_deref())
        .map_err(public_error)?;
    let disease = match (args.disease_id, &args.disease) {
        (Some(id), _) => Some(DiseaseParam::Id(id)),
        (None, Some(code)) => Some(DiseaseParam::Code(code.clone())),
        (None, None) => None,
    };
    let disease_code = match disease {
        Some(param) => resolver.resolve_disease(&param).map_err(public_error)?,
        None => None,
    };
    Ok(ResolveOutput { area, disease_code })
}

pub fn run_locate(ctx: &AppContext, args: &LocateArgs) -> Result<FactTable> {
    let code = ctx
        .resolver()
        .resolve_disease_code(&args.disease)
        .map_err(public_error)?
        .ok_or_else(|| anyhow!("disease identifier is blank"))?;
    ctx.locator().resolve_fact_table(&code).map_err(public_error)
}

pub fn run_compare(ctx: &AppContext, args: &CompareArgs) -> Result<ComparisonReport> {
    let params = QueryParams::from_pairs(compare_pairs(args)?).map_err(public_error)?;
    let reporter = Reporter::new(
        ctx.resolver(),
        ctx.locator(),
        Aggregator::new(&ctx.store),
    );
    reporter
        .compare(&params, Local::now().date_naive())
        .map_err(public_error)
}

/// Named flags first, then raw `--param` pairs.
fn compare_pairs(args: &CompareArgs) -> Result<Vec<(String, String)>> {
    let named = [
        ("province", &args.province),
        ("compareProvince", &args.compare_province),
        ("region", &args.region),
        ("compareRegion", &args.compare_region),
        ("disease_id", &args.disease_id),
        ("disease", &args.disease),
        ("start_date", &args.start_date),
        ("end_date", &args.end_date),
    ];
    let mut pairs: Vec<(String, String)> = named
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|value| (key.to_string(), value)))
        .collect();
    if let Some(measure) = args.measure {
        let measure = match measure {
            MeasureArg::Patients => "patients",
            MeasureArg::Deaths => "deaths",
        };
        pairs.push(("measure".to_string(), measure.to_string()));
    }
    for raw in &args.params {
        let (key, value) = raw
            .split_once('=')
            .with_context(|| format!("--param expects KEY=VALUE, got '{raw}'"))?;
        pairs.push((key.to_string(), value.to_string()));
    }
    Ok(pairs)
}

/// Convert at the command boundary. Internal detail goes to the log only.
fn public_error(err: EpiError) -> anyhow::Error {
    if err.kind() == ErrorKind::Internal {
        error!(error = %err, "request failed");
    }
    anyhow!(err.public_message())
}

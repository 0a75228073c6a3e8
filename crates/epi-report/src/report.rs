//! Main-versus-compare reports.

use std::thread;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{Span, debug, error, info_span};

use epi_model::{
    AgeBucket, CategoryValue, DateRange, EpiError, ErrorKind, Gender, GenderBreakdown, Measure,
    MergedSeriesRow, Result, Totals,
};
use epi_resolve::{FactTableLocator, Resolver};

use crate::aggregate::{Aggregator, Selection};
use crate::merge::merge_series;
use crate::params::QueryParams;

/// Headline figures for one side of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SideSummary {
    pub label: String,
    /// False when the requested province or region did not resolve.
    pub resolved: bool,
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub range: DateRange,
    pub measure: Measure,
    pub disease_code: Option<String>,
    pub table: String,
    pub main: SideSummary,
    pub compare: SideSummary,
    pub age: Vec<MergedSeriesRow>,
    pub gender: Vec<MergedSeriesRow>,
    pub trend: Vec<MergedSeriesRow>,
}

struct SideData {
    age: Vec<CategoryValue>,
    gender: GenderBreakdown,
    trend: Vec<CategoryValue>,
    totals: Totals,
}

/// Resolves a request, then aggregates both selections concurrently.
pub struct Reporter<'a> {
    resolver: Resolver<'a>,
    locator: FactTableLocator<'a>,
    aggregator: Aggregator<'a>,
}

impl<'a> Reporter<'a> {
    pub fn new(
        resolver: Resolver<'a>,
        locator: FactTableLocator<'a>,
        aggregator: Aggregator<'a>,
    ) -> Self {
        Self {
            resolver,
            locator,
            aggregator,
        }
    }

    /// Build a comparison for `params`. `today` anchors the default window.
    ///
    /// Both sides share the disease filter and date range. Fails only for an
    /// unparseable argument, a missing fact-table mapping, or a store error.
    pub fn compare(&self, params: &QueryParams, today: NaiveDate) -> Result<ComparisonReport> {
        self.build(params, today).inspect_err(|err| {
            if err.kind() == ErrorKind::Internal {
                error!(error = %err, "comparison failed");
            }
        })
    }

    fn build(&self, params: &QueryParams, today: NaiveDate) -> Result<ComparisonReport> {
        let range = params.date_range(today)?;
        let disease_code = match &params.disease {
            Some(param) => self.resolver.resolve_disease(param)?,
            None => None,
        };
        let table = self.locator.locate(disease_code.as_deref())?;

        let main = Selection {
            area: self
                .resolver
                .resolve_area(params.province.as_deref(), params.region.as_deref())?,
            disease_code: disease_code.clone(),
            table: table.clone(),
        };
        let compare = Selection {
            area: self.resolver.resolve_area(
                params.compare_province.as_deref(),
                params.compare_region.as_deref(),
            )?,
            disease_code: disease_code.clone(),
            table: table.clone(),
        };

        let span = info_span!(
            "compare",
            table = %table,
            disease = disease_code.as_deref().unwrap_or("*"),
            measure = %params.measure,
            main = %main.label(),
            compare = %compare.label(),
        );
        let _entered = span.enter();

        let (main_data, compare_data) =
            collect_both(self.aggregator, &main, &compare, range, params.measure)?;
        debug!(
            main_total = main_data.gender.total(),
            compare_total = compare_data.gender.total(),
            "comparison aggregated"
        );

        Ok(ComparisonReport {
            range,
            measure: params.measure,
            disease_code,
            table: table.key(),
            age: merge_series(&main_data.age, &compare_data.age, &AgeBucket::labels()),
            gender: merge_series(
                &main_data.gender.to_series(),
                &compare_data.gender.to_series(),
                &Gender::labels(),
            ),
            trend: merge_series(&main_data.trend, &compare_data.trend, &range.months()),
            main: summary(&main, main_data.totals),
            compare: summary(&compare, compare_data.totals),
        })
    }
}

fn summary(selection: &Selection, totals: Totals) -> SideSummary {
    SideSummary {
        label: selection.label(),
        resolved: selection.area.is_some(),
        totals,
    }
}

/// Run both sides at once; either failure fails the pair.
fn collect_both(
    aggregator: Aggregator<'_>,
    main: &Selection,
    compare: &Selection,
    range: DateRange,
    measure: Measure,
) -> Result<(SideData, SideData)> {
    thread::scope(|scope| {
        let span = Span::current();
        let main_worker = scope.spawn(move || {
            let _entered = span.enter();
            collect_side(aggregator, main, range, measure)
        });
        let compare_data = collect_side(aggregator, compare, range, measure);
        let main_data = main_worker
            .join()
            .map_err(|_| EpiError::Internal("main selection worker panicked".to_string()))?;
        Ok((main_data?, compare_data?))
    })
}

fn collect_side(
    aggregator: Aggregator<'_>,
    selection: &Selection,
    range: DateRange,
    measure: Measure,
) -> Result<SideData> {
    Ok(SideData {
        age: aggregator.age_breakdown(selection, range, measure)?,
        gender: aggregator.gender_breakdown(selection, range, measure)?,
        trend: aggregator.monthly_trend(selection, range, measure)?,
        totals: aggregator.totals(selection, range)?,
    })
}

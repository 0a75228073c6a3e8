//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "epi",
    version,
    about = "Disease surveillance statistics - resolve, locate and compare case counts",
    long_about = "Resolve province, region and disease identifiers, locate the fact table \
                  holding a disease's cases, and compare age, gender and monthly breakdowns \
                  between two areas."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database (overrides `database` in the config file).
    #[arg(long = "database", value_name = "PATH", global = true)]
    pub database: Option<PathBuf>,

    /// Print results as JSON instead of tables.
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import reference data and case records from a directory of CSV files.
    Load(LoadArgs),

    /// List regions in display order.
    Regions,

    /// Show how province, region and disease identifiers resolve.
    Resolve(ResolveArgs),

    /// Show the fact table holding a disease's cases.
    Locate(LocateArgs),

    /// Compare breakdowns for two areas.
    Compare(CompareArgs),
}

#[derive(Args)]
pub struct LoadArgs {
    /// Directory with regions.csv, provinces.csv, diseases.csv,
    /// fact_tables.csv and one CSV per fact table.
    #[arg(value_name = "SEED_DIR")]
    pub seed_dir: PathBuf,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Province id or exact Thai name.
    #[arg(long = "province")]
    pub province: Option<String>,

    /// Region id or exact Thai name.
    #[arg(long = "region")]
    pub region: Option<String>,

    /// Disease code, number or name.
    #[arg(long = "disease")]
    pub disease: Option<String>,

    /// Disease surrogate id; takes precedence over --disease.
    #[arg(long = "disease-id")]
    pub disease_id: Option<i64>,
}

#[derive(Args)]
pub struct LocateArgs {
    /// Disease code, number or name.
    #[arg(value_name = "DISEASE")]
    pub disease: String,
}

#[derive(Args)]
pub struct CompareArgs {
    #[arg(long = "province")]
    pub province: Option<String>,

    #[arg(long = "compare-province")]
    pub compare_province: Option<String>,

    #[arg(long = "region")]
    pub region: Option<String>,

    #[arg(long = "compare-region")]
    pub compare_region: Option<String>,

    #[arg(long = "disease")]
    pub disease: Option<String>,

    #[arg(long = "disease-id")]
    pub disease_id: Option<String>,

    /// Inclusive start date (default: January 1 of the end date's year).
    #[arg(long = "start-date", value_name = "DATE")]
    pub start_date: Option<String>,

    /// Inclusive end date (default: December 31 of the start date's year).
    #[arg(long = "end-date", value_name = "DATE")]
    pub end_date: Option<String>,

    /// Count patients by onset date or deaths by death date (default: patients).
    #[arg(long = "measure", value_enum)]
    pub measure: Option<MeasureArg>,

    /// Raw request parameter, e.g. `--param mainProvince=10`. Repeatable;
    /// the named flags above take precedence.
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum MeasureArg {
    Patients,
    Deaths,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

//! Disease surveillance statistics CLI.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use serde::Serialize;
use tracing::level_filters::LevelFilter;

use epi_cli::config::AppConfig;
use epi_cli::logging::{LogConfig, LogFormat, init_logging};
use epi_store::SqliteStore;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{
    AppContext, run_compare, run_load, run_locate, run_regions, run_resolve,
};
use crate::summary::{
    print_comparison, print_load_summary, print_pairs, print_regions,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<()> {
    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    let database = config.database_path(cli.database.as_deref())?;
    let store = SqliteStore::open(&database, config.layout.clone())
        .map_err(|e| anyhow::anyhow!(e.public_message()))
        .with_context(|| format!("open database {}", database.display()))?;
    let ctx = AppContext::new(config, store);

    match &cli.command {
        Command::Load(args) => {
            let summary = run_load(&ctx, args)?;
            if cli.json {
                let cases: Vec<_> = summary
                    .cases
                    .iter()
                    .map(|(table, rows)| {
                        serde_json::json!({ "table": table.key(), "rows": rows })
                    })
                    .collect();
                print_json(&serde_json::json!({
                    "regions": summary.regions,
                    "provinces": summary.provinces,
                    "diseases": summary.diseases,
                    "mappings": summary.mappings,
                    "cases": cases,
                }))?;
            } else {
                print_load_summary(&summary);
            }
        }
        Command::Regions => {
            let regions = run_regions(&ctx)?;
            if cli.json {
                print_json(&regions)?;
            } else {
                print_regions(&regions);
            }
        }
        Command::Resolve(args) => {
            let output = run_resolve(&ctx, args)?;
            if cli.json {
                print_json(&output)?;
            } else {
                print_pairs(&[
                    ("Area", output.area.as_ref().map(epi_model::Area::label)),
                    ("Disease", output.disease_code.clone()),
                ]);
            }
        }
        Command::Locate(args) => {
            let table = run_locate(&ctx, args)?;
            if cli.json {
                print_json(&table)?;
            } else {
                print_pairs(&[
                    ("Schema", Some(table.schema.to_string())),
                    ("Table", Some(table.table.to_string())),
                    ("Qualified", Some(table.qualified_name())),
                ]);
            }
        }
        Command::Compare(args) => {
            let report = run_compare(&ctx, args)?;
            if cli.json {
                print_json(&report)?;
            } else {
                print_comparison(&report);
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{text}");
    Ok(())
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}

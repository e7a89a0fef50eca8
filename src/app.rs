//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - resolves the run configuration
//! - runs the indicator pipeline or opens the dashboard

use std::path::Path;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::cli::{CompaniesArgs, Command, DashArgs, RunArgs};
use crate::config::{ConfigFile, PipelineConfig};
use crate::domain::StatementKind;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `cvm` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` must be loaded before clap reads `env = ...` defaults.
    let _ = dotenvy::dotenv();

    // We want `cvm` and `cvm -f out.csv` to behave like `cvm dash ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Companies(args) => handle_companies(args),
        Command::Dash(args) => handle_dash(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    crate::logging::init();

    let config = pipeline_config_from_args(&args)?;
    info!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        start = %config.price_start,
        end = %config.price_end,
        "starting indicator run"
    );

    let run = pipeline::run_pipeline(&config)?;
    println!("{}", crate::report::format_run_summary(&run.outcomes));
    println!("Manifest: {}", run.manifest.display());
    Ok(())
}

fn handle_companies(args: CompaniesArgs) -> Result<(), AppError> {
    crate::logging::init();

    let file = load_config_file(args.source.config.as_deref())?;
    let income = crate::io::load_statements(&args.source.input_dir, StatementKind::Income, &file.schema)?;
    let income = crate::io::filter_latest(income);

    let companies = crate::calc::enumerate_companies(&income);
    if companies.is_empty() {
        return Err(AppError::new(3, "No companies found in the filtered income statement."));
    }

    let tickers = pipeline::ticker_resolver(args.source.ticker_map.as_deref())?;
    let listed: Vec<_> = companies
        .into_iter()
        .map(|company| {
            let ticker = tickers.resolve(&company);
            (company, ticker)
        })
        .collect();

    println!("{}", crate::report::format_companies(&listed));
    Ok(())
}

fn handle_dash(args: DashArgs) -> Result<(), AppError> {
    let path = match &args.file {
        Some(path) => crate::cli::picker::validate_csv_path(path)?,
        None => crate::cli::picker::prompt_for_csv_path(&args.dir)?,
    };
    crate::tui::run(&path)
}

/// Resolve CLI flags + optional JSON overrides into a `PipelineConfig`.
pub fn pipeline_config_from_args(args: &RunArgs) -> Result<PipelineConfig, AppError> {
    let file = load_config_file(args.source.config.as_deref())?;

    let price_end = args.end.unwrap_or_else(|| chrono::Local::now().date_naive());
    if args.start > price_end {
        return Err(AppError::new(
            2,
            format!("--start ({}) is after --end ({price_end}).", args.start),
        ));
    }
    if args.timeout_secs == 0 {
        return Err(AppError::new(2, "--timeout-secs must be at least 1."));
    }

    Ok(PipelineConfig {
        input_dir: args.source.input_dir.clone(),
        output_dir: args.output_dir.clone(),
        schema: file.schema,
        codes: file.line_items,
        ticker_map: args.source.ticker_map.clone(),
        prices_dir: args.prices_dir.clone(),
        price_start: args.start,
        price_end,
        timeout: Duration::from_secs(args.timeout_secs),
        duplicates: args.duplicates,
        completeness: args.completeness,
        companies: args.companies.clone(),
    })
}

fn load_config_file(path: Option<&Path>) -> Result<ConfigFile, AppError> {
    let file = match path {
        Some(path) => crate::config::read_config_file(path)?,
        None => ConfigFile::default(),
    };
    file.schema.delimiter_byte()?;
    Ok(file)
}

/// Rewrite argv so `cvm` defaults to `cvm dash`.
///
/// Rules:
/// - `cvm`                      -> `cvm dash`
/// - `cvm -f out.csv ...`       -> `cvm dash -f out.csv ...`
/// - `cvm --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("dash".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "dash" | "companies");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "dash".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_dashboard() {
        assert_eq!(rewrite_args(argv(&["cvm"])), argv(&["cvm", "dash"]));
        assert_eq!(
            rewrite_args(argv(&["cvm", "-f", "out.csv"])),
            argv(&["cvm", "dash", "-f", "out.csv"])
        );
        assert_eq!(rewrite_args(argv(&["cvm", "--help"])), argv(&["cvm", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["cvm", "run", "--input-dir", "d"])),
            argv(&["cvm", "run", "--input-dir", "d"])
        );
    }

    #[test]
    fn start_after_end_is_rejected() {
        let cli = crate::cli::Cli::try_parse_from([
            "cvm",
            "run",
            "--input-dir",
            "data",
            "--start",
            "2023-01-01",
            "--end",
            "2022-12-31",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let err = pipeline_config_from_args(&args).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn config_resolves_window_and_timeout() {
        let cli = crate::cli::Cli::try_parse_from([
            "cvm",
            "run",
            "--input-dir",
            "data",
            "--output-dir",
            "out",
            "--end",
            "2022-12-31",
            "--timeout-secs",
            "5",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = pipeline_config_from_args(&args).unwrap();
        assert_eq!(config.price_end, NaiveDate::from_ymd_opt(2022, 12, 31).unwrap());
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.schema.delimiter, ';');
        assert!(config.companies.is_empty());
    }
}

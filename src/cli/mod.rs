//! Command-line parsing for the CVM indicator tools.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pipeline and dashboard code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::domain::{CompletenessPolicy, DuplicatePolicy};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "cvm", version, about = "CVM fundamentals → per-company indicator tables + terminal dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute indicator tables for every company and write one CSV each.
    Run(RunArgs),
    /// List the companies found in the income statement and their tickers.
    Companies(CompaniesArgs),
    /// Open an indicator table in the interactive dashboard.
    Dash(DashArgs),
}

/// Where the statements live and how to read them.
#[derive(Debug, Parser, Clone)]
pub struct SourceArgs {
    /// Directory holding the statement CSV files (all filing years).
    #[arg(long, env = "CVM_INPUT_DIR", value_name = "DIR")]
    pub input_dir: PathBuf,

    /// JSON file overriding column names, file tokens, delimiter, and line-item codes.
    #[arg(long, env = "CVM_CONFIG", value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// CSV mapping `cd_cvm,ticker`; replaces the prefix ticker heuristic.
    #[arg(long, value_name = "CSV")]
    pub ticker_map: Option<PathBuf>,
}

/// Options for `cvm run`.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Directory receiving one CSV per company plus the run manifest.
    #[arg(long, env = "CVM_OUTPUT_DIR", default_value = "output", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Read prices from `<DIR>/<ticker>.csv` instead of Yahoo Finance.
    #[arg(long, value_name = "DIR")]
    pub prices_dir: Option<PathBuf>,

    /// First day of the price window.
    #[arg(long, default_value = "2010-01-01", value_name = "YYYY-MM-DD")]
    pub start: NaiveDate,

    /// Last day of the price window (default: today).
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end: Option<NaiveDate>,

    /// Timeout for each price request, in seconds.
    #[arg(long, default_value_t = 20)]
    pub timeout_secs: u64,

    /// Policy for several rows with the same line-item code and date.
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::Last)]
    pub duplicates: DuplicatePolicy,

    /// Which fiscal years are kept in the output.
    #[arg(long, value_enum, default_value_t = CompletenessPolicy::DropIncomplete)]
    pub completeness: CompletenessPolicy,

    /// Only process these company ids (repeatable).
    #[arg(long = "company", value_name = "CD_CVM")]
    pub companies: Vec<u32>,
}

/// Options for `cvm companies`.
#[derive(Debug, Parser, Clone)]
pub struct CompaniesArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

/// Options for `cvm dash`.
#[derive(Debug, Parser, Clone)]
pub struct DashArgs {
    /// Indicator CSV to open (skips the picker).
    #[arg(short = 'f', long, value_name = "CSV")]
    pub file: Option<PathBuf>,

    /// Directory searched by the picker.
    #[arg(long, env = "CVM_OUTPUT_DIR", default_value = "output", value_name = "DIR")]
    pub dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_args_parse_with_defaults() {
        let cli = Cli::try_parse_from(["cvm", "run", "--input-dir", "data", "--company", "9512", "--company", "4170"])
            .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.source.input_dir, PathBuf::from("data"));
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());
        assert_eq!(args.duplicates, DuplicatePolicy::Last);
        assert_eq!(args.completeness, CompletenessPolicy::DropIncomplete);
        assert_eq!(args.companies, vec![9512, 4170]);
    }

    #[test]
    fn policies_parse_from_flags() {
        let cli = Cli::try_parse_from([
            "cvm",
            "run",
            "--input-dir",
            "data",
            "--duplicates",
            "reject",
            "--completeness",
            "keep-partial",
            "--end",
            "2022-12-31",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.duplicates, DuplicatePolicy::Reject);
        assert_eq!(args.completeness, CompletenessPolicy::KeepPartial);
        assert_eq!(args.end, NaiveDate::from_ymd_opt(2022, 12, 31));
    }
}

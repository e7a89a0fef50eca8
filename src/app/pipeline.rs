//! The indicator pipeline shared by `cvm run` and the integration tests.
//!
//! Per company: slice statements -> extract line items -> fetch + resample
//! prices -> outer join -> derive -> completeness filter -> write CSV.
//! Companies are processed sequentially and independently; a failure is
//! recorded in the manifest and the loop moves on.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::calc::{self, CompanyIndex, extract::CompanyStatements};
use crate::config::PipelineConfig;
use crate::data::{CsvPriceDir, MappedTicker, PrefixTicker, PriceProvider, TickerResolver, YahooClient};
use crate::domain::{Company, CompanyOutcome, IndicatorTable, OutcomeStatus};
use crate::error::{AppError, CompanyError};
use crate::io::{self, Statements};

/// All outputs of a single `cvm run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub outcomes: Vec<CompanyOutcome>,
    pub manifest: PathBuf,
}

/// Run the pipeline with the providers selected by `config`.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let tickers = ticker_resolver(config.ticker_map.as_deref())?;
    let prices: Box<dyn PriceProvider> = match &config.prices_dir {
        Some(dir) => Box::new(CsvPriceDir::new(dir)),
        None => Box::new(YahooClient::new(config.timeout)?),
    };
    run_pipeline_with(config, prices.as_ref(), tickers.as_ref())
}

/// Ticker strategy: explicit map if given, else the prefix heuristic.
pub fn ticker_resolver(ticker_map: Option<&Path>) -> Result<Box<dyn TickerResolver>, AppError> {
    Ok(match ticker_map {
        Some(path) => Box::new(MappedTicker::from_csv(path)?),
        None => Box::new(PrefixTicker::default()),
    })
}

/// Run the pipeline with explicit price and ticker providers.
pub fn run_pipeline_with(
    config: &PipelineConfig,
    prices: &dyn PriceProvider,
    tickers: &dyn TickerResolver,
) -> Result<RunOutput, AppError> {
    let statements = io::load_latest_statements(&config.input_dir, &config.schema)?;
    let companies = select_companies(&statements, &config.companies)?;

    fs::create_dir_all(&config.output_dir).map_err(|e| {
        AppError::new(
            4,
            format!("Failed to create output dir '{}': {e}", config.output_dir.display()),
        )
    })?;

    let index = CompanyIndex::build(&statements);
    let mut outcomes = Vec::with_capacity(companies.len());
    for company in &companies {
        let ticker = tickers.resolve(company);
        let rows = index.slice(company.id);
        outcomes.push(process_company(company, ticker, &rows, config, prices));
    }

    let manifest = io::write_manifest(&config.output_dir, &outcomes)?;
    Ok(RunOutput { outcomes, manifest })
}

/// Companies of the income statement, optionally restricted to `only`.
pub fn select_companies(statements: &Statements, only: &[u32]) -> Result<Vec<Company>, AppError> {
    let mut companies = calc::enumerate_companies(&statements.income);
    if !only.is_empty() {
        companies.retain(|c| only.contains(&c.id));
    }
    if companies.is_empty() {
        return Err(AppError::new(3, "No companies found in the filtered income statement."));
    }
    Ok(companies)
}

fn process_company(
    company: &Company,
    ticker: Option<String>,
    rows: &CompanyStatements<'_>,
    config: &PipelineConfig,
    prices: &dyn PriceProvider,
) -> CompanyOutcome {
    let mut outcome = CompanyOutcome {
        company_id: company.id,
        name: company.name.clone(),
        ticker: ticker.clone(),
        rows: 0,
        status: OutcomeStatus::Empty,
    };

    let result = build_indicator_table(company, ticker, rows, config, prices).and_then(|table| {
        let path = io::indicator_path(&config.output_dir, company, table.ticker.as_deref());
        io::write_indicator_csv(&path, &table).map_err(|e| CompanyError::Write {
            company_id: company.id,
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok((table.rows.len(), path))
    });

    match result {
        Ok((0, path)) => {
            warn!(company_id = company.id, path = %path.display(), "no complete fiscal years");
        }
        Ok((n, path)) => {
            info!(company_id = company.id, rows = n, path = %path.display(), "wrote indicators");
            outcome.rows = n;
            outcome.status = OutcomeStatus::Ok;
        }
        Err(err) => {
            error!(company_id = company.id, error = %err, "company failed");
            outcome.status = OutcomeStatus::Failed {
                message: err.to_string(),
            };
        }
    }
    outcome
}

/// Build one company's indicator table (nothing is written).
pub fn build_indicator_table(
    company: &Company,
    ticker: Option<String>,
    rows: &CompanyStatements<'_>,
    config: &PipelineConfig,
    prices: &dyn PriceProvider,
) -> Result<IndicatorTable, CompanyError> {
    let items = calc::extract_company(company.id, rows, &config.codes, config.duplicates)?;

    let yearly = match ticker.as_deref() {
        Some(t) => crate::data::fetch_yearly_closes(prices, t, config.price_start, config.price_end),
        None => {
            warn!(company_id = company.id, "no ticker resolved; continuing without prices");
            calc::LineSeries::new()
        }
    };

    let joined = calc::outer_join(&items, &yearly);
    let derived = calc::derive_indicators(&joined);
    let rows = calc::apply_completeness(derived, config.completeness);

    Ok(IndicatorTable {
        company: company.clone(),
        ticker,
        rows,
    })
}

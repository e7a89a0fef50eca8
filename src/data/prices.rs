//! Price-history providers and yearly resampling.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use crate::calc::LineSeries;
use crate::error::AppError;
use crate::io::ingest::{parse_decimal, parse_reference_date};

/// A source of daily closing prices.
pub trait PriceProvider {
    /// Daily closes for `ticker` in `[start, end]`, in any order.
    fn daily_closes(&self, ticker: &str, start: NaiveDate, end: NaiveDate)
    -> Result<Vec<(NaiveDate, f64)>, AppError>;
}

/// Fetch and resample, degrading any provider failure to an empty series.
pub fn fetch_yearly_closes(
    provider: &dyn PriceProvider,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> LineSeries {
    match provider.daily_closes(ticker, start, end) {
        Ok(daily) => {
            debug!(ticker, observations = daily.len(), "fetched daily closes");
            resample_yearly_last(&daily)
        }
        Err(err) => {
            warn!(ticker, error = %err, "price history unavailable; continuing without prices");
            LineSeries::new()
        }
    }
}

/// One close per calendar year: the last trading day's close, keyed by 31 December.
pub fn resample_yearly_last(daily: &[(NaiveDate, f64)]) -> LineSeries {
    let mut sorted: Vec<(NaiveDate, f64)> = daily.iter().copied().filter(|(_, v)| v.is_finite()).collect();
    sorted.sort_by_key(|(d, _)| *d);

    let mut out = LineSeries::new();
    for (date, close) in sorted {
        if let Some(year_end) = NaiveDate::from_ymd_opt(date.year(), 12, 31) {
            // Ascending order: later days overwrite earlier ones.
            out.insert(year_end, close);
        }
    }
    out
}

/// Offline provider reading `<dir>/<ticker>.csv` files with `Date,Close` columns.
#[derive(Debug, Clone)]
pub struct CsvPriceDir {
    dir: PathBuf,
}

impl CsvPriceDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }
}

impl PriceProvider for CsvPriceDir {
    fn daily_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>, AppError> {
        let path = self.path_for(ticker);
        let rows = read_price_csv(&path)?;
        Ok(rows
            .into_iter()
            .filter(|(d, _)| *d >= start && *d <= end)
            .collect())
    }
}

fn read_price_csv(path: &Path) -> Result<Vec<(NaiveDate, f64)>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(4, format!("Failed to open price file '{}': {e}", path.display())))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(4, format!("Failed to read price headers: {e}")))?
        .clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| AppError::new(4, format!("{}: missing `{name}` column", path.display())))
    };
    let date_idx = find("date")?;
    let close_idx = find("close")?;

    let mut out = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| AppError::new(4, format!("Price CSV parse error: {e}")))?;
        let (Some(raw_date), Some(raw_close)) = (record.get(date_idx), record.get(close_idx)) else {
            continue;
        };
        let date = parse_reference_date(raw_date)
            .ok_or_else(|| AppError::new(4, format!("{}: invalid date '{raw_date}'", path.display())))?;
        // Blank closes are holidays/no-trade days.
        if let Some(close) = parse_decimal(raw_close) {
            out.push((date, close));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    struct Failing;

    impl PriceProvider for Failing {
        fn daily_closes(&self, ticker: &str, _: NaiveDate, _: NaiveDate) -> Result<Vec<(NaiveDate, f64)>, AppError> {
            Err(AppError::new(4, format!("unknown ticker {ticker}")))
        }
    }

    #[test]
    fn resample_takes_last_trading_day_per_year() {
        let daily = vec![
            (d(2020, 12, 30), 10.5),
            (d(2020, 6, 1), 8.0),
            (d(2021, 1, 4), 11.0),
            (d(2021, 12, 29), 12.0),
            (d(2021, 12, 28), 99.0),
            (d(2022, 3, 1), f64::NAN),
        ];

        let yearly = resample_yearly_last(&daily);
        assert_eq!(yearly.len(), 2);
        assert_eq!(yearly.get(&d(2020, 12, 31)), Some(&10.5));
        assert_eq!(yearly.get(&d(2021, 12, 31)), Some(&12.0));
    }

    #[test]
    fn provider_failure_degrades_to_empty() {
        let series = fetch_yearly_closes(&Failing, "XXXX3.SA", d(2010, 1, 1), d(2020, 1, 1));
        assert!(series.is_empty());
    }

    #[test]
    fn csv_price_dir_filters_window() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ACME3.SA.csv"),
            "Date,Close\n2019-12-30,5.0\n2020-12-30,6.0\n2020-12-31,\n2021-12-30,7.0\n",
        )
        .unwrap();

        let provider = CsvPriceDir::new(dir.path());
        let closes = provider
            .daily_closes("ACME3.SA", d(2020, 1, 1), d(2020, 12, 31))
            .unwrap();
        assert_eq!(closes, vec![(d(2020, 12, 30), 6.0)]);

        assert!(provider.daily_closes("NOPE3.SA", d(2020, 1, 1), d(2020, 12, 31)).is_err());
    }
}

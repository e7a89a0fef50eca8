//! Persist indicator tables (CSV) and the run manifest (JSON), and read tables back.
//!
//! Floats are written with Rust's shortest round-trip formatting, so a
//! reloaded table is value-identical and reruns are byte-identical.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::domain::{CompanyOutcome, Company, DATE_COLUMN, Indicator, IndicatorTable, WideRow, WideTable};
use crate::error::AppError;
use crate::io::ingest::parse_reference_date;

/// File name of the run manifest inside the output directory.
pub const MANIFEST_FILE: &str = "run_manifest.json";

/// Output file for a company: `<cd_cvm>_<ticker>.csv` (`NA` when no ticker).
pub fn indicator_path(output_dir: &Path, company: &Company, ticker: Option<&str>) -> PathBuf {
    output_dir.join(format!("{}_{}.csv", company.id, ticker.unwrap_or("NA")))
}

/// Write an indicator table: date first, then every indicator in output order.
pub fn write_indicator_csv(path: &Path, table: &IndicatorTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = Vec::with_capacity(Indicator::COUNT + 1);
    header.push(DATE_COLUMN);
    header.extend(Indicator::ALL.iter().map(|i| i.column_name()));
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(4, format!("Failed to write header to '{}': {e}", path.display())))?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(Indicator::COUNT + 1);
        record.push(row.date.format("%Y-%m-%d").to_string());
        record.extend(row.values().iter().map(|v| format_cell(*v)));
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(4, format!("Failed to write row to '{}': {e}", path.display())))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush '{}': {e}", path.display())))?;
    Ok(())
}

fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => String::new(),
    }
}

/// Read a persisted indicator table (any column set; the first column is the date).
pub fn read_indicator_csv(path: &Path) -> Result<WideTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open '{}': {e}", path.display())))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read headers of '{}': {e}", path.display())))?
        .clone();
    let mut names = headers.iter().map(str::to_string);
    let date_column = names
        .next()
        .ok_or_else(|| AppError::new(2, format!("'{}' has no columns.", path.display())))?;
    let columns: Vec<String> = names.collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result
            .map_err(|e| AppError::new(2, format!("{}:{line}: CSV parse error: {e}", path.display())))?;

        let raw_date = record.get(0).unwrap_or("");
        let date = parse_reference_date(raw_date)
            .ok_or_else(|| AppError::new(2, format!("{}:{line}: invalid date '{raw_date}'", path.display())))?;

        let mut values = Vec::with_capacity(columns.len());
        for (col, name) in columns.iter().enumerate() {
            let raw = record.get(col + 1).unwrap_or("");
            let value = if raw.is_empty() {
                None
            } else {
                Some(raw.parse::<f64>().map_err(|_| {
                    AppError::new(2, format!("{}:{line}: invalid {name} '{raw}'", path.display()))
                })?)
            };
            values.push(value);
        }
        rows.push(WideRow { date, values });
    }

    Ok(WideTable {
        date_column,
        columns,
        rows,
    })
}

/// Write the per-company outcomes of a run as pretty JSON.
pub fn write_manifest(output_dir: &Path, outcomes: &[CompanyOutcome]) -> Result<PathBuf, AppError> {
    let path = output_dir.join(MANIFEST_FILE);
    let file = File::create(&path)
        .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, outcomes)
        .map_err(|e| AppError::new(4, format!("Failed to write run manifest: {e}")))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IndicatorRow, OutcomeStatus};
    use chrono::NaiveDate;

    fn sample_table() -> IndicatorTable {
        let mut rows = Vec::new();
        for (i, year) in [2019, 2020, 2021].into_iter().enumerate() {
            let mut row = IndicatorRow::new(NaiveDate::from_ymd_opt(year, 12, 31).unwrap());
            for (j, ind) in Indicator::ALL.into_iter().enumerate() {
                // Awkward values on purpose: thirds and large magnitudes.
                let v = (i as f64 + 1.0) / 3.0 * 10f64.powi(j as i32 % 7) - 0.1;
                row.set(ind, Some(v));
            }
            rows.push(row);
        }
        IndicatorTable {
            company: Company {
                id: 9512,
                name: "ACME SA".to_string(),
            },
            ticker: Some("95123.SA".to_string()),
            rows,
        }
    }

    #[test]
    fn round_trip_preserves_values_and_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let path = indicator_path(dir.path(), &table.company, table.ticker.as_deref());
        assert!(path.ends_with("9512_95123.SA.csv"));

        write_indicator_csv(&path, &table).unwrap();
        let wide = read_indicator_csv(&path).unwrap();

        assert_eq!(wide, table.to_wide());
        assert_eq!(wide.date_column, "Date");
        assert_eq!(wide.columns[0], "Close");
        assert_eq!(wide.columns[5], "Working_Capital");
        assert_eq!(wide.columns.last().map(String::as_str), Some("P_E"));
    }

    #[test]
    fn rewriting_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        write_indicator_csv(&a, &table).unwrap();
        write_indicator_csv(&b, &table).unwrap();
        assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
    }

    #[test]
    fn missing_cells_are_written_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = sample_table();
        table.rows.truncate(1);
        table.rows[0].set(Indicator::ReturnOnEquity, None);
        table.rows[0].set(Indicator::LeverageRatio, Some(f64::INFINITY));

        let path = dir.path().join("partial.csv");
        write_indicator_csv(&path, &table).unwrap();
        let wide = read_indicator_csv(&path).unwrap();

        let roe = wide.column_index("ROE").unwrap();
        let lev = wide.column_index("Leverage_Ratio").unwrap();
        assert_eq!(wide.rows[0].values[roe], None);
        assert_eq!(wide.rows[0].values[lev], None);
    }

    #[test]
    fn empty_table_has_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = sample_table();
        table.rows.clear();
        let path = dir.path().join("empty.csv");
        write_indicator_csv(&path, &table).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("Date,Close,EPS,Net_Revenue,"));
        assert!(read_indicator_csv(&path).unwrap().rows.is_empty());
    }

    #[test]
    fn manifest_is_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let outcomes = vec![
            CompanyOutcome {
                company_id: 1,
                name: "ALFA".to_string(),
                ticker: Some("00013.SA".to_string()),
                rows: 0,
                status: OutcomeStatus::Empty,
            },
            CompanyOutcome {
                company_id: 2,
                name: "BETA".to_string(),
                ticker: None,
                rows: 0,
                status: OutcomeStatus::Failed {
                    message: "boom".to_string(),
                },
            },
        ];
        let path = write_manifest(dir.path(), &outcomes).unwrap();
        let json: serde_json::Value = serde_json::from_reader(File::open(path).unwrap()).unwrap();
        assert_eq!(json[0]["status"], "empty");
        assert_eq!(json[1]["status"], "failed");
        assert_eq!(json[1]["message"], "boom");
    }
}

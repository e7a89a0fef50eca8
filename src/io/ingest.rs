//! Statement CSV ingest.
//!
//! This module turns the upstream statement extracts into typed
//! `StatementRecord`s and applies the latest-filing filter.
//!
//! Design goals:
//! - **Strict schema**: every configured column must exist, including the
//!   filing-status column (otherwise the filter would silently pass all rows)
//! - **Fallible parsing**: bad dates and values surface as structured errors
//!   with file and line, never as silent gaps
//! - **Deterministic order**: files sorted by name, rows in line order

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::config::{ColumnMap, StatementSchema};
use crate::domain::{FilingStatus, StatementKind, StatementRecord, StatementTable};
use crate::error::{AppError, StatementError};

/// The four filtered statement tables of a run.
#[derive(Debug, Clone)]
pub struct Statements {
    pub income: StatementTable,
    pub assets: StatementTable,
    pub liabilities: StatementTable,
    pub cash_flow: StatementTable,
}

impl Statements {
    pub fn get(&self, kind: StatementKind) -> &StatementTable {
        match kind {
            StatementKind::Income => &self.income,
            StatementKind::Assets => &self.assets,
            StatementKind::Liabilities => &self.liabilities,
            StatementKind::CashFlow => &self.cash_flow,
        }
    }
}

/// Load all four statement kinds from `dir` and keep only latest filings.
pub fn load_latest_statements(dir: &Path, schema: &StatementSchema) -> Result<Statements, AppError> {
    let load = |kind: StatementKind| -> Result<StatementTable, AppError> {
        let table = load_statements(dir, kind, schema)?;
        let read = table.rows_read;
        let parsed = table.records.len();
        let skipped = table.rows_skipped;
        let filtered = filter_latest(table);
        info!(
            kind = kind.display_name(),
            read,
            parsed,
            skipped,
            latest = filtered.records.len(),
            "loaded statements"
        );
        Ok(filtered)
    };

    Ok(Statements {
        income: load(StatementKind::Income)?,
        assets: load(StatementKind::Assets)?,
        liabilities: load(StatementKind::Liabilities)?,
        cash_flow: load(StatementKind::CashFlow)?,
    })
}

/// Keep only rows whose filing status is `Latest`.
pub fn filter_latest(table: StatementTable) -> StatementTable {
    let StatementTable {
        kind,
        records,
        rows_read,
        rows_skipped,
    } = table;
    StatementTable {
        kind,
        records: records
            .into_iter()
            .filter(|r| r.status == FilingStatus::Latest)
            .collect(),
        rows_read,
        rows_skipped,
    }
}

/// Load every file of one statement kind from `dir`.
pub fn load_statements(
    dir: &Path,
    kind: StatementKind,
    schema: &StatementSchema,
) -> Result<StatementTable, StatementError> {
    let token = schema.file_tokens.token(kind);
    let files = discover_statement_files(dir, token)?;

    let mut table = StatementTable {
        kind,
        records: Vec::new(),
        rows_read: 0,
        rows_skipped: 0,
    };
    for path in &files {
        debug!(file = %path.display(), kind = kind.display_name(), "reading statement file");
        load_file(path, schema, &mut table)?;
    }
    Ok(table)
}

/// Find `*.csv` files in `dir` whose name contains `token` (sorted by name).
pub fn discover_statement_files(dir: &Path, token: &str) -> Result<Vec<PathBuf>, StatementError> {
    let entries = fs::read_dir(dir).map_err(|source| StatementError::Io {
        file: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let is_csv = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            let matches_token = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.contains(token));
            is_csv && matches_token
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(StatementError::NoFiles {
            dir: dir.to_path_buf(),
            token: token.to_string(),
        });
    }
    Ok(files)
}

/// Resolved column indexes for one file.
struct ColumnIndex {
    company_id: usize,
    company_name: usize,
    filing_status: usize,
    code: usize,
    value: usize,
    reference_date: usize,
}

fn load_file(path: &Path, schema: &StatementSchema, table: &mut StatementTable) -> Result<(), StatementError> {
    let bytes = fs::read(path).map_err(|source| StatementError::Io {
        file: path.to_path_buf(),
        source,
    })?;
    let text = decode_text(path, bytes);

    // Validated when the config was built; fall back to CVM's `;` regardless.
    let delimiter = schema.delimiter_byte().unwrap_or(b';');
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|source| StatementError::Csv {
            file: path.to_path_buf(),
            line: 1,
            source,
        })?
        .clone();
    let index = resolve_columns(path, &build_header_map(&headers), &schema.columns)?;

    // Rows with a non-empty status cell, and how many of them are latest.
    let mut with_status = 0usize;
    let mut latest = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header line, lines are 1-based.
        let line = idx + 2;
        table.rows_read += 1;

        let record = result.map_err(|source| StatementError::Csv {
            file: path.to_path_buf(),
            line,
            source,
        })?;

        let status = record.get(index.filing_status).map(str::trim).unwrap_or("");
        if !status.is_empty() {
            with_status += 1;
            if is_latest_marker(status, &schema.latest_marker) {
                latest += 1;
            }
        }

        match parse_record(&record, &index, &schema.columns, &schema.latest_marker, path, line)? {
            Some(row) => table.records.push(row),
            None => table.rows_skipped += 1,
        }
    }

    // A marker that never matches would make the latest filter drop the whole file.
    if with_status > 0 && latest == 0 {
        return Err(StatementError::NoLatestRows {
            file: path.to_path_buf(),
            marker: schema.latest_marker.clone(),
        });
    }

    Ok(())
}

/// CVM publishes ISO-8859-1 files; anything that isn't valid UTF-8 is decoded as Latin-1.
fn decode_text(path: &Path, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            warn!(
                file = %path.display(),
                offset = err.utf8_error().valid_up_to(),
                "file is not valid UTF-8; decoding as Latin-1"
            );
            err.into_bytes().iter().map(|&b| char::from(b)).collect()
        }
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_lowercase()
}

fn resolve_columns(
    path: &Path,
    header_map: &HashMap<String, usize>,
    columns: &ColumnMap,
) -> Result<ColumnIndex, StatementError> {
    let find = |name: &str| {
        header_map
            .get(&normalize_header_name(name))
            .copied()
            .ok_or_else(|| StatementError::MissingColumn {
                file: path.to_path_buf(),
                column: name.to_string(),
            })
    };

    Ok(ColumnIndex {
        filing_status: find(&columns.filing_status)?,
        company_id: find(&columns.company_id)?,
        company_name: find(&columns.company_name)?,
        code: find(&columns.code)?,
        value: find(&columns.value)?,
        reference_date: find(&columns.reference_date)?,
    })
}

/// Parse one row; `Ok(None)` means the value cell was empty.
fn parse_record(
    record: &StringRecord,
    index: &ColumnIndex,
    columns: &ColumnMap,
    latest_marker: &str,
    path: &Path,
    line: usize,
) -> Result<Option<StatementRecord>, StatementError> {
    let cell = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");
    let invalid = |column: &str, value: &str| StatementError::InvalidValue {
        file: path.to_path_buf(),
        line,
        column: column.to_string(),
        value: value.to_string(),
    };

    let raw_value = cell(index.value);
    if raw_value.is_empty() {
        return Ok(None);
    }
    let value = parse_decimal(raw_value).ok_or_else(|| invalid(&columns.value, raw_value))?;

    let raw_id = cell(index.company_id);
    let company_id = raw_id
        .parse::<u32>()
        .map_err(|_| invalid(&columns.company_id, raw_id))?;

    let raw_date = cell(index.reference_date);
    let reference_date = parse_reference_date(raw_date).ok_or_else(|| StatementError::InvalidDate {
        file: path.to_path_buf(),
        line,
        value: raw_date.to_string(),
    })?;

    let status = if is_latest_marker(cell(index.filing_status), latest_marker) {
        FilingStatus::Latest
    } else {
        FilingStatus::Superseded
    };

    Ok(Some(StatementRecord {
        company_id,
        company_name: cell(index.company_name).to_string(),
        status,
        code: cell(index.code).to_string(),
        value,
        reference_date,
    }))
}

fn is_latest_marker(cell: &str, marker: &str) -> bool {
    cell.trim().to_lowercase() == marker.trim().to_lowercase()
}

/// Parse a reference date (`YYYY-MM-DD` or `DD/MM/YYYY`).
pub fn parse_reference_date(s: &str) -> Option<NaiveDate> {
    const FMTS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];
    FMTS.iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s.trim(), fmt).ok())
}

/// Parse a value cell, accepting `.` or `,` as the decimal separator.
pub fn parse_decimal(s: &str) -> Option<f64> {
    let s = s.trim();
    let v = match s.parse::<f64>() {
        Ok(v) => v,
        Err(_) if s.contains(',') && !s.contains('.') => s.replace(',', ".").parse::<f64>().ok()?,
        Err(_) => return None,
    };
    if v.is_finite() { Some(v) } else { None }
}

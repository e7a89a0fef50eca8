use std::path::PathBuf;

use thiserror::Error;

/// Top-level error carrying the process exit code.
///
/// Exit codes:
/// - 2: configuration or input-contract violation
/// - 3: no usable data
/// - 4: runtime failure (terminal, network, filesystem)
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Structured failures raised while loading statement files.
#[derive(Debug, Error)]
pub enum StatementError {
    #[error("No statement files matching `{token}` found in {}", dir.display())]
    NoFiles { dir: PathBuf, token: String },

    #[error("{}: missing required column `{column}`", file.display())]
    MissingColumn { file: PathBuf, column: String },

    #[error("{}:{line}: invalid reference date '{value}' (expected YYYY-MM-DD or DD/MM/YYYY)", file.display())]
    InvalidDate {
        file: PathBuf,
        line: usize,
        value: String,
    },

    #[error("{}:{line}: invalid {column} '{value}'", file.display())]
    InvalidValue {
        file: PathBuf,
        line: usize,
        column: String,
        value: String,
    },

    #[error("{}: no row carries the latest-filing marker `{marker}`", file.display())]
    NoLatestRows { file: PathBuf, marker: String },

    #[error("{}: {source}", file.display())]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: CSV parse error: {source}", file.display())]
    Csv {
        file: PathBuf,
        line: usize,
        #[source]
        source: csv::Error,
    },
}

impl From<StatementError> for AppError {
    fn from(err: StatementError) -> Self {
        AppError::new(2, err.to_string())
    }
}

/// Failures scoped to a single company; the run records them and moves on.
#[derive(Debug, Error)]
pub enum CompanyError {
    #[error("company {company_id}: duplicate rows for line item {code} on {date}")]
    DuplicateLineItem {
        company_id: u32,
        code: String,
        date: chrono::NaiveDate,
    },

    #[error("company {company_id}: failed to write {}: {message}", path.display())]
    Write {
        company_id: u32,
        path: PathBuf,
        message: String,
    },
}

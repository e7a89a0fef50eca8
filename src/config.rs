//! Run configuration.
//!
//! Everything the pipeline needs to know about the outside world lives here:
//! where the statements are, what their columns are called, which line-item
//! codes to read, and where to write. The configuration is resolved once at
//! startup (CLI flags + environment + optional JSON file) and passed down by
//! reference.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{CompletenessPolicy, DuplicatePolicy, LineItem, StatementKind};
use crate::error::AppError;

/// Fully resolved pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub schema: StatementSchema,
    pub codes: LineItemCodes,
    /// Optional `cd_cvm,ticker` map replacing the prefix heuristic.
    pub ticker_map: Option<PathBuf>,
    /// Offline price directory (`<ticker>.csv`) replacing the Yahoo client.
    pub prices_dir: Option<PathBuf>,
    pub price_start: NaiveDate,
    pub price_end: NaiveDate,
    pub timeout: Duration,
    pub duplicates: DuplicatePolicy,
    pub completeness: CompletenessPolicy,
    /// Restrict the run to these company ids (empty = all).
    pub companies: Vec<u32>,
}

/// Layout of the upstream statement files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementSchema {
    pub delimiter: char,
    /// Filing-status cell value that marks the latest filing.
    pub latest_marker: String,
    pub columns: ColumnMap,
    pub file_tokens: FileTokens,
}

impl Default for StatementSchema {
    fn default() -> Self {
        Self {
            delimiter: ';',
            latest_marker: "ÚLTIMO".to_string(),
            columns: ColumnMap::default(),
            file_tokens: FileTokens::default(),
        }
    }
}

impl StatementSchema {
    pub fn delimiter_byte(&self) -> Result<u8, AppError> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(AppError::new(
                2,
                format!("Delimiter must be a single ASCII character (got '{}').", self.delimiter),
            ))
        }
    }
}

/// Column names of the statement files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub company_id: String,
    pub company_name: String,
    pub filing_status: String,
    pub code: String,
    pub value: String,
    pub reference_date: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            company_id: "CD_CVM".to_string(),
            company_name: "DENOM_CIA".to_string(),
            filing_status: "ORDEM_EXERC".to_string(),
            code: "CD_CONTA".to_string(),
            value: "VL_CONTA".to_string(),
            reference_date: "DT_REFER".to_string(),
        }
    }
}

/// File-name tokens used to find each statement kind in the input directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTokens {
    pub income: String,
    pub assets: String,
    pub liabilities: String,
    pub cash_flow: String,
}

impl Default for FileTokens {
    fn default() -> Self {
        Self {
            income: StatementKind::Income.default_token().to_string(),
            assets: StatementKind::Assets.default_token().to_string(),
            liabilities: StatementKind::Liabilities.default_token().to_string(),
            cash_flow: StatementKind::CashFlow.default_token().to_string(),
        }
    }
}

impl FileTokens {
    pub fn token(&self, kind: StatementKind) -> &str {
        match kind {
            StatementKind::Income => &self.income,
            StatementKind::Assets => &self.assets,
            StatementKind::Liabilities => &self.liabilities,
            StatementKind::CashFlow => &self.cash_flow,
        }
    }
}

/// Chart-of-accounts codes read for each line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItemCodes {
    pub net_revenue: String,
    pub operating_income: String,
    pub net_income: String,
    pub earnings_per_share: String,
    pub current_assets: String,
    pub cash: String,
    pub current_liabilities: String,
    pub non_current_liabilities: String,
    pub equity: String,
    pub dividends: String,
}

impl Default for LineItemCodes {
    fn default() -> Self {
        Self {
            net_revenue: "3.01".to_string(),
            operating_income: "3.05".to_string(),
            net_income: "3.11".to_string(),
            earnings_per_share: "3.99.01.01".to_string(),
            current_assets: "1.01".to_string(),
            cash: "1.01.01".to_string(),
            current_liabilities: "2.01".to_string(),
            non_current_liabilities: "2.02".to_string(),
            equity: "2.03".to_string(),
            dividends: "6.03.05".to_string(),
        }
    }
}

impl LineItemCodes {
    pub fn code(&self, item: LineItem) -> &str {
        match item {
            LineItem::NetRevenue => &self.net_revenue,
            LineItem::OperatingIncome => &self.operating_income,
            LineItem::NetIncome => &self.net_income,
            LineItem::EarningsPerShare => &self.earnings_per_share,
            LineItem::CurrentAssets => &self.current_assets,
            LineItem::Cash => &self.cash,
            LineItem::CurrentLiabilities => &self.current_liabilities,
            LineItem::NonCurrentLiabilities => &self.non_current_liabilities,
            LineItem::Equity => &self.equity,
            LineItem::Dividends => &self.dividends,
        }
    }
}

/// Optional JSON overrides for the statement layout and line-item codes.
///
/// Every field is optional; missing fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub schema: StatementSchema,
    pub line_items: LineItemCodes,
}

/// Read a JSON config file.
pub fn read_config_file(path: &Path) -> Result<ConfigFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open config '{}': {e}", path.display())))?;
    let config: ConfigFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid config '{}': {e}", path.display())))?;
    Ok(config)
}

//! Shared domain types.
//!
//! These types are kept small and plain so they can be:
//!
//! - produced by the statement loader
//! - joined and derived by the indicator pipeline
//! - persisted to CSV and reloaded by the dashboard

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which of the four statement tables a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatementKind {
    /// Income statement (DRE).
    Income,
    /// Asset balance sheet (BPA).
    Assets,
    /// Liability and equity balance sheet (BPP).
    Liabilities,
    /// Cash-flow statement (DFC).
    CashFlow,
}

impl StatementKind {
    pub const ALL: [StatementKind; 4] = [
        StatementKind::Income,
        StatementKind::Assets,
        StatementKind::Liabilities,
        StatementKind::CashFlow,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            StatementKind::Income => "income statement",
            StatementKind::Assets => "asset balance sheet",
            StatementKind::Liabilities => "liability balance sheet",
            StatementKind::CashFlow => "cash-flow statement",
        }
    }

    /// File-name token used to discover this kind's files (CVM DFP naming).
    ///
    /// CVM ships consolidated (`_con_`) and parent-only (`_ind_`) extracts side
    /// by side; the default selects the consolidated set only.
    pub fn default_token(self) -> &'static str {
        match self {
            StatementKind::Income => "DRE_con",
            StatementKind::Assets => "BPA_con",
            StatementKind::Liabilities => "BPP_con",
            StatementKind::CashFlow => "DFC_MI_con",
        }
    }
}

/// Filing-status marker of a statement row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilingStatus {
    /// Final version of the statement for its reference date.
    Latest,
    /// An earlier or restated comparative version.
    Superseded,
}

/// One row of a filed statement table.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRecord {
    pub company_id: u32,
    pub company_name: String,
    pub status: FilingStatus,
    /// Hierarchical chart-of-accounts code, e.g. `3.01`.
    pub code: String,
    pub value: f64,
    pub reference_date: NaiveDate,
}

/// All rows of one statement kind, in deterministic file/line order.
#[derive(Debug, Clone)]
pub struct StatementTable {
    pub kind: StatementKind,
    pub records: Vec<StatementRecord>,
    pub rows_read: usize,
    /// Rows skipped because the value cell was empty.
    pub rows_skipped: usize,
}

/// A listed company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub id: u32,
    pub name: String,
}

/// The line items pulled out of the statements for each company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LineItem {
    NetRevenue,
    OperatingIncome,
    NetIncome,
    EarningsPerShare,
    CurrentAssets,
    Cash,
    CurrentLiabilities,
    NonCurrentLiabilities,
    Equity,
    Dividends,
}

impl LineItem {
    pub const ALL: [LineItem; 10] = [
        LineItem::NetRevenue,
        LineItem::OperatingIncome,
        LineItem::NetIncome,
        LineItem::EarningsPerShare,
        LineItem::CurrentAssets,
        LineItem::Cash,
        LineItem::CurrentLiabilities,
        LineItem::NonCurrentLiabilities,
        LineItem::Equity,
        LineItem::Dividends,
    ];

    /// Statement table the line item is read from.
    pub fn statement(self) -> StatementKind {
        match self {
            LineItem::NetRevenue
            | LineItem::OperatingIncome
            | LineItem::NetIncome
            | LineItem::EarningsPerShare => StatementKind::Income,
            LineItem::CurrentAssets | LineItem::Cash => StatementKind::Assets,
            LineItem::CurrentLiabilities | LineItem::NonCurrentLiabilities | LineItem::Equity => {
                StatementKind::Liabilities
            }
            LineItem::Dividends => StatementKind::CashFlow,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            LineItem::NetRevenue => "net revenue",
            LineItem::OperatingIncome => "operating income",
            LineItem::NetIncome => "net income",
            LineItem::EarningsPerShare => "earnings per share",
            LineItem::CurrentAssets => "current assets",
            LineItem::Cash => "cash and equivalents",
            LineItem::CurrentLiabilities => "current liabilities",
            LineItem::NonCurrentLiabilities => "non-current liabilities",
            LineItem::Equity => "equity",
            LineItem::Dividends => "dividends",
        }
    }
}

/// Output columns of an indicator table, in persisted order (after the date).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    Close,
    EarningsPerShare,
    NetRevenue,
    CurrentAssets,
    CurrentLiabilities,
    WorkingCapital,
    Equity,
    OperatingIncome,
    NetIncome,
    Dividends,
    NetDebt,
    LeverageRatio,
    NetMargin,
    ReturnOnEquity,
    PriceToEarnings,
}

/// Name of the reference-date column in persisted tables.
pub const DATE_COLUMN: &str = "Date";

impl Indicator {
    pub const COUNT: usize = 15;

    pub const ALL: [Indicator; Indicator::COUNT] = [
        Indicator::Close,
        Indicator::EarningsPerShare,
        Indicator::NetRevenue,
        Indicator::CurrentAssets,
        Indicator::CurrentLiabilities,
        Indicator::WorkingCapital,
        Indicator::Equity,
        Indicator::OperatingIncome,
        Indicator::NetIncome,
        Indicator::Dividends,
        Indicator::NetDebt,
        Indicator::LeverageRatio,
        Indicator::NetMargin,
        Indicator::ReturnOnEquity,
        Indicator::PriceToEarnings,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            Indicator::Close => "Close",
            Indicator::EarningsPerShare => "EPS",
            Indicator::NetRevenue => "Net_Revenue",
            Indicator::CurrentAssets => "Current_Assets",
            Indicator::CurrentLiabilities => "Current_Liabilities",
            Indicator::WorkingCapital => "Working_Capital",
            Indicator::Equity => "Equity",
            Indicator::OperatingIncome => "Operating_Income",
            Indicator::NetIncome => "Net_Income",
            Indicator::Dividends => "Dividends",
            Indicator::NetDebt => "Net_Debt",
            Indicator::LeverageRatio => "Leverage_Ratio",
            Indicator::NetMargin => "Net_Margin",
            Indicator::ReturnOnEquity => "ROE",
            Indicator::PriceToEarnings => "P_E",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One fiscal year of derived metrics for one company.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    values: [Option<f64>; Indicator::COUNT],
}

impl IndicatorRow {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: [None; Indicator::COUNT],
        }
    }

    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        self.values[indicator.index()]
    }

    pub fn set(&mut self, indicator: Indicator, value: Option<f64>) {
        self.values[indicator.index()] = value;
    }

    /// Values in persisted column order.
    pub fn values(&self) -> &[Option<f64>; Indicator::COUNT] {
        &self.values
    }

    /// True when every column holds a finite value.
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(|v| v.is_some_and(f64::is_finite))
    }
}

/// Chronological indicator rows for one company.
#[derive(Debug, Clone)]
pub struct IndicatorTable {
    pub company: Company,
    pub ticker: Option<String>,
    pub rows: Vec<IndicatorRow>,
}

impl IndicatorTable {
    /// The generic wide view the dashboard works with.
    pub fn to_wide(&self) -> WideTable {
        WideTable {
            date_column: DATE_COLUMN.to_string(),
            columns: Indicator::ALL.iter().map(|i| i.column_name().to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| WideRow {
                    date: row.date,
                    values: row.values().to_vec(),
                })
                .collect(),
        }
    }
}

/// A persisted indicator table as read back from disk: a date column plus
/// named numeric columns, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub date_column: String,
    pub columns: Vec<String>,
    pub rows: Vec<WideRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

impl WideTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// How one company's run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// At least one row written.
    Ok,
    /// The table was written but has no rows (e.g. no price history).
    Empty,
    /// Processing failed; nothing was written.
    Failed { message: String },
}

/// Per-company entry of the run manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyOutcome {
    pub company_id: u32,
    pub name: String,
    pub ticker: Option<String>,
    pub rows: usize,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

/// What to do when a company has more than one row for the same
/// line-item code and reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// The last row in file order wins.
    #[default]
    Last,
    /// The first row in file order wins.
    First,
    /// Fail the company.
    Reject,
}

/// Which rows survive into the persisted table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CompletenessPolicy {
    /// Keep a year only when every column is present and finite.
    #[default]
    DropIncomplete,
    /// Keep every priced year; missing or non-finite cells are written empty.
    KeepPartial,
}

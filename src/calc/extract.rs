//! Per-company line-item extraction.
//!
//! Statement rows are grouped by company once per run (`CompanyIndex`), then
//! each company's rows are reduced to one date-indexed series per line item.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::debug;

use crate::config::LineItemCodes;
use crate::domain::{DuplicatePolicy, LineItem, StatementKind, StatementRecord};
use crate::error::CompanyError;
use crate::io::ingest::Statements;

/// A single-column time series keyed by reference date.
pub type LineSeries = BTreeMap<NaiveDate, f64>;

/// Rows of one company, one vector per statement kind.
#[derive(Debug, Clone, Default)]
pub struct CompanyStatements<'a> {
    pub income: Vec<&'a StatementRecord>,
    pub assets: Vec<&'a StatementRecord>,
    pub liabilities: Vec<&'a StatementRecord>,
    pub cash_flow: Vec<&'a StatementRecord>,
}

impl<'a> CompanyStatements<'a> {
    pub fn get(&self, kind: StatementKind) -> &[&'a StatementRecord] {
        match kind {
            StatementKind::Income => &self.income,
            StatementKind::Assets => &self.assets,
            StatementKind::Liabilities => &self.liabilities,
            StatementKind::CashFlow => &self.cash_flow,
        }
    }

    fn get_mut(&mut self, kind: StatementKind) -> &mut Vec<&'a StatementRecord> {
        match kind {
            StatementKind::Income => &mut self.income,
            StatementKind::Assets => &mut self.assets,
            StatementKind::Liabilities => &mut self.liabilities,
            StatementKind::CashFlow => &mut self.cash_flow,
        }
    }
}

/// Statement rows grouped by company id (file order preserved within a group).
#[derive(Debug, Clone, Default)]
pub struct CompanyIndex<'a> {
    groups: HashMap<u32, CompanyStatements<'a>>,
}

impl<'a> CompanyIndex<'a> {
    pub fn build(statements: &'a Statements) -> Self {
        let mut groups: HashMap<u32, CompanyStatements<'a>> = HashMap::new();
        for kind in StatementKind::ALL {
            for record in &statements.get(kind).records {
                groups
                    .entry(record.company_id)
                    .or_default()
                    .get_mut(kind)
                    .push(record);
            }
        }
        Self { groups }
    }

    /// The company's rows; empty when it has none.
    pub fn slice(&self, company_id: u32) -> CompanyStatements<'a> {
        self.groups.get(&company_id).cloned().unwrap_or_default()
    }
}

/// Every extracted line-item series of one company.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedItems {
    series: BTreeMap<LineItem, LineSeries>,
}

impl ExtractedItems {
    pub fn get(&self, item: LineItem) -> Option<&LineSeries> {
        self.series.get(&item)
    }

    pub fn insert(&mut self, item: LineItem, series: LineSeries) {
        self.series.insert(item, series);
    }

    /// Union of all dates across the extracted series.
    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.series.values().flat_map(|s| s.keys())
    }
}

/// Extract every configured line item for one company.
pub fn extract_company(
    company_id: u32,
    rows: &CompanyStatements<'_>,
    codes: &LineItemCodes,
    policy: DuplicatePolicy,
) -> Result<ExtractedItems, CompanyError> {
    let mut items = ExtractedItems::default();
    for item in LineItem::ALL {
        let code = codes.code(item);
        let series = extract_series(company_id, rows.get(item.statement()), code, policy)?;
        if series.is_empty() {
            debug!(company_id, item = item.display_name(), code, "no rows for line item");
        }
        items.insert(item, series);
    }
    Ok(items)
}

/// Extract the rows for `code` into a date-indexed series.
pub fn extract_series(
    company_id: u32,
    rows: &[&StatementRecord],
    code: &str,
    policy: DuplicatePolicy,
) -> Result<LineSeries, CompanyError> {
    let mut series = LineSeries::new();
    for row in rows.iter().filter(|r| r.code == code) {
        let date = row.reference_date;
        if !series.contains_key(&date) {
            series.insert(date, row.value);
            continue;
        }
        match policy {
            DuplicatePolicy::Last => {
                series.insert(date, row.value);
            }
            DuplicatePolicy::First => {}
            DuplicatePolicy::Reject => {
                return Err(CompanyError::DuplicateLineItem {
                    company_id,
                    code: code.to_string(),
                    date,
                });
            }
        }
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FilingStatus, StatementTable};

    fn d(y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, 12, 31).unwrap()
    }

    fn rec(id: u32, code: &str, value: f64, year: i32) -> StatementRecord {
        StatementRecord {
            company_id: id,
            company_name: "ACME".to_string(),
            status: FilingStatus::Latest,
            code: code.to_string(),
            value,
            reference_date: d(year),
        }
    }

    fn table(kind: StatementKind, records: Vec<StatementRecord>) -> StatementTable {
        StatementTable {
            kind,
            rows_read: records.len(),
            records,
            rows_skipped: 0,
        }
    }

    #[test]
    fn duplicate_policies() {
        let a = rec(1, "3.01", 10.0, 2020);
        let b = rec(1, "3.01", 20.0, 2020);
        let rows = vec![&a, &b];

        let last = extract_series(1, &rows, "3.01", DuplicatePolicy::Last).unwrap();
        assert_eq!(last.get(&d(2020)), Some(&20.0));

        let first = extract_series(1, &rows, "3.01", DuplicatePolicy::First).unwrap();
        assert_eq!(first.get(&d(2020)), Some(&10.0));

        let err = extract_series(1, &rows, "3.01", DuplicatePolicy::Reject).unwrap_err();
        assert!(matches!(err, CompanyError::DuplicateLineItem { company_id: 1, .. }));
    }

    #[test]
    fn extraction_is_scoped_to_company_and_code() {
        let statements = Statements {
            income: table(
                StatementKind::Income,
                vec![
                    rec(1, "3.01", 100.0, 2020),
                    rec(1, "3.01.01", 999.0, 2020),
                    rec(2, "3.01", 555.0, 2020),
                    rec(1, "3.01", 110.0, 2021),
                ],
            ),
            assets: table(StatementKind::Assets, vec![rec(1, "1.01", 50.0, 2021)]),
            liabilities: table(StatementKind::Liabilities, vec![]),
            cash_flow: table(StatementKind::CashFlow, vec![]),
        };

        let index = CompanyIndex::build(&statements);
        let rows = index.slice(1);
        let items = extract_company(1, &rows, &LineItemCodes::default(), DuplicatePolicy::Reject).unwrap();

        let revenue = items.get(LineItem::NetRevenue).unwrap();
        assert_eq!(revenue.len(), 2);
        assert_eq!(revenue.get(&d(2020)), Some(&100.0));
        assert_eq!(revenue.get(&d(2021)), Some(&110.0));

        let assets = items.get(LineItem::CurrentAssets).unwrap();
        assert_eq!(assets.get(&d(2021)), Some(&50.0));
        assert!(items.get(LineItem::Equity).unwrap().is_empty());

        assert!(index.slice(42).income.is_empty());
    }
}

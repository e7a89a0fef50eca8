//! Indicator derivation and the completeness filter.
//!
//! Ratios use plain IEEE division: a zero denominator yields `inf`/`NaN`
//! instead of an error, and the completeness filter removes those rows.

use crate::calc::frame::YearInputs;
use crate::domain::{CompletenessPolicy, Indicator, IndicatorRow, LineItem};

/// Derive one indicator row from the joined inputs of a reference date.
pub fn derive_row(inputs: &YearInputs) -> IndicatorRow {
    let get = |item: LineItem| inputs.get(item);

    let current_assets = get(LineItem::CurrentAssets);
    let current_liabilities = get(LineItem::CurrentLiabilities);
    let non_current_liabilities = get(LineItem::NonCurrentLiabilities);
    let cash = get(LineItem::Cash);
    let equity = get(LineItem::Equity);
    let revenue = get(LineItem::NetRevenue);
    let operating_income = get(LineItem::OperatingIncome);
    let net_income = get(LineItem::NetIncome);
    let eps = get(LineItem::EarningsPerShare);

    let total_liabilities = both(non_current_liabilities, current_liabilities, |a, b| a + b);

    let mut row = IndicatorRow::new(inputs.date);
    row.set(Indicator::Close, inputs.close);
    row.set(Indicator::EarningsPerShare, eps);
    row.set(Indicator::NetRevenue, revenue);
    row.set(Indicator::CurrentAssets, current_assets);
    row.set(Indicator::CurrentLiabilities, current_liabilities);
    row.set(
        Indicator::WorkingCapital,
        both(current_assets, current_liabilities, |a, b| a - b),
    );
    row.set(Indicator::Equity, equity);
    row.set(Indicator::OperatingIncome, operating_income);
    row.set(Indicator::NetIncome, net_income);
    row.set(Indicator::Dividends, get(LineItem::Dividends));
    row.set(Indicator::NetDebt, both(total_liabilities, cash, |a, b| a - b));
    row.set(Indicator::LeverageRatio, both(total_liabilities, equity, |a, b| a / b));
    row.set(
        Indicator::NetMargin,
        both(net_income, revenue, |a, b| a / b * 100.0),
    );
    row.set(
        Indicator::ReturnOnEquity,
        both(operating_income, equity, |a, b| a / b * 100.0),
    );
    row.set(Indicator::PriceToEarnings, both(inputs.close, eps, |a, b| a / b));
    row
}

/// Derive rows for every joined date (order preserved).
pub fn derive_indicators(joined: &[YearInputs]) -> Vec<IndicatorRow> {
    joined.iter().map(derive_row).collect()
}

/// Apply the completeness policy to derived rows.
pub fn apply_completeness(rows: Vec<IndicatorRow>, policy: CompletenessPolicy) -> Vec<IndicatorRow> {
    match policy {
        CompletenessPolicy::DropIncomplete => rows.into_iter().filter(IndicatorRow::is_complete).collect(),
        CompletenessPolicy::KeepPartial => rows
            .into_iter()
            .filter(|row| row.get(Indicator::Close).is_some_and(f64::is_finite))
            .map(|mut row| {
                for ind in Indicator::ALL {
                    let cleaned = row.get(ind).filter(|v| v.is_finite());
                    row.set(ind, cleaned);
                }
                row
            })
            .collect(),
    }
}

fn both(a: Option<f64>, b: Option<f64>, f: impl Fn(f64, f64) -> f64) -> Option<f64> {
    Some(f(a?, b?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn full_inputs(year: i32) -> YearInputs {
        let mut inputs = YearInputs::new(NaiveDate::from_ymd_opt(year, 12, 31).unwrap());
        inputs.close = Some(25.0);
        inputs.set(LineItem::NetRevenue, Some(1000.0));
        inputs.set(LineItem::OperatingIncome, Some(200.0));
        inputs.set(LineItem::NetIncome, Some(150.0));
        inputs.set(LineItem::EarningsPerShare, Some(2.5));
        inputs.set(LineItem::CurrentAssets, Some(800.0));
        inputs.set(LineItem::Cash, Some(120.0));
        inputs.set(LineItem::CurrentLiabilities, Some(300.0));
        inputs.set(LineItem::NonCurrentLiabilities, Some(500.0));
        inputs.set(LineItem::Equity, Some(400.0));
        inputs.set(LineItem::Dividends, Some(-40.0));
        inputs
    }

    #[test]
    fn formulas() {
        let row = derive_row(&full_inputs(2020));

        assert_eq!(row.get(Indicator::WorkingCapital), Some(800.0 - 300.0));
        assert_eq!(row.get(Indicator::NetDebt), Some(500.0 + 300.0 - 120.0));
        assert_eq!(row.get(Indicator::LeverageRatio), Some((500.0 + 300.0) / 400.0));
        assert_eq!(row.get(Indicator::NetMargin), Some(150.0 / 1000.0 * 100.0));
        assert_eq!(row.get(Indicator::ReturnOnEquity), Some(200.0 / 400.0 * 100.0));
        assert_eq!(row.get(Indicator::PriceToEarnings), Some(25.0 / 2.5));
        assert_eq!(row.get(Indicator::Dividends), Some(-40.0));
        assert_eq!(row.get(Indicator::Close), Some(25.0));
        assert!(row.is_complete());
    }

    #[test]
    fn percentages_are_scaled_by_exactly_100() {
        let row = derive_row(&full_inputs(2020));
        let raw_margin = 150.0 / 1000.0;
        let raw_roe = 200.0 / 400.0;
        assert_eq!(row.get(Indicator::NetMargin), Some(raw_margin * 100.0));
        assert_eq!(row.get(Indicator::ReturnOnEquity), Some(raw_roe * 100.0));
    }

    #[test]
    fn zero_equity_year_is_dropped() {
        let good = full_inputs(2019);
        let mut zero_equity = full_inputs(2020);
        zero_equity.set(LineItem::Equity, Some(0.0));

        let rows = derive_indicators(&[good, zero_equity]);
        assert!(!rows[1].get(Indicator::LeverageRatio).unwrap().is_finite());
        assert!(!rows[1].get(Indicator::ReturnOnEquity).unwrap().is_finite());

        let kept = apply_completeness(rows, CompletenessPolicy::DropIncomplete);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].date, NaiveDate::from_ymd_opt(2019, 12, 31).unwrap());
    }

    #[test]
    fn zero_revenue_and_zero_eps_do_not_panic() {
        let mut inputs = full_inputs(2020);
        inputs.set(LineItem::NetRevenue, Some(0.0));
        inputs.set(LineItem::EarningsPerShare, Some(0.0));
        inputs.set(LineItem::NetIncome, Some(0.0));

        let row = derive_row(&inputs);
        assert!(row.get(Indicator::NetMargin).unwrap().is_nan());
        assert!(row.get(Indicator::PriceToEarnings).unwrap().is_infinite());
        assert!(apply_completeness(vec![row], CompletenessPolicy::DropIncomplete).is_empty());
    }

    #[test]
    fn missing_input_propagates_as_missing() {
        let mut inputs = full_inputs(2020);
        inputs.set(LineItem::Cash, None);
        let row = derive_row(&inputs);
        assert_eq!(row.get(Indicator::NetDebt), None);
        assert_eq!(row.get(Indicator::WorkingCapital), Some(500.0));
        assert!(!row.is_complete());
    }

    #[test]
    fn keep_partial_blanks_bad_cells_and_requires_price() {
        let mut no_price = full_inputs(2019);
        no_price.close = None;
        let mut zero_equity = full_inputs(2020);
        zero_equity.set(LineItem::Equity, Some(0.0));

        let rows = derive_indicators(&[no_price, zero_equity]);
        let kept = apply_completeness(rows, CompletenessPolicy::KeepPartial);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].get(Indicator::ReturnOnEquity), None);
        assert_eq!(kept[0].get(Indicator::LeverageRatio), None);
        assert_eq!(kept[0].get(Indicator::Equity), Some(0.0));
    }

    #[test]
    fn working_capital_identity_holds_for_retained_rows() {
        let rows: Vec<YearInputs> = (2010..2020)
            .map(|y| {
                let mut inputs = full_inputs(y);
                inputs.set(LineItem::CurrentAssets, Some(100.0 * f64::from(y - 2000)));
                inputs
            })
            .collect();

        for row in apply_completeness(derive_indicators(&rows), CompletenessPolicy::DropIncomplete) {
            let ca = row.get(Indicator::CurrentAssets).unwrap();
            let cl = row.get(Indicator::CurrentLiabilities).unwrap();
            assert_eq!(row.get(Indicator::WorkingCapital), Some(ca - cl));
        }
    }
}

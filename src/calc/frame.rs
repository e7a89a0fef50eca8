//! Outer join of line-item series and the yearly price series on reference date.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::calc::extract::{ExtractedItems, LineSeries};
use crate::domain::LineItem;

/// All inputs available for one reference date; absent inputs are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct YearInputs {
    pub date: NaiveDate,
    pub close: Option<f64>,
    items: [Option<f64>; LineItem::ALL.len()],
}

impl YearInputs {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            close: None,
            items: [None; LineItem::ALL.len()],
        }
    }

    pub fn get(&self, item: LineItem) -> Option<f64> {
        self.items[item as usize]
    }

    pub fn set(&mut self, item: LineItem, value: Option<f64>) {
        self.items[item as usize] = value;
    }
}

/// Join every extracted series and the price series into one row per date.
///
/// Every date present in any input appears exactly once, ascending.
pub fn outer_join(items: &ExtractedItems, prices: &LineSeries) -> Vec<YearInputs> {
    let dates: BTreeSet<NaiveDate> = items.dates().chain(prices.keys()).copied().collect();

    dates
        .into_iter()
        .map(|date| {
            let mut row = YearInputs::new(date);
            row.close = prices.get(&date).copied();
            for item in LineItem::ALL {
                let value = items.get(item).and_then(|s| s.get(&date)).copied();
                row.set(item, value);
            }
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, 12, 31).unwrap()
    }

    #[test]
    fn keeps_dates_from_either_side() {
        let mut items = ExtractedItems::default();
        items.insert(LineItem::NetRevenue, LineSeries::from([(d(2019), 1.0), (d(2020), 2.0)]));
        items.insert(LineItem::Equity, LineSeries::from([(d(2020), 5.0)]));
        let prices = LineSeries::from([(d(2020), 10.0), (d(2021), 11.0)]);

        let joined = outer_join(&items, &prices);
        let dates: Vec<NaiveDate> = joined.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2019), d(2020), d(2021)]);

        assert_eq!(joined[0].get(LineItem::NetRevenue), Some(1.0));
        assert_eq!(joined[0].close, None);
        assert_eq!(joined[1].get(LineItem::Equity), Some(5.0));
        assert_eq!(joined[1].close, Some(10.0));
        assert_eq!(joined[2].get(LineItem::NetRevenue), None);
        assert_eq!(joined[2].get(LineItem::Dividends), None);
    }
}

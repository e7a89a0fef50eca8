//! Data prep for the dashboard chart.
//!
//! The wide table is reshaped to long form (date, indicator, value) and then
//! grouped into one line series per selected indicator. Everything here is
//! pure so the render path only draws.

use chrono::{Datelike, NaiveDate};

use crate::domain::WideTable;

/// One observation in long form.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRow {
    pub date: NaiveDate,
    pub indicator: String,
    pub value: f64,
}

/// A named line series; x is the date as fractional years.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub series: Vec<ChartSeries>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

/// Melt the selected columns of `table` into long rows.
///
/// Rows are ordered by date, then by selection order. Missing cells and
/// unknown column names are skipped.
pub fn reshape_long(table: &WideTable, selected: &[String]) -> Vec<LongRow> {
    let columns: Vec<(usize, &String)> = selected
        .iter()
        .filter_map(|name| table.column_index(name).map(|idx| (idx, name)))
        .collect();

    let mut out = Vec::with_capacity(table.rows.len() * columns.len());
    for row in &table.rows {
        for &(idx, name) in &columns {
            if let Some(Some(value)) = row.values.get(idx) {
                if value.is_finite() {
                    out.push(LongRow {
                        date: row.date,
                        indicator: name.clone(),
                        value: *value,
                    });
                }
            }
        }
    }
    out
}

/// Build a chart with one series per selected indicator.
///
/// Returns `None` for an empty selection; the caller shows a prompt instead.
pub fn build_chart(rows: &[LongRow], selected: &[String]) -> Option<ChartSpec> {
    if selected.is_empty() {
        return None;
    }

    let series: Vec<ChartSeries> = selected
        .iter()
        .map(|name| ChartSeries {
            name: name.clone(),
            points: rows
                .iter()
                .filter(|r| &r.indicator == name)
                .map(|r| (year_fraction(r.date), r.value))
                .collect(),
        })
        .collect();

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in series.iter().flat_map(|s| s.points.iter()) {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    Some(ChartSpec {
        series,
        x_bounds: padded(x_min, x_max, 0.5),
        y_bounds: padded(y_min, y_max, 1.0),
    })
}

/// `date` as a fractional year (2021-12-31 -> ~2021.997).
pub fn year_fraction(date: NaiveDate) -> f64 {
    let leap = NaiveDate::from_ymd_opt(date.year(), 2, 29).is_some();
    let days = if leap { 366.0 } else { 365.0 };
    date.year() as f64 + date.ordinal0() as f64 / days
}

// Plot bounds with a 5% margin; a single point gets `flat_pad` on each side.
fn padded(min: f64, max: f64, flat_pad: f64) -> [f64; 2] {
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    if max <= min {
        let pad = (min.abs() * 0.05).max(flat_pad);
        return [min - pad, max + pad];
    }
    let pad = (max - min) * 0.05;
    [min - pad, max + pad]
}

//! Yahoo Finance chart API integration for daily closes.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::data::prices::PriceProvider;
use crate::error::AppError;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; cvm-indicators)";

pub struct YahooClient {
    client: Client,
}

impl YahooClient {
    /// Build a client whose requests are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl PriceProvider for YahooClient {
    fn daily_closes(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>, AppError> {
        if start > end {
            return Err(AppError::new(2, format!("Invalid price window: {start} is after {end}.")));
        }

        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // Inclusive end: request through the end of the last day.
        let period2 = end.and_time(NaiveTime::MIN).and_utc().timestamp() + 86_400;

        let resp = self
            .client
            .get(format!("{BASE_URL}/{ticker}"))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .map_err(|e| AppError::new(4, format!("Yahoo request for {ticker} failed: {e}")))?;

        let status = resp.status();
        let body: ChartResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse Yahoo response for {ticker} ({status}): {e}")))?;

        parse_chart(ticker, body)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn parse_chart(ticker: &str, body: ChartResponse) -> Result<Vec<(NaiveDate, f64)>, AppError> {
    if let Some(err) = body.chart.error {
        return Err(AppError::new(
            4,
            format!("Yahoo returned {} for {ticker}: {}", err.code, err.description),
        ));
    }

    let result = body
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| AppError::new(4, format!("No chart data returned for {ticker}.")))?;

    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();

    let mut out = Vec::with_capacity(closes.len());
    for (ts, close) in result.timestamp.iter().zip(closes) {
        let Some(close) = close.filter(|v| v.is_finite()) else {
            continue;
        };
        let date = DateTime::from_timestamp(ts + offset, 0)
            .ok_or_else(|| AppError::new(4, format!("Invalid Yahoo timestamp {ts} for {ticker}.")))?
            .date_naive();
        out.push((date, close));
    }

    if out.is_empty() {
        return Err(AppError::new(4, format!("No closing prices returned for {ticker}.")));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chart_and_skips_null_closes() {
        // 2020-12-29 and 2020-12-30 13:00 UTC, B3 offset -3h.
        let json = r#"{
            "chart": {
                "result": [{
                    "meta": { "gmtoffset": -10800 },
                    "timestamp": [1609246800, 1609333200, 1609419600],
                    "indicators": { "quote": [{ "close": [10.5, null, 11.25] }] }
                }],
                "error": null
            }
        }"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        let closes = parse_chart("ACME3.SA", body).unwrap();

        assert_eq!(
            closes,
            vec![
                (NaiveDate::from_ymd_opt(2020, 12, 29).unwrap(), 10.5),
                (NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(), 11.25),
            ]
        );
    }

    #[test]
    fn unknown_ticker_is_an_error() {
        let json = r#"{
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        }"#;
        let body: ChartResponse = serde_json::from_str(json).unwrap();
        let err = parse_chart("XXXX3.SA", body).unwrap_err();
        assert!(err.message().contains("Not Found"));
    }
}

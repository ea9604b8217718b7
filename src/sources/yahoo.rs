//! Yahoo Finance API client for daily ETF closes.
//!
//! Uses the unofficial chart endpoint (no API key).

use crate::error::{AppError, Result};
use crate::types::PricePoint;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Yahoo Finance chart response.
#[derive(Debug, Deserialize)]
pub struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    meta: YahooMeta,
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    symbol: String,
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    close: Option<Vec<Option<f64>>>,
}

/// Normalize symbol for Yahoo Finance API.
fn normalize_yahoo_symbol(symbol: &str) -> String {
    symbol.to_uppercase().replace('.', "-")
}

/// Exchange-local trading date of a bar timestamp.
fn trading_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
}

/// Turn a chart response into ascending daily closes.
///
/// Null and non-positive closes are dropped. When two bars map to the same
/// date (an intraday bar for the current session) the later one wins.
pub fn parse_daily_closes(response: YahooChartResponse) -> Result<Vec<PricePoint>> {
    if let Some(error) = response.chart.error {
        return Err(AppError::ExternalApi(format!(
            "Yahoo API error: {} - {}",
            error.code, error.description
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| AppError::ExternalApi("No results in response".to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .and_then(|q| q.close)
        .unwrap_or_default();

    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (i, &timestamp) in timestamps.iter().enumerate() {
        let Some(close) = closes.get(i).copied().flatten() else {
            continue;
        };
        if !close.is_finite() || close <= 0.0 {
            continue;
        }
        if let Some(date) = trading_date(timestamp, result.meta.gmtoffset) {
            by_date.insert(date, close);
        }
    }

    debug!(
        "Parsed {} daily closes for {}",
        by_date.len(),
        result.meta.symbol
    );

    Ok(by_date
        .into_iter()
        .map(|(date, close)| PricePoint::new(date, close))
        .collect())
}

/// Yahoo Finance API client.
pub struct YahooFinanceClient {
    client: Client,
}

impl YahooFinanceClient {
    /// Create a new Yahoo Finance client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;

        Ok(Self { client })
    }

    /// Fetch unadjusted daily closes.
    ///
    /// `range` is a Yahoo range string ("1mo", "1y", "5y", "max", ...).
    pub async fn get_daily_closes(&self, symbol: &str, range: &str) -> Result<Vec<PricePoint>> {
        let yahoo_symbol = normalize_yahoo_symbol(symbol);
        let url = format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{}?range={}&interval=1d&includePrePost=false",
            yahoo_symbol, range
        );

        debug!("Fetching Yahoo Finance data: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Yahoo API error for {}: {}",
                yahoo_symbol,
                response.status()
            )));
        }

        let data: YahooChartResponse = response.json().await?;
        parse_daily_closes(data)
    }
}

//! Market-data API client
//!
//! Read-only historical OHLC retrieval over a chart-style HTTP endpoint
//! (`/v8/finance/chart/{symbol}?interval=...&range=...`). The base URL is
//! injected so tests can point the client at a mock server.

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{columns, TimeSeriesTable};

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("market data transport error: {0}")]
    Transport(String),

    #[error("no data for symbol {0}")]
    NoData(String),

    #[error("malformed chart response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for MarketDataError {
    fn from(err: reqwest::Error) -> Self {
        MarketDataError::Transport(err.to_string())
    }
}

/// Historical price source for the dashboard's quote cards.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// OHLC history keyed by date for `symbol` at `interval` over `range`
    /// (e.g. `1d` over `1mo`).
    async fn get_history(
        &self,
        symbol: &str,
        interval: &str,
        range: &str,
    ) -> Result<TimeSeriesTable, MarketDataError>;

    /// Latest close price for `symbol`.
    async fn get_latest_price(&self, symbol: &str) -> Result<f64, MarketDataError>;
}

pub struct RestMarketDataClient {
    base_url: String,
    client: reqwest::Client,
}

impl RestMarketDataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            symbol
        )
    }
}

#[async_trait]
impl MarketDataProvider for RestMarketDataClient {
    async fn get_history(
        &self,
        symbol: &str,
        interval: &str,
        range: &str,
    ) -> Result<TimeSeriesTable, MarketDataError> {
        let response = self
            .client
            .get(self.chart_url(symbol))
            .query(&[("interval", interval), ("range", range)])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| MarketDataError::Transport(e.to_string()))?;

        let envelope: ChartEnvelope = response
            .json()
            .await
            .map_err(|e| MarketDataError::Malformed(e.to_string()))?;

        let result = envelope
            .chart
            .result
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0))
                }
            })
            .ok_or_else(|| MarketDataError::NoData(symbol.to_string()))?;

        let timestamps = result.timestamp.unwrap_or_default();
        if timestamps.is_empty() {
            return Err(MarketDataError::NoData(symbol.to_string()));
        }
        let mut index = Vec::with_capacity(timestamps.len());
        for ts in &timestamps {
            let dt = DateTime::from_timestamp(*ts, 0).ok_or_else(|| {
                MarketDataError::Malformed(format!("timestamp {} out of range", ts))
            })?;
            index.push(dt);
        }

        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| MarketDataError::Malformed("missing quote block".to_string()))?;

        let n = timestamps.len();
        let table = TimeSeriesTable::from_columns(vec![
            ("open".to_string(), dense(quote.open, n)),
            ("high".to_string(), dense(quote.high, n)),
            ("low".to_string(), dense(quote.low, n)),
            (columns::CLOSE.to_string(), dense(quote.close, n)),
            ("volume".to_string(), dense(quote.volume, n)),
        ])
        .with_index(index);

        Ok(table)
    }

    async fn get_latest_price(&self, symbol: &str) -> Result<f64, MarketDataError> {
        let history = self.get_history(symbol, "1d", "5d").await?;
        history
            .column(columns::CLOSE)
            .and_then(|close| close.iter().rev().find(|v| !v.is_nan()).copied())
            .ok_or_else(|| MarketDataError::NoData(symbol.to_string()))
    }
}

/// Null price points become NaN; short or absent arrays pad with NaN.
fn dense(values: Option<Vec<Option<f64>>>, n: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; n];
    if let Some(values) = values {
        for (slot, value) in out.iter_mut().zip(values) {
            *slot = value.unwrap_or(f64::NAN);
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartNode,
}

#[derive(Debug, Deserialize)]
struct ChartNode {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize, Default)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

//! Yahoo Finance data source.
//!
//! Fetches OHLCV quotes from Yahoo's v8 chart API by range (`1mo` … `5y`) and
//! interval (`1d`, `1wk`, `1mo`), and shapes them the way a multi-ticker
//! download does: a date index plus `(field, ticker)` column pairs for
//! Close, High, Low, Open and Volume. Prices are split/dividend adjusted when
//! the response carries an adjusted close.
//!
//! One request per fetch. Errors are mapped to `DataError` and returned; the
//! loader above decides what to do with them.

use super::provider::{DataError, Interval, MarketDataSource, Period};
use super::table::{ColumnLabel, RawTable};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Name of the date index on tables from this source.
pub const INDEX_NAME: &str = "Date";

/// Yahoo Finance data source.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url("https://query2.finance.yahoo.com")
    }

    /// Point the client at another host (mirrors, proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Build the chart API URL for a ticker, range and interval.
    fn chart_url(&self, ticker: &str, period: Period, interval: Interval) -> String {
        format!(
            "{}/v8/finance/chart/{ticker}?range={period}&interval={interval}\
             &includeAdjustedClose=true&events=div%2Csplits",
            self.base_url
        )
    }

    /// Parse a captured chart API body.
    pub fn parse_chart_json(ticker: &str, body: &str) -> Result<RawTable, DataError> {
        let chart: ChartResponse = serde_json::from_str(body).map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
        })?;
        Self::parse_response(ticker, chart)
    }

    /// Parse the chart API response into a two-level RawTable.
    fn parse_response(ticker: &str, resp: ChartResponse) -> Result<RawTable, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: ticker.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // A valid symbol with no trades in range comes back without timestamps.
        let timestamps = data.timestamp.unwrap_or_default();

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let n = timestamps.len();
        let mut dates: Vec<NaiveDate> = Vec::with_capacity(n);
        let mut opens = Vec::with_capacity(n);
        let mut highs = Vec::with_capacity(n);
        let mut lows = Vec::with_capacity(n);
        let mut closes = Vec::with_capacity(n);
        let mut volumes = Vec::with_capacity(n);

        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();
            let adj_close = adj_closes
                .as_ref()
                .and_then(|v| v.get(i).copied().flatten());

            // Skip rows where all OHLCV are None (holidays/non-trading days)
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            // Back-adjust the whole bar by the adjusted/raw close ratio.
            let ratio = match (adj_close, close) {
                (Some(adj), Some(raw)) if raw != 0.0 && (adj / raw).is_finite() => adj / raw,
                _ => 1.0,
            };

            dates.push(date);
            opens.push(open.map(|v| v * ratio));
            highs.push(high.map(|v| v * ratio));
            lows.push(low.map(|v| v * ratio));
            closes.push(close.map(|v| v * ratio));
            volumes.push(volume);
        }

        debug!(ticker, rows = dates.len(), "parsed chart response");

        RawTable::new(INDEX_NAME, dates)
            .with_f64(ColumnLabel::pair("Close", ticker), closes)?
            .with_f64(ColumnLabel::pair("High", ticker), highs)?
            .with_f64(ColumnLabel::pair("Low", ticker), lows)?
            .with_f64(ColumnLabel::pair("Open", ticker), opens)?
            .with_i64(ColumnLabel::pair("Volume", ticker), volumes)
    }
}

impl MarketDataSource for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> Result<RawTable, DataError> {
        let url = self.chart_url(ticker, period, interval);
        debug!(%url, "requesting chart");

        let resp = self.client.get(&url).send().map_err(|e| {
            if e.is_timeout() {
                DataError::NetworkUnreachable(format!("request timed out: {e}"))
            } else {
                DataError::NetworkUnreachable(e.to_string())
            }
        })?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DataError::RateLimited {
                retry_after_secs: retry_after,
            });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(DataError::AuthenticationRequired(format!(
                "Yahoo Finance refused the request (HTTP {status})"
            )));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }
        if !status.is_success() {
            return Err(DataError::Other(format!("HTTP {status} for {ticker}")));
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
        })?;

        Self::parse_response(ticker, chart)
    }
}
